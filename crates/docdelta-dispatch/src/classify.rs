//! Content classification.
//!
//! The file extension decides first. Only text-like files are opened, and
//! only to check whether they are an XML dialect with a dedicated
//! comparator. Files with any other extension are never read.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "csv", "tsv", "log", "json", "yaml", "yml", "toml", "ini", "cfg", "conf",
    "xml", "html", "htm", "svg", "rs", "py", "c", "h", "cc", "cpp", "hpp", "java", "js", "ts",
    "go", "rb", "sh", "bat", "sql", "v", "vh", "sv", "svh", "vhd", "vhdl", "tcl", "sdc", "xdc",
];

const PAGED_EXTENSIONS: &[&str] = &["pdf"];

const SPIRIT_NS_PREFIX: &str = "http://www.spiritconsortium.org/XMLSchema/SPIRIT/";
const IPXACT_NS_PREFIX: &str = "http://www.accellera.org/XMLSchema/IPXACT/";

const IPXACT_ROOTS: &[&str] = &[
    "component",
    "design",
    "busDefinition",
    "abstractionDefinition",
    "designConfiguration",
    "abstractor",
    "generatorChain",
];

/// An XML dialect with a structured comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// IEEE 1685 (IP-XACT) hardware component descriptions.
    IpXact,
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IpXact => f.write_str("ip-xact"),
        }
    }
}

/// How a file is compared.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum ContentClass {
    /// Line-level text diff.
    Text,
    /// Page visual diff.
    PagedDocument,
    /// Schema-aware structured diff.
    Structured { schema: Schema },
    /// No strategy. `extension` is lowercased, `None` if the file has none.
    Unsupported { extension: Option<String> },
}

impl ContentClass {
    /// `Structured` for a detected schema, `Text` otherwise.
    pub fn from_schema(schema: Option<Schema>) -> Self {
        schema.map_or(Self::Text, |schema| Self::Structured { schema })
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::PagedDocument => f.write_str("paged document"),
            Self::Structured { schema } => write!(f, "structured ({schema})"),
            Self::Unsupported {
                extension: Some(ext),
            } => write!(f, "unsupported (.{ext})"),
            Self::Unsupported { extension: None } => f.write_str("unsupported (no extension)"),
        }
    }
}

/// Extension-only classification, before any content is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ExtensionClass {
    Paged,
    TextLike,
    Unsupported(Option<String>),
}

/// Classifies files by extension and, for text-like files, by content.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    extra_text: BTreeSet<String>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat these extensions (without the dot, any case) as text.
    pub fn with_text_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_text.extend(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty()),
        );
        self
    }

    pub(crate) fn by_extension(&self, path: &Path) -> ExtensionClass {
        let Some(ext) = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
        else {
            return ExtensionClass::Unsupported(None);
        };

        if PAGED_EXTENSIONS.contains(&ext.as_str()) {
            ExtensionClass::Paged
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) || self.extra_text.contains(&ext) {
            ExtensionClass::TextLike
        } else {
            ExtensionClass::Unsupported(Some(ext))
        }
    }

    /// Classify a text-like file from its content.
    pub fn classify_text(&self, bytes: &[u8]) -> ContentClass {
        ContentClass::from_schema(sniff_schema(bytes))
    }

    /// Classify `path`, reading it only if its extension is text-like.
    ///
    /// A text-like file that cannot be read classifies as `Text`; the
    /// comparison step reports the read error.
    ///
    /// Schema sniffing only sees text-like extensions. IP-XACT kept under a
    /// custom extension (say `.ipxact`) is `Unsupported` until that extension
    /// is listed in `DiffConfig::extra_text_extensions`.
    pub fn classify(&self, path: &Path) -> ContentClass {
        match self.by_extension(path) {
            ExtensionClass::Paged => ContentClass::PagedDocument,
            ExtensionClass::Unsupported(extension) => ContentClass::Unsupported { extension },
            ExtensionClass::TextLike => match std::fs::read(path) {
                Ok(bytes) => self.classify_text(&bytes),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "cannot read file for schema sniffing");
                    ContentClass::Text
                }
            },
        }
    }
}

/// Detect a known XML dialect from the document's root element.
///
/// Anything that is not well-formed XML returns `None`.
pub fn sniff_schema(bytes: &[u8]) -> Option<Schema> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if !text.trim_start().starts_with('<') {
        return None;
    }
    let doc = roxmltree::Document::parse(text).ok()?;
    let root = doc.root_element();
    let ns = root.tag_name().namespace()?;
    (is_ipxact_namespace(ns) && IPXACT_ROOTS.contains(&root.tag_name().name()))
        .then_some(Schema::IpXact)
}

pub(crate) fn is_ipxact_namespace(ns: &str) -> bool {
    ns.starts_with(SPIRIT_NS_PREFIX) || ns.starts_with(IPXACT_NS_PREFIX)
}
