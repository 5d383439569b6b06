//! Per-file strategy routing.

use std::path::Path;
use std::sync::Arc;

use docdelta_diff::{diff_text, DiffError, TextDiffView};
use docdelta_types::{DiffConfig, DiffOutcome, FailureKind, RunId};
use docdelta_visual::{DiffReport, PageDiffPipeline, PagedDocument, PopplerDocument};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{sniff_schema, Classifier, ContentClass, ExtensionClass, Schema};
use crate::error::DispatchResult;
use crate::structured::{IpXactComparator, StructuredComparator, StructuredDiff};

/// What a successful comparison produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "diff", rename_all = "snake_case")]
pub enum Artifact {
    Text(TextDiffView),
    Visual(DiffReport),
    Structured(StructuredDiff),
}

/// Outcome of comparing one file pair.
pub type DispatchOutcome = DiffOutcome<Artifact>;

/// Routes a file pair to the comparison strategy for its content class.
///
/// `compare_files` never panics on bad input and never returns an error:
/// every problem becomes a [`DiffOutcome::Failed`] with a [`FailureKind`].
pub struct Dispatcher {
    classifier: Classifier,
    pipeline: PageDiffPipeline,
    config: DiffConfig,
    comparators: Vec<Arc<dyn StructuredComparator>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("classifier", &self.classifier)
            .field("pipeline", &self.pipeline)
            .field("comparators", &self.comparators.len())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher with its own page pool and the built-in
    /// structured comparators.
    pub fn new(config: &DiffConfig) -> DispatchResult<Self> {
        let pipeline = PageDiffPipeline::new(config)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a dispatcher that renders pages on an existing pool.
    pub fn with_pool(config: &DiffConfig, pool: Arc<rayon::ThreadPool>) -> Self {
        Self::with_pipeline(config, PageDiffPipeline::with_pool(config, pool))
    }

    fn with_pipeline(config: &DiffConfig, pipeline: PageDiffPipeline) -> Self {
        Self {
            classifier: Classifier::new().with_text_extensions(&config.extra_text_extensions),
            pipeline,
            config: config.clone(),
            comparators: vec![Arc::new(IpXactComparator::new())],
        }
    }

    /// Register a structured comparator, replacing any existing one for the
    /// same schema.
    pub fn with_comparator(mut self, comparator: Arc<dyn StructuredComparator>) -> Self {
        self.comparators.retain(|c| c.schema() != comparator.schema());
        self.comparators.push(comparator);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify a single file.
    pub fn classify(&self, path: &Path) -> ContentClass {
        self.classifier.classify(path)
    }

    /// Compare two files.
    ///
    /// Both sides are classified; differing classes are a schema mismatch.
    /// Files whose extension has no strategy are never opened.
    pub fn compare_files(&self, run_id: RunId, a: &Path, b: &Path) -> DispatchOutcome {
        let outcome = self.route(run_id, a, b);
        match &outcome {
            DiffOutcome::Failed(failure) => warn!(
                left = %a.display(),
                right = %b.display(),
                kind = %failure.kind,
                reason = %failure.reason,
                "comparison failed"
            ),
            other => debug!(
                left = %a.display(),
                right = %b.display(),
                changed = other.is_changed(),
                "comparison finished"
            ),
        }
        outcome
    }

    fn route(&self, run_id: RunId, a: &Path, b: &Path) -> DispatchOutcome {
        let class_a = self.classifier.by_extension(a);
        let class_b = self.classifier.by_extension(b);

        match (class_a, class_b) {
            (ExtensionClass::Unsupported(ext), _) | (_, ExtensionClass::Unsupported(ext)) => {
                let what = ext.map_or_else(|| "files without an extension".to_string(), |e| format!(".{e} files"));
                DiffOutcome::failed(
                    FailureKind::UnsupportedType,
                    format!("no comparison strategy for {what}"),
                )
            }
            (ExtensionClass::Paged, ExtensionClass::Paged) => self.compare_paged(run_id, a, b),
            (ExtensionClass::TextLike, ExtensionClass::TextLike) => self.compare_text_like(a, b),
            _ => DiffOutcome::failed(
                FailureKind::SchemaMismatch,
                format!(
                    "cannot compare {} with {}",
                    self.classify(a),
                    self.classify(b)
                ),
            ),
        }
    }

    fn compare_paged(&self, run_id: RunId, a: &Path, b: &Path) -> DispatchOutcome {
        let left = PopplerDocument::new(a, &self.config);
        let right = PopplerDocument::new(b, &self.config);
        self.compare_documents(run_id, &left, &right)
    }

    /// Compare two already-open paginated documents.
    pub fn compare_documents(
        &self,
        run_id: RunId,
        left: &dyn PagedDocument,
        right: &dyn PagedDocument,
    ) -> DispatchOutcome {
        match self.pipeline.compare(run_id, left, right) {
            Ok(report) => report.into_outcome().map(Artifact::Visual),
            Err(e) => DiffOutcome::failed(e.failure_kind(), e.to_string()),
        }
    }

    fn compare_text_like(&self, a: &Path, b: &Path) -> DispatchOutcome {
        let old = match std::fs::read(a) {
            Ok(bytes) => bytes,
            Err(e) => return read_failure(a, e),
        };
        let new = match std::fs::read(b) {
            Ok(bytes) => bytes,
            Err(e) => return read_failure(b, e),
        };

        match (sniff_schema(&old), sniff_schema(&new)) {
            (None, None) => compare_text(&old, &new),
            (Some(sa), Some(sb)) if sa == sb => self.compare_structured(sa, &old, &new),
            (sa, sb) => DiffOutcome::failed(
                FailureKind::SchemaMismatch,
                format!(
                    "cannot compare {} with {}",
                    ContentClass::from_schema(sa),
                    ContentClass::from_schema(sb)
                ),
            ),
        }
    }

    fn compare_structured(&self, schema: Schema, old: &[u8], new: &[u8]) -> DispatchOutcome {
        let Some(comparator) = self.comparators.iter().find(|c| c.schema() == schema) else {
            debug!(%schema, "no structured comparator registered, using text diff");
            return compare_text(old, new);
        };

        let (old_text, new_text) = match (decode_xml(old), decode_xml(new)) {
            (Ok(o), Ok(n)) => (o, n),
            (Err(e), _) | (_, Err(e)) => {
                return DiffOutcome::failed(FailureKind::DecodeFailure, e.to_string())
            }
        };
        let (old_doc, new_doc) = match (
            roxmltree::Document::parse(old_text),
            roxmltree::Document::parse(new_text),
        ) {
            (Ok(o), Ok(n)) => (o, n),
            (Err(e), _) | (_, Err(e)) => {
                return DiffOutcome::failed(FailureKind::ExtractFailure, e.to_string())
            }
        };

        match comparator.compare(&old_doc, &new_doc) {
            Ok(diff) if diff.is_empty() => DiffOutcome::Unchanged,
            Ok(diff) => DiffOutcome::Changed(Artifact::Structured(diff)),
            Err(reason) => DiffOutcome::failed(FailureKind::ExtractFailure, reason),
        }
    }
}

fn compare_text(old: &[u8], new: &[u8]) -> DispatchOutcome {
    match diff_text(old, new) {
        Ok(view) if view.is_unchanged() => DiffOutcome::Unchanged,
        Ok(view) => DiffOutcome::Changed(Artifact::Text(view)),
        Err(e @ DiffError::Decode { .. }) => {
            DiffOutcome::failed(FailureKind::DecodeFailure, e.to_string())
        }
    }
}

fn decode_xml(bytes: &[u8]) -> Result<&str, std::str::Utf8Error> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn read_failure(path: &Path, e: std::io::Error) -> DispatchOutcome {
    DiffOutcome::failed(
        FailureKind::ExtractFailure,
        format!("cannot read {}: {e}", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdelta_visual::InMemoryDocument;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use tempfile::TempDir;

    const COMPONENT: &str = r#"<spirit:component xmlns:spirit="http://www.spiritconsortium.org/XMLSchema/SPIRIT/1685-2014">
  <spirit:vendor>acme</spirit:vendor><spirit:library>ip</spirit:library>
  <spirit:name>timer</spirit:name><spirit:version>VERSION</spirit:version>
</spirit:component>"#;

    fn dispatcher() -> Dispatcher {
        let config = DiffConfig {
            worker_threads: Some(2),
            ..DiffConfig::default()
        };
        Dispatcher::new(&config).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn failure_kind(outcome: &DispatchOutcome) -> FailureKind {
        outcome.failure().map(|f| f.kind).expect("expected a failed outcome")
    }

    #[test]
    fn archive_is_unsupported_without_being_opened() {
        let outcome = dispatcher().compare_files(
            RunId::new(),
            Path::new("/does/not/exist/a.zip"),
            Path::new("/does/not/exist/b.zip"),
        );
        assert_eq!(failure_kind(&outcome), FailureKind::UnsupportedType);
        assert!(outcome.failure().unwrap().reason.contains(".zip"));
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let outcome = dispatcher().compare_files(
            RunId::new(),
            Path::new("/nope/Makefile"),
            Path::new("/nope/Makefile"),
        );
        assert_eq!(failure_kind(&outcome), FailureKind::UnsupportedType);
    }

    #[test]
    fn different_classes_are_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write(&dir, "notes.txt", "hello");
        let outcome = dispatcher().compare_files(RunId::new(), Path::new("/nope/a.pdf"), &txt);
        assert_eq!(failure_kind(&outcome), FailureKind::SchemaMismatch);
    }

    #[test]
    fn text_changed_and_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.txt", "a\nb\nc\n");
        let b = write(&dir, "b.txt", "a\nX\nc\n");
        let c = write(&dir, "c.txt", "a\nb\nc\n");
        let d = dispatcher();

        let changed = d.compare_files(RunId::new(), &a, &b);
        match changed.artifact() {
            Some(Artifact::Text(view)) => assert_eq!(view.changed_runs().count(), 1),
            other => panic!("expected text artifact, got {other:?}"),
        }
        assert!(d.compare_files(RunId::new(), &a, &c).is_unchanged());
    }

    #[test]
    fn invalid_utf8_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.log", "fine");
        let b = write(&dir, "b.log", [0x66, 0xFF, 0x66]);
        let outcome = dispatcher().compare_files(RunId::new(), &a, &b);
        assert_eq!(failure_kind(&outcome), FailureKind::DecodeFailure);
    }

    #[test]
    fn unreadable_text_file_fails_only_this_pair() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.txt", "x");
        let outcome = dispatcher().compare_files(RunId::new(), &a, &dir.path().join("gone.txt"));
        assert_eq!(failure_kind(&outcome), FailureKind::ExtractFailure);
    }

    #[test]
    fn ipxact_pair_uses_structured_comparator() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.xml", COMPONENT.replace("VERSION", "1.0"));
        let b = write(&dir, "b.xml", COMPONENT.replace("VERSION", "2.0"));
        let c = write(&dir, "c.xml", COMPONENT.replace("VERSION", "1.0"));
        let d = dispatcher();

        match d.compare_files(RunId::new(), &a, &b).artifact() {
            Some(Artifact::Structured(diff)) => {
                assert_eq!(diff.schema, Schema::IpXact);
                assert_eq!(diff.change_count(), 1);
            }
            other => panic!("expected structured artifact, got {other:?}"),
        }
        assert!(d.compare_files(RunId::new(), &a, &c).is_unchanged());
    }

    #[test]
    fn ipxact_against_plain_xml_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.xml", COMPONENT.replace("VERSION", "1.0"));
        let b = write(&dir, "b.xml", "<config/>");
        let outcome = dispatcher().compare_files(RunId::new(), &a, &b);
        assert_eq!(failure_kind(&outcome), FailureKind::SchemaMismatch);
    }

    #[test]
    fn malformed_xml_falls_back_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.xml", "<broken><a>");
        let b = write(&dir, "b.xml", "<broken><b>");
        let outcome = dispatcher().compare_files(RunId::new(), &a, &b);
        assert!(matches!(outcome.artifact(), Some(Artifact::Text(_))));
    }

    #[test]
    fn missing_pdf_tools_surface_as_extract_failure() {
        let config = DiffConfig {
            worker_threads: Some(1),
            pdftotext_bin: "/nonexistent/docdelta-pdftotext".into(),
            ..DiffConfig::default()
        };
        let d = Dispatcher::new(&config).unwrap();
        let outcome = d.compare_files(RunId::new(), Path::new("/nope/a.pdf"), Path::new("/nope/b.pdf"));
        assert_eq!(failure_kind(&outcome), FailureKind::ExtractFailure);
    }

    #[test]
    fn in_memory_documents_produce_visual_artifact() {
        let white = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let mut marked = white.clone();
        marked.put_pixel(5, 5, Rgb([0, 0, 0]));

        let left = InMemoryDocument::new("left").with_page("p1", white.clone());
        let right = InMemoryDocument::new("right").with_page("p1", marked);
        let run_id = RunId::new();

        let d = dispatcher();
        match d.compare_documents(run_id, &left, &right).artifact() {
            Some(Artifact::Visual(report)) => {
                assert_eq!(report.run_id, run_id);
                assert_eq!(report.pages[0].regions.len(), 1);
            }
            other => panic!("expected visual artifact, got {other:?}"),
        }
        assert!(d.compare_documents(run_id, &left, &left).is_unchanged());
    }

    #[test]
    fn outcome_serializes_with_status_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.md", "old");
        let b = write(&dir, "b.md", "new");
        let outcome = dispatcher().compare_files(RunId::new(), &a, &b);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "changed");
        assert_eq!(json["detail"]["kind"], "text");
    }
}
