use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Runtime configuration shared by the scanner, pipeline, and dispatcher.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Chunk size in bytes for streaming file content through the hasher.
    pub hash_chunk_size: usize,
    /// Worker threads for hashing, rendering, and dispatch. `None` uses the
    /// available hardware parallelism.
    pub worker_threads: Option<usize>,
    /// Rasterization resolution for paginated documents.
    pub dpi: u32,
    /// Upper bound on a single extract or render call, in seconds.
    pub render_timeout_secs: u64,
    /// Substring patterns excluded from tree scans.
    pub exclude: Vec<String>,
    /// Extensions (without the dot) treated as text in addition to the
    /// built-in list.
    pub extra_text_extensions: Vec<String>,
    /// Path or name of the `pdftotext` executable.
    pub pdftotext_bin: String,
    /// Path or name of the `pdftoppm` executable.
    pub pdftoppm_bin: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            hash_chunk_size: 8 * 1024,
            worker_threads: None,
            dpi: 200,
            render_timeout_secs: 120,
            exclude: Vec::new(),
            extra_text_extensions: Vec::new(),
            pdftotext_bin: "pdftotext".into(),
            pdftoppm_bin: "pdftoppm".into(),
        }
    }
}

impl DiffConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render the config as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "hash_chunk_size",
                reason: "must be greater than zero".into(),
            });
        }
        if self.dpi == 0 || self.dpi > 1200 {
            return Err(ConfigError::Invalid {
                field: "dpi",
                reason: format!("{} is outside 1..=1200", self.dpi),
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid {
                field: "worker_threads",
                reason: "must be greater than zero when set".into(),
            });
        }
        if self.render_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "render_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Effective worker count.
    pub fn effective_workers(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}
