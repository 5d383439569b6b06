//! PDF access through the poppler command-line tools.
//!
//! `pdftotext` extracts text for the whole document (pages separated by form
//! feeds); `pdftoppm` renders one page at a time to PNG. Each call works in
//! its own temporary directory and is killed if it exceeds the configured
//! timeout.

use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use docdelta_types::DiffConfig;
use image::RgbImage;
use tempfile::TempDir;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::document::PagedDocument;
use crate::error::{VisualError, VisualResult};

const PAGE_BREAK: char = '\u{000C}';

/// A PDF file on disk.
#[derive(Clone, Debug)]
pub struct PopplerDocument {
    path: PathBuf,
    name: String,
    pdftotext: String,
    pdftoppm: String,
    timeout: Duration,
}

impl PopplerDocument {
    /// Open `path` with tool locations and timeout taken from `config`.
    ///
    /// The file is not read until text or pages are requested.
    pub fn new(path: impl Into<PathBuf>, config: &DiffConfig) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            pdftotext: config.pdftotext_bin.clone(),
            pdftoppm: config.pdftoppm_bin.clone(),
            timeout: config.render_timeout(),
        }
    }

    fn scratch_dir(&self) -> io::Result<TempDir> {
        tempfile::Builder::new().prefix("docdelta-").tempdir()
    }

    fn tool_error(
        &self,
        failure: ToolFailure,
        operation: &'static str,
        make: impl FnOnce(String) -> VisualError,
    ) -> VisualError {
        match failure {
            ToolFailure::TimedOut => VisualError::Timeout {
                document: self.name.clone(),
                operation,
                secs: self.timeout.as_secs(),
            },
            other => make(other.to_string()),
        }
    }
}

impl PagedDocument for PopplerDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_texts(&self) -> VisualResult<Vec<String>> {
        let extract_err = |reason: String| VisualError::Extract {
            document: self.name.clone(),
            reason,
        };

        let dir = self.scratch_dir().map_err(|e| extract_err(e.to_string()))?;
        let out = dir.path().join("text.txt");
        let args: Vec<OsString> = vec![
            "-enc".into(),
            "UTF-8".into(),
            self.path.clone().into_os_string(),
            out.clone().into_os_string(),
        ];

        run_tool(&self.pdftotext, &args, dir.path(), self.timeout)
            .map_err(|f| self.tool_error(f, "pdftotext", extract_err))?;

        let bytes = std::fs::read(&out).map_err(|e| extract_err(e.to_string()))?;
        let pages = split_pages(&String::from_utf8_lossy(&bytes));
        debug!(document = %self.name, pages = pages.len(), "extracted page text");
        Ok(pages)
    }

    fn render_page(&self, index: usize, dpi: u32) -> VisualResult<RgbImage> {
        let render_err = |reason: String| VisualError::Render {
            document: self.name.clone(),
            page: index,
            reason,
        };

        let dir = self.scratch_dir().map_err(|e| render_err(e.to_string()))?;
        let prefix = dir.path().join("page");
        // pdftoppm page numbers are 1-based.
        let page = (index + 1).to_string();
        let args: Vec<OsString> = vec![
            "-r".into(),
            dpi.to_string().into(),
            "-f".into(),
            page.clone().into(),
            "-l".into(),
            page.into(),
            "-png".into(),
            "-singlefile".into(),
            self.path.clone().into_os_string(),
            prefix.clone().into_os_string(),
        ];

        run_tool(&self.pdftoppm, &args, dir.path(), self.timeout)
            .map_err(|f| self.tool_error(f, "pdftoppm", render_err))?;

        let png = prefix.with_extension("png");
        let image = image::open(&png).map_err(|e| render_err(e.to_string()))?;
        debug!(document = %self.name, page = index, dpi, "rendered page");
        Ok(image.to_rgb8())
    }
}

/// Split `pdftotext` output into pages.
///
/// Every page is terminated by a form feed, so the chunk after the last one
/// is empty and is dropped.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }
    pages
}

#[derive(Debug)]
enum ToolFailure {
    Spawn(io::Error),
    Wait(io::Error),
    TimedOut,
    Exit { status: ExitStatus, stderr: String },
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to start: {e}"),
            Self::Wait(e) => write!(f, "failed while waiting: {e}"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Exit { status, stderr } if stderr.is_empty() => write!(f, "exited with {status}"),
            Self::Exit { status, stderr } => write!(f, "exited with {status}: {stderr}"),
        }
    }
}

/// Run `program` to completion within `timeout`.
///
/// Output goes to files in `workdir` rather than pipes, so a chatty tool
/// cannot block on a full pipe while we wait on it.
fn run_tool(
    program: &str,
    args: &[OsString],
    workdir: &Path,
    timeout: Duration,
) -> Result<(), ToolFailure> {
    let stderr_path = workdir.join("stderr.log");
    let stderr = File::create(&stderr_path).map_err(ToolFailure::Spawn)?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr))
        .spawn()
        .map_err(ToolFailure::Spawn)?;

    let status = match child.wait_timeout(timeout).map_err(ToolFailure::Wait)? {
        Some(status) => status,
        None => {
            warn!(program, secs = timeout.as_secs(), "killing external tool after timeout");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolFailure::TimedOut);
        }
    };

    if status.success() {
        Ok(())
    } else {
        let stderr = std::fs::read_to_string(&stderr_path).unwrap_or_default();
        Err(ToolFailure::Exit {
            status,
            stderr: stderr.trim().to_string(),
        })
    }
}
