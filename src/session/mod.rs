// src/session/mod.rs
pub mod artifact;

use chrono::{Local, TimeZone};
use serde::Serialize;
use std::{fs, io, path::Path};
use tracing::{error, info, warn};

use crate::process::{utils, FormatError, RowTimeConverter};
pub use artifact::DownloadArtifact;

/// Spreadsheet exports often start with one; it is not part of the header.
const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Nothing selected yet, or the previous selection was just cleared.
    Idle,
    Success,
    Warning,
    Error,
}

/// What the user is told about the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(StatusKind::Idle, "")
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// A file handed over by whatever does the picking and reading.
#[derive(Debug)]
pub struct SelectedFile {
    pub name: String,
    pub mime: Option<String>,
    pub contents: io::Result<Vec<u8>>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            contents: Ok(contents.into()),
        }
    }

    /// Read `path` from disk. A read failure is carried along, not returned.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            mime: None,
            contents: fs::read(path),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    fn looks_like_csv(&self) -> bool {
        utils::has_csv_extension(&self.name) || self.mime.as_deref() == Some("text/csv")
    }
}

/// Owns the current conversion: at most one staged artifact at a time,
/// always released before the next selection is processed.
#[derive(Debug)]
pub struct ConversionSession<Tz: TimeZone = Local> {
    converter: RowTimeConverter<Tz>,
    artifact: Option<DownloadArtifact>,
    status: Status,
}

impl ConversionSession<Local> {
    pub fn local() -> Self {
        Self::new(RowTimeConverter::local())
    }
}

impl<Tz: TimeZone> ConversionSession<Tz> {
    pub fn new(converter: RowTimeConverter<Tz>) -> Self {
        Self {
            converter,
            artifact: None,
            status: Status::idle(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn artifact(&self) -> Option<&DownloadArtifact> {
        self.artifact.as_ref()
    }

    /// Drop the staged artifact, if any.
    pub fn release(&mut self) {
        if let Some(prev) = self.artifact.take() {
            let name = prev.file_name().to_string();
            if let Err(e) = prev.release() {
                warn!(name = %name, "failed to remove staged file: {:#}", e);
            }
        }
    }

    fn finish(&mut self, status: Status) -> Status {
        match status.kind {
            StatusKind::Error => error!("{}", status.message),
            StatusKind::Warning => warn!("{}", status.message),
            _ => info!("{}", status.message),
        }
        self.status = status;
        self.status.clone()
    }

    /// Process a new selection, replacing whatever was there before.
    pub fn select_file(&mut self, selected: Option<SelectedFile>) -> Status {
        self.status = Status::idle();
        self.release();

        let Some(file) = selected else {
            return self.finish(Status::error("No file selected."));
        };

        if !file.looks_like_csv() {
            return self.finish(Status::error("Error: Please select a .csv file."));
        }

        info!(name = %file.name, "processing");

        let bytes = match file.contents {
            Ok(b) => b,
            Err(e) => {
                error!(name = %file.name, "read failed: {}", e);
                return self.finish(Status::error("Error reading file."));
            }
        };
        let decoded = String::from_utf8_lossy(&bytes);
        let text: &str = decoded.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&decoded);

        let result = match self.converter.convert(text) {
            Ok(r) => r,
            Err(FormatError::MissingRows) => {
                return self.finish(Status::error(
                    "Error: CSV file must have at least a header and one data row.",
                ))
            }
            Err(FormatError::TimeColumnNotFound) => {
                return self.finish(Status::error(
                    "Error: \"time\" column not found in the CSV header.",
                ))
            }
        };

        match DownloadArtifact::stage(utils::fixed_file_name(&file.name), &result.text) {
            Ok(a) => self.artifact = Some(a),
            Err(e) => {
                return self.finish(Status::error(format!("Error processing file: {:#}", e)))
            }
        }

        let mut message = format!(
            "File processed successfully. {} data rows processed.",
            result.rows_processed
        );
        let kind = if result.conversion_errors > 0 {
            message.push_str(&format!(
                " {} row(s) had errors during time conversion (kept original value). Check the log for details.",
                result.conversion_errors
            ));
            StatusKind::Warning
        } else {
            StatusKind::Success
        };
        self.finish(Status::new(kind, message))
    }
}
