use crate::error::FatalParseError;
use crate::models::{Record, Status};
use crate::stats::ParseStats;
use serde::{Deserialize, Serialize};

/// A record that failed validation, kept for the preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRecord {
    pub line_number: u64,
    pub message: String,
    pub record: Record,
}

/// Everything a preview needs to explain a run: fatal errors block the
/// submission, warnings and invalid rows are listed for review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub fatal_errors: Vec<String>,
    pub warnings: Vec<String>,
    pub invalid: Vec<InvalidRecord>,
    #[serde(default)]
    pub stats: ParseStats,
}

impl Report {
    pub fn fatal(&mut self, err: &FatalParseError) {
        self.fatal_errors.push(err.to_string());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Copies a record's own warnings into the run-wide list, prefixed with
    /// its line.
    pub fn add_record_warnings(&mut self, record: &Record) {
        for warning in &record.warnings {
            self.warnings
                .push(format!("Line {}: {}", record.line_number, warning.message));
        }
    }

    pub fn add_invalid(&mut self, mut record: Record) {
        record.status = Status::AttachedInvalid;
        let message = format!(
            "Line {}: {}",
            record.line_number,
            record.validation_errors.join("; ")
        );
        self.invalid.push(InvalidRecord {
            line_number: record.line_number,
            message,
            record,
        });
    }

    pub fn is_fatal(&self) -> bool {
        !self.fatal_errors.is_empty()
    }
}
