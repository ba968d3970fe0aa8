use serde::{Deserialize, Serialize};

/// Row-level counters collected while reading a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub rows_read: u64,
    pub blank_rows: u64,
    pub mismatched_rows: u64,
    pub unknown_type_rows: u64,
    pub records_parsed: u64,
    pub files_expanded: u64,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_rows(&mut self) {
        self.rows_read += 1;
    }

    pub fn inc_blank(&mut self) {
        self.blank_rows += 1;
    }

    pub fn inc_mismatched(&mut self) {
        self.mismatched_rows += 1;
    }

    pub fn inc_unknown_type(&mut self) {
        self.unknown_type_rows += 1;
    }

    pub fn add_records(&mut self, count: u64) {
        self.records_parsed += count;
    }

    pub fn add_files(&mut self, count: u64) {
        self.files_expanded += count;
    }

    /// Rows that produced no record at all
    pub fn skipped(&self) -> u64 {
        self.blank_rows + self.mismatched_rows + self.unknown_type_rows
    }
}
