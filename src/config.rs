use std::path::PathBuf;

/// Token joining several logical values inside one manifest cell
pub const PACKED_SEPARATOR: &str = "|~|";

/// Rights statement substituted when the supplied one is blank or unknown
pub const DEFAULT_RIGHTS_STATEMENT: &str = "http://rightsstatements.org/vocab/UND/1.0/";

/// Collection type assigned to collections that do not name one
pub const DEFAULT_COLLECTION_TYPE: &str = "user_collection";

/// Field delimiter used when the caller does not choose one
pub const DEFAULT_DELIMITER: u8 = b',';

/// Shortest abbreviation accepted for a visibility keyword
pub const VISIBILITY_MIN_PREFIX: usize = 3;

/// Progress log interval (debug line every N rows)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// File name used when a graph is persisted next to a job
pub const GRAPH_FILE_NAME: &str = "graph.json";

/// Format version stamped into persisted graphs
pub const GRAPH_FORMAT_VERSION: u64 = 1;

/// Per-run settings threaded into the record factory and validators.
#[derive(Debug, Clone)]
pub struct PreflightConfig {
    /// Directory that relative file names in the manifest resolve against
    pub import_root: PathBuf,
    pub default_collection_type: String,
    pub delimiter: u8,
}

impl PreflightConfig {
    pub fn new(import_root: impl Into<PathBuf>) -> Self {
        Self {
            import_root: import_root.into(),
            default_collection_type: DEFAULT_COLLECTION_TYPE.to_string(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    pub fn with_collection_type(mut self, collection_type: impl Into<String>) -> Self {
        self.default_collection_type = collection_type.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
