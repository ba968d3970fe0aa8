use std::path::PathBuf;
use thiserror::Error;

/// Manifest-global failures. Any of these aborts the run; the caller still
/// receives a graph whose report carries the message.
#[derive(Debug, Error)]
pub enum FatalParseError {
    #[error("duplicate column names in header: {}", .0.join(", "))]
    DuplicateHeaders(Vec<String>),
    #[error("manifest not found: {}", .0.display())]
    MissingManifest(PathBuf),
    #[error("could not read manifest: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("manifest is not valid UTF-8 near line {line}")]
    Undecodable { line: u64 },
    #[error("could not parse manifest: {0}")]
    Malformed(String),
    #[error("{name} authority is unavailable: {reason}")]
    AuthorityUnavailable { name: String, reason: String },
    #[error("no data detected")]
    NoData,
}

impl From<csv::Error> for FatalParseError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(e) => FatalParseError::Unreadable(e),
            csv::ErrorKind::Utf8 { .. } => FatalParseError::Undecodable { line },
            other => FatalParseError::Malformed(format!("{other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_headers_lists_every_name() {
        let err = FatalParseError::DuplicateHeaders(vec!["identifier".into(), "title".into()]);
        assert_eq!(
            err.to_string(),
            "duplicate column names in header: identifier, title"
        );
    }

    #[test]
    fn no_data_message() {
        assert_eq!(FatalParseError::NoData.to_string(), "no data detected");
    }

    #[test]
    fn utf8_csv_error_is_undecodable() {
        let data: &[u8] = b"a,b\n\xff\xfe,c\n";
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data);
        let err = reader
            .records()
            .find_map(|r| r.err())
            .expect("invalid utf-8 should fail");
        assert!(matches!(
            FatalParseError::from(err),
            FatalParseError::Undecodable { .. }
        ));
    }
}
