use crate::error::FatalParseError;
use crate::fields::canonical_pool;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Lowercases and keeps only letters and digits, so `Object Type`,
/// `object_type` and `OBJECT-TYPE` all compare equal.
pub fn squash(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column layout of a manifest after normalization.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    names: Vec<String>,
    known: Vec<bool>,
    positions: FxHashMap<String, usize>,
}

impl HeaderMap {
    /// Maps raw headers onto canonical field names. Returns the map plus one
    /// warning per unknown column, or a fatal error when names collide.
    pub fn normalize<S: AsRef<str>>(raw: &[S]) -> Result<(Self, Vec<String>), FatalParseError> {
        let pool: Vec<(String, &'static str)> = canonical_pool()
            .into_iter()
            .map(|name| (squash(name), name))
            .collect();

        let mut names = Vec::with_capacity(raw.len());
        let mut known = Vec::with_capacity(raw.len());
        let mut warnings = Vec::new();

        for header in raw {
            let header = header.as_ref().trim();
            // Blank cells (often trailing spreadsheet columns) name nothing.
            if header.is_empty() {
                names.push(String::new());
                known.push(false);
                continue;
            }
            let squashed = squash(header);
            match pool.iter().find(|(s, _)| *s == squashed) {
                Some((_, canonical)) => {
                    if *canonical != header {
                        debug!(raw = header, canonical = *canonical, "Mapped header");
                    }
                    names.push(canonical.to_string());
                    known.push(true);
                }
                None => {
                    warnings.push(format!("unknown column '{header}' will be ignored"));
                    names.push(header.to_string());
                    known.push(false);
                }
            }
        }

        let mut positions = FxHashMap::default();
        let mut duplicates: Vec<String> = Vec::new();
        for (i, name) in names.iter().enumerate().filter(|(_, n)| !n.is_empty()) {
            if positions.insert(name.clone(), i).is_some() && !duplicates.contains(name) {
                duplicates.push(name.clone());
            }
        }
        if !duplicates.is_empty() {
            return Err(FatalParseError::DuplicateHeaders(duplicates));
        }

        Ok((
            Self {
                names,
                known,
                positions,
            },
            warnings,
        ))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column index of a canonical field, if the manifest has it.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.positions
            .get(field)
            .copied()
            .filter(|&i| self.known[i])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_strips_punctuation_and_case() {
        assert_eq!(squash("Object Type"), "objecttype");
        assert_eq!(squash("rights_statement"), "rightsstatement");
        assert_eq!(squash(" Date-Created (yyyy) "), "datecreatedyyyy");
    }

    #[test]
    fn maps_headers_to_canonical_names() {
        let (map, warnings) =
            HeaderMap::normalize(&["Object Type", "Identifier", "Title", "Parent"]).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(map.names(), &["object_type", "identifier", "title", "parent"]);
        assert_eq!(map.position("title"), Some(2));
        assert_eq!(map.position("files"), None);
    }

    #[test]
    fn unknown_headers_pass_through_with_warning() {
        let (map, warnings) = HeaderMap::normalize(&["Identifier", "Shelf Mark"]).unwrap();
        assert_eq!(map.names(), &["identifier", "Shelf Mark"]);
        assert_eq!(warnings, vec!["unknown column 'Shelf Mark' will be ignored"]);
        assert!(!map.contains("Shelf Mark"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn colliding_headers_are_fatal() {
        let err = HeaderMap::normalize(&["Identifier", "Title", "IDENTIFIER"]).unwrap_err();
        match err {
            FatalParseError::DuplicateHeaders(names) => assert_eq!(names, vec!["identifier"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_headers_are_skipped_silently() {
        let (map, warnings) =
            HeaderMap::normalize(&["Object Type", "Identifier", "", "Title", " ", ""]).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(map.len(), 6);
        assert_eq!(map.position("title"), Some(3));
        assert!(!map.contains(""));
    }

    #[test]
    fn repeated_unknown_headers_are_fatal() {
        let err = HeaderMap::normalize(&["Notes", "Notes"]).unwrap_err();
        assert!(matches!(err, FatalParseError::DuplicateHeaders(_)));
    }

    #[test]
    fn each_collision_is_listed_once() {
        let err = HeaderMap::normalize(&["identifier", "Identifier", "identifier ", "title", "Title"])
            .unwrap_err();
        match err {
            FatalParseError::DuplicateHeaders(names) => {
                assert_eq!(names, vec!["identifier", "title"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
