use rustc_hash::FxHashMap;

/// Identifier -> record position lookup used to resolve parent references.
/// The first record to claim an identifier keeps it.
pub struct IdentifierIndex {
    positions: FxHashMap<String, usize>,
}

impl IdentifierIndex {
    /// Builds the index from `(identifier, position)` pairs in manifest order.
    /// Returns the index plus `(position, first_position)` for every record
    /// whose identifier was already taken.
    pub fn build<'a, I>(entries: I) -> (Self, Vec<(usize, usize)>)
    where
        I: IntoIterator<Item = (Option<&'a str>, usize)>,
    {
        let mut positions = FxHashMap::default();
        let mut duplicates = Vec::new();

        for (key, position) in entries {
            let Some(key) = key else {
                continue;
            };
            match positions.get(key) {
                Some(&first) => duplicates.push((position, first)),
                None => {
                    positions.insert(key.to_string(), position);
                }
            }
        }

        (Self { positions }, duplicates)
    }

    pub fn resolve(&self, identifier: &str) -> Option<usize> {
        self.positions.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_index(entries: Vec<(&str, usize)>) -> (IdentifierIndex, Vec<(usize, usize)>) {
        IdentifierIndex::build(entries.into_iter().map(|(k, v)| (Some(k), v)))
    }

    #[test]
    fn resolve_known_identifier() {
        let (index, duplicates) = make_index(vec![("C1", 0), ("W1", 1)]);
        assert_eq!(index.resolve("C1"), Some(0));
        assert_eq!(index.resolve("W1"), Some(1));
        assert!(duplicates.is_empty());
    }

    #[test]
    fn first_writer_wins() {
        let (index, duplicates) = make_index(vec![("W1", 0), ("W2", 1), ("W1", 2)]);
        assert_eq!(index.resolve("W1"), Some(0));
        assert_eq!(duplicates, vec![(2, 0)]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn blank_keys_are_not_indexed() {
        let (index, duplicates) = IdentifierIndex::build(vec![(None, 0), (Some("W1"), 1)]);
        assert_eq!(index.len(), 1);
        assert!(duplicates.is_empty());
    }

    #[test]
    fn resolve_nonexistent_identifier() {
        let (index, _) = make_index(vec![("W1", 0)]);
        assert_eq!(index.resolve("W2"), None);
    }

    #[test]
    fn resolve_case_sensitive() {
        let (index, _) = make_index(vec![("W1", 0)]);
        assert_eq!(index.resolve("w1"), None);
    }

    #[test]
    fn resolve_empty_index() {
        let (index, _) = make_index(vec![]);
        assert!(index.is_empty());
        assert_eq!(index.resolve("Anything"), None);
    }
}
