use csv::StringRecord;

/// Outcome of the structural checks on one data row.
#[derive(Debug, PartialEq, Eq)]
pub enum RowGate {
    /// Cells trimmed and cut to the header width
    Accept(Vec<String>),
    Blank,
    ColumnMismatch { found: usize, expected: usize },
}

impl RowGate {
    pub fn check(row: &StringRecord, header_len: usize) -> Self {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return RowGate::Blank;
        }

        let found = row.len();
        let trailing_blank = found > header_len
            && row.iter().skip(header_len).all(|cell| cell.trim().is_empty());
        if found != header_len && !trailing_blank {
            return RowGate::ColumnMismatch {
                found,
                expected: header_len,
            };
        }

        RowGate::Accept(
            row.iter()
                .take(header_len)
                .map(|cell| cell.trim().to_string())
                .collect(),
        )
    }
}

pub fn mismatch_warning(line: u64, found: usize, expected: usize) -> String {
    format!(
        "Line {line}: row has {found} columns but the header has {expected}, possibly an unescaped quote; row skipped"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn accepts_matching_row() {
        assert_eq!(
            RowGate::check(&row(&["w", " W1 ", "Title"]), 3),
            RowGate::Accept(vec!["w".into(), "W1".into(), "Title".into()])
        );
    }

    #[test]
    fn blank_row_is_skipped() {
        assert_eq!(RowGate::check(&row(&["", "  ", ""]), 3), RowGate::Blank);
    }

    #[test]
    fn short_row_is_a_mismatch() {
        assert_eq!(
            RowGate::check(&row(&["w", "W1"]), 3),
            RowGate::ColumnMismatch {
                found: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn long_row_with_content_is_a_mismatch() {
        assert_eq!(
            RowGate::check(&row(&["w", "W1", "Title", "stray"]), 3),
            RowGate::ColumnMismatch {
                found: 4,
                expected: 3
            }
        );
    }

    #[test]
    fn trailing_blank_cells_are_dropped() {
        assert_eq!(
            RowGate::check(&row(&["w", "W1", "Title", "", " "]), 3),
            RowGate::Accept(vec!["w".into(), "W1".into(), "Title".into()])
        );
    }

    #[test]
    fn warning_names_the_line() {
        assert_eq!(
            mismatch_warning(9, 4, 3),
            "Line 9: row has 4 columns but the header has 3, possibly an unescaped quote; row skipped"
        );
    }
}
