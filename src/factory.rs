use crate::config::PACKED_SEPARATOR;
use crate::fields::{self, COLLECTION_TYPE, FILES, IDENTIFIER, OBJECT_TYPE, PARENT};
use crate::header::HeaderMap;
use crate::models::{FieldValue, FileSource, Record, RecordKind};
use crate::preflight::PreflightContext;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Splits a packed cell on the separator, trimming each element and dropping
/// blank ones. Order is preserved.
pub fn unpack(raw: &str) -> Vec<String> {
    raw.split(PACKED_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Identifier given to a file row that does not carry one.
pub fn derive_identifier(parent: &str, line: u64) -> String {
    format!("{parent}//L{line}")
}

pub fn is_url(value: &str) -> bool {
    URL_REGEX.is_match(value)
}

/// Turns accepted rows into typed records.
pub struct RecordFactory<'a> {
    ctx: &'a PreflightContext,
    headers: &'a HeaderMap,
}

impl<'a> RecordFactory<'a> {
    pub fn new(ctx: &'a PreflightContext, headers: &'a HeaderMap) -> Self {
        Self { ctx, headers }
    }

    /// Builds the records for one row. A file row may expand into several
    /// records. `Err` carries the warning for a row that yields nothing.
    pub fn build(&self, cells: &[String], line: u64) -> Result<Vec<Record>, String> {
        let object_type = self.cell(cells, OBJECT_TYPE).unwrap_or("");
        let kind = match RecordKind::from_object_type(object_type) {
            Some(kind) => kind,
            None if object_type.is_empty() => {
                return Err(format!("Line {line}: blank object type; row skipped"))
            }
            None => {
                return Err(format!(
                    "Line {line}: unknown object type '{object_type}'; row skipped"
                ))
            }
        };

        let mut record = Record::new(kind, line);
        let mut file_names = Vec::new();

        for &field in fields::fields_for(kind) {
            let Some(raw) = self.cell(cells, field) else {
                continue;
            };
            let mut values = unpack(raw);
            match field {
                IDENTIFIER => record.identifier = values,
                FILES => file_names = values,
                _ if fields::is_singular(kind, field) => {
                    if values.len() > 1 {
                        let extra = values.split_off(1);
                        record.warn(
                            field,
                            format!(
                                "'{field}' takes a single value; discarded {}",
                                extra.join(", ")
                            ),
                        );
                    }
                    let value = values.pop().unwrap_or_default();
                    if field == PARENT {
                        record.parent = Some(value).filter(|p| !p.is_empty());
                    } else {
                        record.fields.insert(field.to_string(), FieldValue::Single(value));
                    }
                }
                _ => {
                    record
                        .fields
                        .insert(field.to_string(), FieldValue::Many(values));
                }
            }
        }

        if kind == RecordKind::Collection
            && record
                .field(COLLECTION_TYPE)
                .map_or(true, FieldValue::is_empty)
        {
            record.fields.insert(
                COLLECTION_TYPE.to_string(),
                FieldValue::Single(self.ctx.config.default_collection_type.clone()),
            );
        }

        if kind == RecordKind::File {
            return Ok(self.expand_files(record, file_names));
        }
        Ok(vec![record])
    }

    /// One record per file name. A blank `files` cell still yields one record
    /// (with no file) so the missing file shows up as an invalid row.
    fn expand_files(&self, base: Record, names: Vec<String>) -> Vec<Record> {
        let base_id = match base.key() {
            Some(id) => id.to_string(),
            None => derive_identifier(base.parent_key().unwrap_or(""), base.line_number),
        };

        if names.is_empty() {
            let mut record = base;
            set_key(&mut record, base_id);
            return vec![record];
        }

        let packed = names.len() > 1;
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let mut record = base.clone();
                let id = if packed {
                    format!("{base_id}.{}", i + 1)
                } else {
                    base_id.clone()
                };
                set_key(&mut record, id);
                record.file = Some(self.resolve(name));
                record
            })
            .collect()
    }

    fn resolve(&self, name: String) -> FileSource {
        if is_url(&name) {
            FileSource::Remote { url: name }
        } else {
            let path = self.ctx.config.import_root.join(&name);
            FileSource::Local { name, path }
        }
    }

    fn cell<'c>(&self, cells: &'c [String], field: &str) -> Option<&'c str> {
        self.headers
            .position(field)
            .and_then(|i| cells.get(i))
            .map(String::as_str)
    }
}

fn set_key(record: &mut Record, key: String) {
    match record.identifier.first_mut() {
        Some(first) => *first = key,
        None => record.identifier.push(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreflightConfig;
    use std::path::PathBuf;

    fn context() -> PreflightContext {
        PreflightContext::with_defaults(PreflightConfig::new("/import"))
    }

    fn build(headers: &[&str], cells: &[&str], line: u64) -> Result<Vec<Record>, String> {
        let ctx = context();
        let (map, _) = HeaderMap::normalize(headers).unwrap();
        let cells: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        RecordFactory::new(&ctx, &map).build(&cells, line)
    }

    #[test]
    fn unpack_preserves_order() {
        assert_eq!(unpack("b|~|a|~|c"), vec!["b", "a", "c"]);
        assert_eq!(unpack(" x |~||~| y "), vec!["x", "y"]);
        assert!(unpack("").is_empty());
        assert_eq!(unpack("a|b"), vec!["a|b"]);
    }

    #[test]
    fn derived_identifier_is_deterministic() {
        assert_eq!(derive_identifier("W1", 5), "W1//L5");
        assert_eq!(derive_identifier("W1", 5), derive_identifier("W1", 5));
    }

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.org/a.jpg"));
        assert!(is_url("HTTP://example.org/a.jpg"));
        assert!(!is_url("ftp://example.org/a.jpg"));
        assert!(!is_url("images/http.jpg"));
    }

    #[test]
    fn builds_work_record() {
        let records = build(
            &["Object Type", "Identifier", "Title", "Parent", "Creator"],
            &["w", "W1|~|alt-1", "My Work", "", "Ada|~|Grace"],
            2,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        let work = &records[0];
        assert_eq!(work.kind, RecordKind::Work);
        assert_eq!(work.identifier, vec!["W1", "alt-1"]);
        assert_eq!(work.parent, None);
        assert_eq!(
            work.field("creator"),
            Some(&FieldValue::Many(vec!["Ada".into(), "Grace".into()]))
        );
        assert_eq!(work.line_number, 2);
    }

    #[test]
    fn unknown_object_type_is_rejected() {
        let err = build(&["Object Type", "Identifier"], &["folder", "X"], 3).unwrap_err();
        assert_eq!(err, "Line 3: unknown object type 'folder'; row skipped");
        let err = build(&["Object Type", "Identifier"], &["", "X"], 4).unwrap_err();
        assert_eq!(err, "Line 4: blank object type; row skipped");
    }

    #[test]
    fn singular_field_keeps_first_value() {
        let records = build(
            &["Object Type", "Identifier", "Visibility", "Parent"],
            &["w", "W1", "Pub|~|weird", "C1|~|C2"],
            2,
        )
        .unwrap();
        let work = &records[0];
        assert_eq!(
            work.field("visibility"),
            Some(&FieldValue::Single("Pub".into()))
        );
        assert_eq!(work.parent.as_deref(), Some("C1"));
        assert_eq!(
            work.warnings_for("visibility"),
            vec!["'visibility' takes a single value; discarded weird"]
        );
        assert_eq!(
            work.warnings_for("parent"),
            vec!["'parent' takes a single value; discarded C2"]
        );
    }

    #[test]
    fn collection_gets_default_type() {
        let records = build(&["Object Type", "Identifier", "Title"], &["c", "C1", "Maps"], 2)
            .unwrap();
        assert_eq!(
            records[0].field(COLLECTION_TYPE),
            Some(&FieldValue::Single("user_collection".into()))
        );
    }

    #[test]
    fn packed_files_expand_with_suffixes() {
        let records = build(
            &["Object Type", "Identifier", "Title", "Parent", "Files"],
            &["f", "", "", "W1", "a.jpg|~|b.jpg"],
            5,
        )
        .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.key().unwrap()).collect();
        assert_eq!(ids, vec!["W1//L5.1", "W1//L5.2"]);
        assert_eq!(
            records[0].file,
            Some(FileSource::Local {
                name: "a.jpg".into(),
                path: PathBuf::from("/import/a.jpg"),
            })
        );
        assert_eq!(records[1].file.as_ref().unwrap().name(), "b.jpg");
    }

    #[test]
    fn explicit_identifier_gets_suffixes_too() {
        let records = build(
            &["Object Type", "Identifier", "Parent", "Files"],
            &["f", "F9", "W1", "a.jpg|~|https://cdn.example.org/b.jpg"],
            7,
        )
        .unwrap();
        assert_eq!(records[0].key(), Some("F9.1"));
        assert_eq!(records[1].key(), Some("F9.2"));
        assert_eq!(
            records[1].file,
            Some(FileSource::Remote {
                url: "https://cdn.example.org/b.jpg".into()
            })
        );
    }

    #[test]
    fn single_file_has_no_suffix() {
        let records = build(&["Object Type", "Parent", "Files"], &["f", "W1", "a.jpg"], 6)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), Some("W1//L6"));
    }

    #[test]
    fn blank_files_cell_yields_placeholder() {
        let records = build(&["Object Type", "Parent", "Files"], &["f", "W1", ""], 8).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].file.is_none());
        assert_eq!(records[0].key(), Some("W1//L8"));
    }
}
