//! Per-record field validators. They run in a fixed order after the record
//! factory and only ever append warnings or validation errors.

use crate::authority::TermIndex;
use crate::config::{DEFAULT_RIGHTS_STATEMENT, VISIBILITY_MIN_PREFIX};
use crate::fields::{self, FILES, IDENTIFIER, LICENSE, RESOURCE_TYPE, RIGHTS_STATEMENT, VISIBILITY};
use crate::models::{FieldValue, FileSource, Record, RecordKind, Status, Visibility};
use crate::preflight::{FileProbe, PreflightContext};
use std::path::{Component, Path};

const VISIBILITY_WORDS: &[(&str, Visibility)] = &[
    ("public", Visibility::Public),
    ("open", Visibility::Public),
    ("authenticated", Visibility::Authenticated),
    ("private", Visibility::Private),
    ("restricted", Visibility::Private),
];

pub fn validate(record: &mut Record, ctx: &PreflightContext) {
    visibility(record);
    resource_type(record, &ctx.resource_types);
    if record.kind == RecordKind::Work {
        license(record, &ctx.licenses);
        rights_statement(record, &ctx.rights_statements);
    }
    if record.kind == RecordKind::File {
        file_exists(record, ctx.files.as_ref());
    }
    required(record);
    record.status = Status::Validated;
}

/// Case-insensitive keyword match; an unambiguous prefix of at least
/// [`VISIBILITY_MIN_PREFIX`] letters also counts.
pub fn parse_visibility(value: &str) -> Option<Visibility> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    if let Some((_, v)) = VISIBILITY_WORDS.iter().find(|(word, _)| *word == value) {
        return Some(*v);
    }
    if value.len() < VISIBILITY_MIN_PREFIX {
        return None;
    }
    let mut matches = VISIBILITY_WORDS
        .iter()
        .filter(|(word, _)| word.starts_with(value.as_str()));
    match (matches.next(), matches.next()) {
        (Some((_, v)), None) => Some(*v),
        _ => None,
    }
}

fn visibility(record: &mut Record) {
    // No visibility column at all: private, nothing to report.
    let Some(raw) = record.fields.remove(VISIBILITY) else {
        record.visibility = Visibility::Private;
        return;
    };
    let raw = raw.first().unwrap_or("").to_string();
    match parse_visibility(&raw) {
        Some(v) => record.visibility = v,
        None => {
            record.visibility = Visibility::Private;
            let message = if raw.is_empty() {
                "visibility is blank; using private".to_string()
            } else {
                format!("invalid visibility '{raw}'; using private")
            };
            record.warn(VISIBILITY, message);
        }
    }
}

fn owned_values(record: &Record, field: &str) -> Option<Vec<String>> {
    record
        .field(field)
        .map(|v| v.values().into_iter().map(str::to_string).collect())
}

fn resource_type(record: &mut Record, vocabulary: &TermIndex) {
    let Some(values) = owned_values(record, RESOURCE_TYPE) else {
        return;
    };
    let mut kept = Vec::with_capacity(values.len());
    for value in values {
        match vocabulary.find_id(&value) {
            Some(term) => kept.push(term.id.clone()),
            None => record.warn(
                RESOURCE_TYPE,
                format!("'{value}' is not a valid resource type and will be dropped"),
            ),
        }
    }
    record
        .fields
        .insert(RESOURCE_TYPE.to_string(), FieldValue::Many(kept));
}

fn license(record: &mut Record, authority: &TermIndex) {
    let Some(values) = owned_values(record, LICENSE) else {
        return;
    };
    let mut kept: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        match authority.find(&value) {
            Some(term) => {
                if !kept.contains(&term.id) {
                    kept.push(term.id.clone());
                }
            }
            None => record.warn(
                LICENSE,
                format!("'{value}' is not a recognized license and will be dropped"),
            ),
        }
    }
    record
        .fields
        .insert(LICENSE.to_string(), FieldValue::Many(kept));
}

fn rights_statement(record: &mut Record, authority: &TermIndex) {
    let Some(values) = owned_values(record, RIGHTS_STATEMENT) else {
        record.fields.insert(
            RIGHTS_STATEMENT.to_string(),
            FieldValue::Many(vec![DEFAULT_RIGHTS_STATEMENT.to_string()]),
        );
        return;
    };

    let first = values.first().map(String::as_str).unwrap_or("");
    let id = match authority.find(first) {
        Some(term) => term.id.clone(),
        None => {
            let message = if first.is_empty() {
                format!("rights statement is blank; using '{DEFAULT_RIGHTS_STATEMENT}'")
            } else {
                format!(
                    "'{first}' is not a recognized rights statement; using '{DEFAULT_RIGHTS_STATEMENT}'"
                )
            };
            record.warn(RIGHTS_STATEMENT, message);
            DEFAULT_RIGHTS_STATEMENT.to_string()
        }
    };
    if values.len() > 1 {
        record.warn(
            RIGHTS_STATEMENT,
            format!(
                "only one rights statement is allowed; ignored {}",
                values[1..].join(", ")
            ),
        );
    }
    record
        .fields
        .insert(RIGHTS_STATEMENT.to_string(), FieldValue::Many(vec![id]));
}

fn file_exists(record: &mut Record, probe: &dyn FileProbe) {
    let Some(FileSource::Local { name, path }) = &record.file else {
        return;
    };
    if escapes_root(name) {
        let message = format!("file '{name}' is outside the import root");
        record.error(message);
        return;
    }
    if !probe.exists(path) {
        let message = format!("file '{name}' not found at {}", path.display());
        record.error(message);
    }
}

/// True for absolute names and names that climb out with `..`.
fn escapes_root(name: &str) -> bool {
    Path::new(name).components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    })
}

fn required(record: &mut Record) {
    for &field in fields::required_fields(record.kind) {
        let missing = match field {
            IDENTIFIER => record.key().is_none(),
            FILES => record.file.is_none(),
            other => record.field(other).map_or(true, FieldValue::is_empty),
        };
        if missing {
            record.error(format!("missing required field '{field}'"));
        }
    }
}
