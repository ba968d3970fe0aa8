//! Canonical column names per record kind.

use crate::models::RecordKind;

pub const OBJECT_TYPE: &str = "object_type";
pub const IDENTIFIER: &str = "identifier";
pub const PARENT: &str = "parent";
pub const TITLE: &str = "title";
pub const VISIBILITY: &str = "visibility";
pub const RESOURCE_TYPE: &str = "resource_type";
pub const LICENSE: &str = "license";
pub const RIGHTS_STATEMENT: &str = "rights_statement";
pub const COLLECTION_TYPE: &str = "collection_type";
pub const FILES: &str = "files";

const COLLECTION_FIELDS: &[&str] = &[
    IDENTIFIER,
    PARENT,
    TITLE,
    VISIBILITY,
    COLLECTION_TYPE,
    "creator",
    "contributor",
    "keyword",
    "subject",
    "description",
    "abstract",
    "date_created",
    "language",
    "publisher",
    RESOURCE_TYPE,
    "source",
    "related_url",
];

const WORK_FIELDS: &[&str] = &[
    IDENTIFIER,
    PARENT,
    TITLE,
    VISIBILITY,
    "alternative_title",
    "creator",
    "contributor",
    "keyword",
    "subject",
    "description",
    "abstract",
    "date_created",
    "language",
    "publisher",
    RESOURCE_TYPE,
    LICENSE,
    RIGHTS_STATEMENT,
    "rights_holder",
    "based_near",
    "bibliographic_citation",
    "source",
    "related_url",
];

const FILE_FIELDS: &[&str] = &[IDENTIFIER, PARENT, TITLE, VISIBILITY, FILES, RESOURCE_TYPE];

pub fn fields_for(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Collection => COLLECTION_FIELDS,
        RecordKind::Work => WORK_FIELDS,
        RecordKind::File => FILE_FIELDS,
    }
}

/// Fields that keep only the first unpacked value.
pub fn is_singular(kind: RecordKind, field: &str) -> bool {
    match field {
        PARENT | VISIBILITY => true,
        COLLECTION_TYPE => kind == RecordKind::Collection,
        _ => false,
    }
}

pub fn required_fields(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Collection | RecordKind::Work => &[IDENTIFIER, TITLE],
        RecordKind::File => &[FILES],
    }
}

/// Every canonical name, discriminator first, then each kind's fields in
/// declaration order without repeats.
pub fn canonical_pool() -> Vec<&'static str> {
    let mut pool = vec![OBJECT_TYPE];
    for kind in [RecordKind::Collection, RecordKind::Work, RecordKind::File] {
        for field in fields_for(kind) {
            if !pool.contains(field) {
                pool.push(field);
            }
        }
    }
    pool
}
