use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Collection,
    Work,
    File,
}

impl RecordKind {
    /// Parses the object type column (`c`, `collection`, `w`, `work`, `f`, `file`).
    pub fn from_object_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "c" | "collection" => Some(RecordKind::Collection),
            "w" | "work" => Some(RecordKind::Work),
            "f" | "file" => Some(RecordKind::File),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Collection => "collection",
            RecordKind::Work => "work",
            RecordKind::File => "file",
        }
    }

    pub fn can_have_children(&self) -> bool {
        !matches!(self, RecordKind::File)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Authenticated,
    #[default]
    Private,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Parsed,
    Validated,
    AttachedValid,
    AttachedInvalid,
    /// Set by the materializer once the object was written
    Committed,
    /// Set by the materializer when the write failed
    Failed,
}

/// A cell value after unpacking: singular fields hold one scalar, the rest an
/// ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(s) => s.is_empty(),
            FieldValue::Many(v) => v.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(s) if s.is_empty() => Vec::new(),
            FieldValue::Single(s) => vec![s.as_str()],
            FieldValue::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values().into_iter().next()
    }
}

/// Where a file record's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FileSource {
    Local { name: String, path: PathBuf },
    Remote { url: String },
}

impl FileSource {
    pub fn name(&self) -> &str {
        match self {
            FileSource::Local { name, .. } => name,
            FileSource::Remote { url } => url,
        }
    }
}

/// A warning attached to one field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub field: String,
    pub message: String,
}

/// One parsed collection, work or file. `children` is not part of the flat
/// attribute set; the graph serializer nests it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub identifier: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub line_number: u64,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSource>,
    /// In the order the problems were found
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FieldWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(skip)]
    pub children: Vec<Record>,
}

impl Record {
    pub fn new(kind: RecordKind, line_number: u64) -> Self {
        Self {
            kind,
            identifier: Vec::new(),
            parent: None,
            line_number,
            fields: BTreeMap::new(),
            visibility: Visibility::default(),
            file: None,
            warnings: Vec::new(),
            validation_errors: Vec::new(),
            status: Status::Parsed,
            children: Vec::new(),
        }
    }

    /// The join key used for parent/child resolution.
    pub fn key(&self) -> Option<&str> {
        self.identifier
            .first()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Label for diagnostics: the file name for files, the join key otherwise.
    pub fn display_name(&self) -> &str {
        match (&self.file, self.kind) {
            (Some(source), RecordKind::File) => source.name(),
            _ => self.key().unwrap_or(""),
        }
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.parent.as_deref().filter(|p| !p.is_empty())
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn warn(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(FieldWarning {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn warnings_for(&self, field: &str) -> Vec<&str> {
        self.warnings
            .iter()
            .filter(|w| w.field == field)
            .map(|w| w.message.as_str())
            .collect()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.validation_errors.push(message.into());
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}
