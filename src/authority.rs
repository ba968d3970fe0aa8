//! Controlled vocabularies and authorities consulted by the field validators.
//!
//! An [`Authority`] only enumerates terms. Each run turns the three authorities
//! it needs into immutable [`TermIndex`] lookups once, inside
//! [`crate::preflight::PreflightContext`], so nothing is cached process-wide.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub label: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Term {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            active: true,
        }
    }
}

/// A source of `{id, label}` pairs.
pub trait Authority {
    fn name(&self) -> &str;
    fn terms(&self) -> Result<Vec<Term>>;
}

/// Terms held in memory.
pub struct StaticAuthority {
    name: String,
    terms: Vec<Term>,
}

impl StaticAuthority {
    pub fn new(name: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            terms,
        }
    }

    pub fn resource_types() -> Self {
        let terms = RESOURCE_TYPES
            .iter()
            .map(|label| Term::new(*label, *label))
            .collect();
        Self::new("resource type", terms)
    }

    pub fn licenses() -> Self {
        Self::new("license", pairs(LICENSES))
    }

    pub fn rights_statements() -> Self {
        Self::new("rights statement", pairs(RIGHTS_STATEMENTS))
    }

    pub fn index(&self) -> TermIndex {
        TermIndex::from_terms(self.terms.clone())
    }
}

impl Authority for StaticAuthority {
    fn name(&self) -> &str {
        &self.name
    }

    fn terms(&self) -> Result<Vec<Term>> {
        Ok(self.terms.clone())
    }
}

/// Terms read from a CSV file with `id,label[,active]` columns.
pub struct CsvAuthority {
    name: String,
    path: PathBuf,
}

impl CsvAuthority {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Authority for CsvAuthority {
    fn name(&self) -> &str {
        &self.name
    }

    fn terms(&self) -> Result<Vec<Term>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open authority file: {:?}", self.path))?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let mut terms = Vec::new();
        for row in reader.deserialize() {
            let term: Term = row
                .with_context(|| format!("Invalid row in authority file: {:?}", self.path))?;
            terms.push(term);
        }
        info!(authority = %self.name, terms = terms.len(), path = ?self.path, "Loaded authority");
        Ok(terms)
    }
}

/// Lookup over the active terms of one authority, by id or by label.
/// Labels compare case-insensitively, ids exactly first and then
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    terms: Vec<Term>,
    by_id: FxHashMap<String, usize>,
    by_folded_id: FxHashMap<String, usize>,
    by_label: FxHashMap<String, usize>,
}

impl TermIndex {
    pub fn build(authority: &dyn Authority) -> Result<Self> {
        Ok(Self::from_terms(authority.terms()?))
    }

    pub fn from_terms(terms: Vec<Term>) -> Self {
        let terms: Vec<Term> = terms.into_iter().filter(|t| t.active).collect();
        let mut by_id = FxHashMap::default();
        let mut by_folded_id = FxHashMap::default();
        let mut by_label = FxHashMap::default();
        for (i, term) in terms.iter().enumerate() {
            by_id.entry(term.id.clone()).or_insert(i);
            by_folded_id.entry(term.id.to_lowercase()).or_insert(i);
            by_label.entry(term.label.to_lowercase()).or_insert(i);
        }
        Self {
            terms,
            by_id,
            by_folded_id,
            by_label,
        }
    }

    /// Matches an active term id only.
    pub fn find_id(&self, value: &str) -> Option<&Term> {
        let value = value.trim();
        self.by_id
            .get(value)
            .or_else(|| self.by_folded_id.get(&value.to_lowercase()))
            .map(|&i| &self.terms[i])
    }

    /// Matches an active term by id, falling back to its label.
    pub fn find(&self, value: &str) -> Option<&Term> {
        self.find_id(value).or_else(|| {
            self.by_label
                .get(&value.trim().to_lowercase())
                .map(|&i| &self.terms[i])
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Loads a [`CsvAuthority`] when a path is given, else the built-in list.
pub fn load_or_default(
    name: &str,
    path: Option<&Path>,
    fallback: fn() -> StaticAuthority,
) -> Box<dyn Authority> {
    match path {
        Some(p) => Box::new(CsvAuthority::new(name, p)),
        None => Box::new(fallback()),
    }
}

fn pairs(list: &[(&str, &str)]) -> Vec<Term> {
    list.iter().map(|(id, label)| Term::new(*id, *label)).collect()
}

const RESOURCE_TYPES: &[&str] = &[
    "Article",
    "Audio",
    "Book",
    "Capstone Project",
    "Conference Proceeding",
    "Dataset",
    "Dissertation",
    "Image",
    "Journal",
    "Map or Cartographic Material",
    "Masters Thesis",
    "Part of Book",
    "Poster",
    "Presentation",
    "Project",
    "Report",
    "Research Paper",
    "Software or Program Code",
    "Video",
    "Other",
];

const LICENSES: &[(&str, &str)] = &[
    (
        "http://creativecommons.org/licenses/by/3.0/us/",
        "Creative Commons BY Attribution 3.0 United States",
    ),
    (
        "http://creativecommons.org/licenses/by-sa/3.0/us/",
        "Creative Commons BY-SA Attribution-ShareAlike 3.0 United States",
    ),
    (
        "http://creativecommons.org/licenses/by-nc/3.0/us/",
        "Creative Commons BY-NC Attribution-NonCommercial 3.0 United States",
    ),
    (
        "http://creativecommons.org/licenses/by-nd/3.0/us/",
        "Creative Commons BY-ND Attribution-NoDerivs 3.0 United States",
    ),
    (
        "http://creativecommons.org/licenses/by-nc-nd/3.0/us/",
        "Creative Commons BY-NC-ND Attribution-NonCommercial-NoDerivs 3.0 United States",
    ),
    (
        "http://creativecommons.org/licenses/by-nc-sa/3.0/us/",
        "Creative Commons BY-NC-SA Attribution-NonCommercial-ShareAlike 3.0 United States",
    ),
    (
        "http://creativecommons.org/licenses/by/4.0/",
        "Creative Commons BY Attribution 4.0 International",
    ),
    (
        "http://creativecommons.org/publicdomain/zero/1.0/",
        "Creative Commons CC0 1.0 Universal",
    ),
    (
        "http://creativecommons.org/publicdomain/mark/1.0/",
        "Public Domain Mark 1.0",
    ),
    (
        "http://www.europeana.eu/portal/rights/rr-r.html",
        "All rights reserved",
    ),
];

const RIGHTS_STATEMENTS: &[(&str, &str)] = &[
    ("http://rightsstatements.org/vocab/InC/1.0/", "In Copyright"),
    (
        "http://rightsstatements.org/vocab/InC-OW-EU/1.0/",
        "In Copyright - EU Orphan Work",
    ),
    (
        "http://rightsstatements.org/vocab/InC-EDU/1.0/",
        "In Copyright - Educational Use Permitted",
    ),
    (
        "http://rightsstatements.org/vocab/InC-NC/1.0/",
        "In Copyright - Non-Commercial Use Permitted",
    ),
    (
        "http://rightsstatements.org/vocab/InC-RUU/1.0/",
        "In Copyright - Rights-holder(s) Unlocatable or Unidentifiable",
    ),
    (
        "http://rightsstatements.org/vocab/NoC-CR/1.0/",
        "No Copyright - Contractual Restrictions",
    ),
    (
        "http://rightsstatements.org/vocab/NoC-NC/1.0/",
        "No Copyright - Non-Commercial Use Only",
    ),
    (
        "http://rightsstatements.org/vocab/NoC-OKLR/1.0/",
        "No Copyright - Other Known Legal Restrictions",
    ),
    (
        "http://rightsstatements.org/vocab/NoC-US/1.0/",
        "No Copyright - United States",
    ),
    (
        "http://rightsstatements.org/vocab/CNE/1.0/",
        "Copyright Not Evaluated",
    ),
    (
        "http://rightsstatements.org/vocab/UND/1.0/",
        "Copyright Undetermined",
    ),
    (
        "http://rightsstatements.org/vocab/NKC/1.0/",
        "No Known Copyright",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RIGHTS_STATEMENT;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn find_by_id_or_label() {
        let index = TermIndex::build(&StaticAuthority::licenses()).unwrap();
        let by_id = index
            .find("http://creativecommons.org/publicdomain/zero/1.0/")
            .unwrap();
        let by_label = index.find("creative commons cc0 1.0 universal").unwrap();
        assert_eq!(by_id, by_label);
        assert!(index.find("GPL").is_none());
    }

    #[test]
    fn find_id_ignores_labels() {
        let index = TermIndex::from_terms(vec![Term::new("img", "Image")]);
        assert!(index.find_id("Image").is_none());
        assert_eq!(index.find_id("IMG").unwrap().id, "img");
    }

    #[test]
    fn inactive_terms_are_not_matched() {
        let mut retired = Term::new("old", "Old");
        retired.active = false;
        let index = TermIndex::from_terms(vec![retired, Term::new("new", "New")]);
        assert_eq!(index.len(), 1);
        assert!(index.find("old").is_none());
        assert!(index.find("new").is_some());
    }

    #[test]
    fn default_rights_statement_is_in_builtin_list() {
        let index = TermIndex::build(&StaticAuthority::rights_statements()).unwrap();
        assert_eq!(
            index.find("Copyright Undetermined").unwrap().id,
            DEFAULT_RIGHTS_STATEMENT
        );
    }

    #[test]
    fn csv_authority_reads_terms() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("types.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,label,active").unwrap();
        writeln!(file, "photo,Photograph,true").unwrap();
        writeln!(file, "slide,Lantern Slide,false").unwrap();
        drop(file);

        let authority = CsvAuthority::new("resource type", &path);
        let terms = authority.terms().unwrap();
        assert_eq!(terms.len(), 2);
        let index = TermIndex::from_terms(terms);
        assert!(index.find_id("photo").is_some());
        assert!(index.find_id("slide").is_none());
    }

    #[test]
    fn csv_authority_active_defaults_to_true() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("licenses.csv");
        std::fs::write(&path, "id,label\nmit,MIT License\n").unwrap();
        let terms = CsvAuthority::new("license", &path).terms().unwrap();
        assert!(terms[0].active);
    }

    #[test]
    fn csv_authority_missing_file_is_an_error() {
        let authority = CsvAuthority::new("license", "/nonexistent/licenses.csv");
        assert!(authority.terms().is_err());
    }

    #[test]
    fn load_or_default_prefers_file() {
        let authority = load_or_default("license", None, StaticAuthority::licenses);
        assert!(!authority.terms().unwrap().is_empty());
        let authority = load_or_default(
            "license",
            Some(Path::new("/nonexistent.csv")),
            StaticAuthority::licenses,
        );
        assert!(authority.terms().is_err());
    }
}
