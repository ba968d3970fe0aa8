//! Preflight: manifest parsing and graph assembly for bulk ingest
//!
//! An uploaded tabular manifest describes collections, works and files to be
//! deposited into a repository. Before anything is written, this crate parses
//! the manifest into a validated, linked graph so an operator can preview what
//! will be created and review every problem at once:
//!
//! 1. **Header normalization** -- Map arbitrary column headers onto canonical
//!    field names; duplicate columns abort the run, unknown ones warn
//! 2. **Row gating** -- Skip blank rows, skip rows whose width does not match
//!    the header
//! 3. **Record building** -- Dispatch on the object type column, unpack
//!    `|~|`-packed cells, expand packed file lists, derive file identifiers
//! 4. **Field validation** -- Visibility, resource types, licenses, rights
//!    statements, file existence and required fields
//! 5. **Graph assembly** -- Resolve parents into a forest under a synthetic
//!    root; orphaned collections/works attach to the root, orphaned files are
//!    dropped
//!
//! Nothing here fails fast. Row-level problems accumulate as warnings or
//! per-record validation errors, and even a fatal problem (duplicate headers,
//! unreadable stream, no data) comes back inside the [`graph::Graph`]'s
//! [`report::Report`] rather than as an `Err`.
//!
//! # Key Modules
//!
//! - [`preflight`] -- Run driver and the per-run [`preflight::PreflightContext`]
//! - [`header`] -- Header squashing and canonical mapping
//! - [`row`] -- Structural row checks
//! - [`factory`] -- Row to record conversion
//! - [`validate`] -- Field validators
//! - [`authority`] -- Controlled vocabularies and authority lookups
//! - [`graph`] -- Forest assembly and flattened views
//! - [`index`] -- Identifier lookup with first-writer-wins semantics
//! - [`attributes`] -- Round-trip through a generic attribute map
//! - [`store`] -- Persisting a graph next to a job
//! - [`report`] -- Fatal errors, warnings and invalid records
//! - [`models`] -- Record, visibility, status and field value types
//!
//! # Example Usage
//!
//! ```bash
//! # Check a manifest and keep the graph for the preview screen
//! preflight check -i manifest.csv --import-root /mnt/ingest -o job/graph.json
//!
//! # Print a persisted graph
//! preflight show -g job/graph.json
//! ```

pub mod attributes;
pub mod authority;
pub mod config;
pub mod error;
pub mod factory;
pub mod fields;
pub mod graph;
pub mod header;
pub mod index;
pub mod models;
pub mod preflight;
pub mod report;
pub mod row;
pub mod stats;
pub mod store;
pub mod validate;

pub use config::PreflightConfig;
pub use error::FatalParseError;
pub use graph::Graph;
pub use models::{FieldValue, FileSource, Record, RecordKind, Status, Visibility};
pub use preflight::{run, run_reader, PreflightContext};
pub use report::Report;
