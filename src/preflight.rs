use crate::authority::{Authority, StaticAuthority, TermIndex};
use crate::config::{PreflightConfig, PROGRESS_INTERVAL};
use crate::error::FatalParseError;
use crate::factory::RecordFactory;
use crate::graph::{assemble, Graph};
use crate::header::HeaderMap;
use crate::models::{Record, RecordKind};
use crate::report::Report;
use crate::row::{mismatch_warning, RowGate};
use crate::validate::validate;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Existence check for local files named in a manifest.
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Checks the local filesystem.
pub struct LocalFiles;

impl FileProbe for LocalFiles {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Everything one run needs, built once and passed down explicitly.
pub struct PreflightContext {
    pub config: PreflightConfig,
    pub resource_types: TermIndex,
    pub licenses: TermIndex,
    pub rights_statements: TermIndex,
    pub files: Box<dyn FileProbe>,
}

impl PreflightContext {
    /// Context backed by the built-in vocabularies and the local filesystem.
    pub fn with_defaults(config: PreflightConfig) -> Self {
        Self {
            config,
            resource_types: StaticAuthority::resource_types().index(),
            licenses: StaticAuthority::licenses().index(),
            rights_statements: StaticAuthority::rights_statements().index(),
            files: Box::new(LocalFiles),
        }
    }

    pub fn from_authorities(
        config: PreflightConfig,
        resource_types: &dyn Authority,
        licenses: &dyn Authority,
        rights_statements: &dyn Authority,
    ) -> Result<Self, FatalParseError> {
        Ok(Self {
            config,
            resource_types: load_index(resource_types)?,
            licenses: load_index(licenses)?,
            rights_statements: load_index(rights_statements)?,
            files: Box::new(LocalFiles),
        })
    }

    pub fn with_file_probe(mut self, probe: Box<dyn FileProbe>) -> Self {
        self.files = probe;
        self
    }
}

fn load_index(authority: &dyn Authority) -> Result<TermIndex, FatalParseError> {
    TermIndex::build(authority).map_err(|e| FatalParseError::AuthorityUnavailable {
        name: authority.name().to_string(),
        reason: format!("{e:#}"),
    })
}

/// Runs the preflight over a manifest file. Never fails: fatal problems end
/// up in the returned graph's report.
pub fn run(path: &Path, ctx: &PreflightContext) -> Graph {
    info!("Running preflight on: {}", path.display());
    if !path.exists() {
        return rejected(FatalParseError::MissingManifest(path.to_path_buf()));
    }
    match File::open(path) {
        Ok(file) => run_reader(BufReader::new(file), ctx),
        Err(e) => rejected(FatalParseError::Unreadable(e)),
    }
}

pub fn run_reader<R: Read>(reader: R, ctx: &PreflightContext) -> Graph {
    let start = Instant::now();
    let mut report = Report::default();
    match parse(reader, ctx, &mut report) {
        Ok(records) => {
            let children = assemble(records, &mut report);
            let graph = Graph { children, report };
            let summary = graph.summary();
            info!(
                collections = summary.collections,
                works = summary.works,
                files = summary.files,
                invalid = summary.invalid,
                warnings = summary.warnings,
                duration_secs = start.elapsed().as_secs_f64(),
                "Preflight complete"
            );
            graph
        }
        Err(e) => {
            warn!(error = %e, "Manifest rejected");
            report.fatal(&e);
            Graph::from_report(report)
        }
    }
}

fn rejected(err: FatalParseError) -> Graph {
    warn!(error = %err, "Manifest rejected");
    let mut report = Report::default();
    report.fatal(&err);
    Graph::from_report(report)
}

/// Reads, gates, builds and validates every row. Row-level problems are
/// accumulated on `report`; only manifest-global ones return `Err`.
fn parse<R: Read>(
    reader: R,
    ctx: &PreflightContext,
    report: &mut Report,
) -> Result<Vec<Record>, FatalParseError> {
    let mut manifest = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(ctx.config.delimiter)
        .from_reader(reader);
    let mut rows = manifest.records();

    let header_row = match rows.next() {
        Some(row) => row?,
        None => return Err(FatalParseError::NoData),
    };
    let raw: Vec<&str> = header_row
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
        .collect();
    let (headers, header_warnings) = HeaderMap::normalize(&raw)?;
    for warning in header_warnings {
        report.warn(warning);
    }
    debug!(columns = headers.len(), "Header normalized");

    let factory = RecordFactory::new(ctx, &headers);
    let mut records = Vec::new();

    for row in rows {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        report.stats.inc_rows();
        if report.stats.rows_read % PROGRESS_INTERVAL == 0 {
            debug!(rows = report.stats.rows_read, records = records.len(), "Progress");
        }

        let cells = match RowGate::check(&row, headers.len()) {
            RowGate::Accept(cells) => cells,
            RowGate::Blank => {
                report.stats.inc_blank();
                continue;
            }
            RowGate::ColumnMismatch { found, expected } => {
                debug!(line, found, expected, "Column count mismatch");
                report.stats.inc_mismatched();
                report.warn(mismatch_warning(line, found, expected));
                continue;
            }
        };

        match factory.build(&cells, line) {
            Ok(parsed) => {
                report.stats.add_records(parsed.len() as u64);
                for mut record in parsed {
                    if record.kind == RecordKind::File && record.file.is_some() {
                        report.stats.add_files(1);
                    }
                    validate(&mut record, ctx);
                    report.add_record_warnings(&record);
                    records.push(record);
                }
            }
            Err(warning) => {
                report.stats.inc_unknown_type();
                report.warn(warning);
            }
        }
    }

    if records.is_empty() {
        return Err(FatalParseError::NoData);
    }
    info!(
        rows = report.stats.rows_read,
        records = records.len(),
        skipped = report.stats.skipped(),
        "Manifest parsed"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::CsvAuthority;

    fn context() -> PreflightContext {
        PreflightContext::with_defaults(PreflightConfig::new("/import"))
    }

    fn run_str(manifest: &str) -> Graph {
        run_reader(manifest.as_bytes(), &context())
    }

    #[test]
    fn empty_stream_is_no_data() {
        let graph = run_str("");
        assert_eq!(graph.report.fatal_errors, vec!["no data detected"]);
    }

    #[test]
    fn header_only_is_no_data() {
        let graph = run_str("Object Type,Identifier,Title\n");
        assert_eq!(graph.report.fatal_errors, vec!["no data detected"]);
    }

    #[test]
    fn blank_rows_are_skipped_silently() {
        let graph = run_str("Object Type,Identifier,Title\n,,\nw,W1,Title\n");
        assert!(graph.report.warnings.is_empty());
        assert_eq!(graph.report.stats.blank_rows, 1);
        assert_eq!(graph.works().len(), 1);
    }

    #[test]
    fn line_numbers_count_the_header() {
        let graph = run_str("Object Type,Identifier,Title\nw,W1,One\nw,W2,Two\n");
        let lines: Vec<u64> = graph.works().iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn mismatched_row_is_skipped_with_warning() {
        let graph = run_str("Object Type,Identifier,Title\nw,W1,One,extra\nw,W2,Two\n");
        assert_eq!(graph.works().len(), 1);
        assert_eq!(graph.report.warnings.len(), 1);
        assert!(graph.report.warnings[0].starts_with("Line 2: row has 4 columns"));
        assert_eq!(graph.report.stats.mismatched_rows, 1);
    }

    #[test]
    fn trailing_blank_header_columns_are_ignored() {
        let graph = run_str("Object Type,Identifier,Title,,\nw,W1,T,,\n");
        assert!(graph.report.fatal_errors.is_empty());
        assert!(graph.report.warnings.is_empty(), "{:?}", graph.report.warnings);
        assert_eq!(graph.works().len(), 1);
        assert_eq!(graph.works()[0].key(), Some("W1"));
    }

    #[test]
    fn bom_is_ignored() {
        let graph = run_str("\u{feff}Object Type,Identifier,Title\nw,W1,One\n");
        assert!(graph.report.warnings.is_empty());
        assert_eq!(graph.works().len(), 1);
    }

    #[test]
    fn semicolon_delimiter() {
        let ctx = PreflightContext::with_defaults(PreflightConfig::new("/import").with_delimiter(b';'));
        let graph = run_reader("Object Type;Identifier;Title\nw;W1;One\n".as_bytes(), &ctx);
        assert_eq!(graph.works().len(), 1);
    }

    #[test]
    fn undecodable_stream_is_fatal() {
        let data: &[u8] = b"Object Type,Identifier,Title\nw,\xff\xfe,One\n";
        let graph = run_reader(data, &context());
        assert_eq!(graph.report.fatal_errors.len(), 1);
        assert!(graph.report.fatal_errors[0].contains("UTF-8"));
        assert!(graph.children.is_empty());
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let graph = run(Path::new("/nonexistent/manifest.csv"), &context());
        assert_eq!(graph.report.fatal_errors.len(), 1);
        assert!(graph.report.fatal_errors[0].starts_with("manifest not found"));
    }

    #[test]
    fn unavailable_authority_is_fatal() {
        let missing = CsvAuthority::new("license", "/nonexistent/licenses.csv");
        let result = PreflightContext::from_authorities(
            PreflightConfig::new("/import"),
            &StaticAuthority::resource_types(),
            &missing,
            &StaticAuthority::rights_statements(),
        );
        match result {
            Err(FatalParseError::AuthorityUnavailable { name, .. }) => assert_eq!(name, "license"),
            _ => panic!("expected an unavailable authority"),
        }
    }
}
