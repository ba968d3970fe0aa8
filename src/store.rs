use crate::config::{GRAPH_FILE_NAME, GRAPH_FORMAT_VERSION};
use crate::graph::Graph;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const VERSION_KEY: &str = "format_version";

pub fn graph_path(job_dir: &Path) -> PathBuf {
    job_dir.join(GRAPH_FILE_NAME)
}

/// Writes the graph's attribute map as JSON, atomically via rename.
pub fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let mut value = graph.to_attributes()?;
    if let Some(map) = value.as_object_mut() {
        map.insert(VERSION_KEY.to_string(), Value::from(GRAPH_FORMAT_VERSION));
    }

    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp graph file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &value).context("Failed to serialize graph")?;
    writer.flush().context("Failed to flush graph file")?;
    drop(writer);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename temp graph file to: {:?}", path))?;

    let summary = graph.summary();
    info!(
        collections = summary.collections,
        works = summary.works,
        files = summary.files,
        path = ?path,
        "Graph saved"
    );
    Ok(())
}

/// Reads a graph written by [`save_graph`]. Deep hierarchies are allowed, so
/// the JSON recursion limit is lifted.
pub fn load_graph(path: &Path) -> Result<Graph> {
    if !path.exists() {
        bail!("Graph file does not exist: {:?}", path);
    }

    let file =
        File::open(path).with_context(|| format!("Failed to open graph file: {:?}", path))?;
    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(file));
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer)
        .with_context(|| format!("Failed to parse graph file: {:?}", path))?;

    match value.get(VERSION_KEY).and_then(Value::as_u64) {
        Some(GRAPH_FORMAT_VERSION) => {}
        Some(other) => bail!(
            "Graph file version {} is not supported (expected {})",
            other,
            GRAPH_FORMAT_VERSION
        ),
        None => bail!("Graph file has no format version: {:?}", path),
    }

    let graph = Graph::from_attributes(&value)
        .with_context(|| format!("Failed to rebuild graph from: {:?}", path))?;
    info!(records = graph.records().len(), path = ?path, "Graph loaded");
    Ok(graph)
}

/// Returns `Ok(None)` when the file is missing or unreadable instead of
/// failing, for callers that fall back to re-running the preflight.
pub fn try_load_graph(path: &Path) -> Result<Option<Graph>> {
    if !path.exists() {
        return Ok(None);
    }
    match load_graph(path) {
        Ok(graph) => Ok(Some(graph)),
        Err(e) => {
            warn!(error = %e, "Graph file is corrupt or unreadable");
            Ok(None)
        }
    }
}
