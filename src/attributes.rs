//! Conversion between a [`Graph`] and a generic attribute map.
//!
//! Every node is a map with a `type` key (`root`, `collection`, `work` or
//! `file`) and, for nodes that can have them, a nested `children` list. The
//! reader switches on `type` over a closed set; unknown types are rejected.
//! Both directions walk the tree with an explicit stack so hierarchy depth is
//! bounded by heap, not by the call stack.

use crate::graph::Graph;
use crate::models::{Record, RecordKind};
use crate::report::Report;
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

pub const ROOT_TYPE: &str = "root";
const TYPE_KEY: &str = "type";
const CHILDREN_KEY: &str = "children";
const REPORT_KEY: &str = "report";

enum NodeType {
    Root,
    Record(RecordKind),
}

impl Graph {
    pub fn to_attributes(&self) -> Result<Value> {
        let mut root = Map::new();
        root.insert(TYPE_KEY.to_string(), Value::from(ROOT_TYPE));
        root.insert(
            CHILDREN_KEY.to_string(),
            Value::Array(encode_forest(&self.children)?),
        );
        root.insert(
            REPORT_KEY.to_string(),
            serde_json::to_value(&self.report).context("Failed to encode report")?,
        );
        Ok(Value::Object(root))
    }

    pub fn from_attributes(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .context("graph attributes must be a map")?;
        if let NodeType::Record(kind) = node_type(map)? {
            bail!("expected a root node, found '{kind}'");
        }
        let children = decode_forest(children_of(map)?)?;
        let report: Report = match map.get(REPORT_KEY) {
            Some(report) => {
                serde_json::from_value(report.clone()).context("Failed to decode report")?
            }
            None => Report::default(),
        };
        Ok(Self { children, report })
    }
}

fn node_type(map: &Map<String, Value>) -> Result<NodeType> {
    let tag = map
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .context("node is missing its 'type' attribute")?;
    Ok(match tag {
        ROOT_TYPE => NodeType::Root,
        "collection" => NodeType::Record(RecordKind::Collection),
        "work" => NodeType::Record(RecordKind::Work),
        "file" => NodeType::Record(RecordKind::File),
        other => bail!("unknown node type '{other}'"),
    })
}

fn children_of(map: &Map<String, Value>) -> Result<&[Value]> {
    match map.get(CHILDREN_KEY) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(children)) => Ok(children.as_slice()),
        Some(_) => bail!("'children' must be a list"),
    }
}

fn encode_record(record: &Record, children: Vec<Value>) -> Result<Value> {
    let mut value = serde_json::to_value(record)
        .with_context(|| format!("Failed to encode record from line {}", record.line_number))?;
    let map = value
        .as_object_mut()
        .context("record did not encode as a map")?;
    if record.kind.can_have_children() {
        map.insert(CHILDREN_KEY.to_string(), Value::Array(children));
    }
    Ok(value)
}

fn encode_forest(nodes: &[Record]) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(nodes.len());
    // Each frame holds a record and the encoded values of its children so far.
    let mut stack: Vec<(&Record, Vec<Value>)> = Vec::new();

    for node in nodes {
        stack.push((node, Vec::with_capacity(node.children.len())));
        while let Some(top) = stack.last_mut() {
            let (record, done) = (top.0, top.1.len());
            if let Some(child) = record.children.get(done) {
                stack.push((child, Vec::with_capacity(child.children.len())));
                continue;
            }
            let Some((record, children)) = stack.pop() else {
                break;
            };
            let value = encode_record(record, children)?;
            match stack.last_mut() {
                Some(parent) => parent.1.push(value),
                None => out.push(value),
            }
        }
    }
    Ok(out)
}

fn decode_record(value: &Value) -> Result<(Record, &[Value])> {
    let map = value.as_object().context("node attributes must be a map")?;
    let kind = match node_type(map)? {
        NodeType::Record(kind) => kind,
        NodeType::Root => bail!("root node nested inside the graph"),
    };
    let children = children_of(map)?;
    if !kind.can_have_children() && !children.is_empty() {
        bail!("{kind} nodes cannot have children");
    }

    let attributes: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| key.as_str() != CHILDREN_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let record: Record = serde_json::from_value(Value::Object(attributes))
        .with_context(|| format!("Failed to decode {kind} node"))?;
    if kind != RecordKind::File && record.file.is_some() {
        bail!("{kind} node on line {} carries a file", record.line_number);
    }
    Ok((record, children))
}

fn decode_forest(nodes: &[Value]) -> Result<Vec<Record>> {
    let mut out = Vec::with_capacity(nodes.len());
    // Each frame holds the encoded children still to read and the record
    // they belong to; decoded children are pushed onto the record as we go.
    let mut stack: Vec<(&[Value], Record)> = Vec::new();

    for node in nodes {
        let (record, children) = decode_record(node)?;
        stack.push((children, record));
        while let Some(top) = stack.last_mut() {
            let (pending, done) = (top.0, top.1.children.len());
            if let Some(child) = pending.get(done) {
                let (record, children) = decode_record(child)?;
                stack.push((children, record));
                continue;
            }
            let Some((_, record)) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some(parent) => parent.1.children.push(record),
                None => out.push(record),
            }
        }
    }
    Ok(out)
}
