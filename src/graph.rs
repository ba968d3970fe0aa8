//! Graph assembly: turns validated records into a forest under a synthetic
//! root.
//!
//! Assembly is a second pass over fully parsed records:
//!
//! 1. Partition into valid and invalid records (invalid ones go to the report)
//! 2. Index valid collections and works by identifier, first writer wins
//! 3. Resolve collection/work parents; unresolved ones attach to the root
//! 4. Index valid works alone and resolve file parents; unresolved files are
//!    dropped
//! 5. Build the owned tree deepest-first, so no step recurses over the tree

use crate::index::IdentifierIndex;
use crate::models::{Record, RecordKind, Status};
use crate::report::Report;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::{debug, info};

/// The assembled forest plus the report of the run that produced it. The
/// synthetic root is implicit: `children` are its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub children: Vec<Record>,
    pub report: Report,
}

/// Counts shown next to the warnings in a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub collections: usize,
    pub works: usize,
    pub files: usize,
    pub invalid: usize,
    pub warnings: usize,
    pub fatal: bool,
}

impl Graph {
    pub fn from_report(report: Report) -> Self {
        Self {
            children: Vec::new(),
            report,
        }
    }

    /// Every attached record, depth-first in child order.
    pub fn records(&self) -> Vec<&Record> {
        let mut out = Vec::new();
        let mut stack: Vec<&Record> = self.children.iter().rev().collect();
        while let Some(record) = stack.pop() {
            out.push(record);
            stack.extend(record.children.iter().rev());
        }
        out
    }

    fn of_kind(&self, kind: RecordKind) -> Vec<&Record> {
        self.records()
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect()
    }

    pub fn collections(&self) -> Vec<&Record> {
        self.of_kind(RecordKind::Collection)
    }

    pub fn works(&self) -> Vec<&Record> {
        self.of_kind(RecordKind::Work)
    }

    pub fn files(&self) -> Vec<&Record> {
        self.of_kind(RecordKind::File)
    }

    /// Lets the materializer stamp a status onto an attached record.
    pub fn find_mut(&mut self, identifier: &str) -> Option<&mut Record> {
        let mut stack: Vec<&mut Record> = self.children.iter_mut().rev().collect();
        while let Some(record) = stack.pop() {
            if record.key() == Some(identifier) {
                return Some(record);
            }
            stack.extend(record.children.iter_mut().rev());
        }
        None
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            collections: 0,
            works: 0,
            files: 0,
            invalid: self.report.invalid.len(),
            warnings: self.report.warnings.len(),
            fatal: self.report.is_fatal(),
        };
        for record in self.records() {
            match record.kind {
                RecordKind::Collection => summary.collections += 1,
                RecordKind::Work => summary.works += 1,
                RecordKind::File => summary.files += 1,
            }
        }
        summary
    }
}

/// Links validated records into a forest and returns the root's children.
/// Invalid records, orphans and dropped files are reported on `report`.
pub fn assemble(records: Vec<Record>, report: &mut Report) -> Vec<Record> {
    let mut valid = Vec::with_capacity(records.len());
    for record in records {
        if record.is_valid() {
            valid.push(record);
        } else {
            report.add_invalid(record);
        }
    }

    let containers: Vec<usize> = (0..valid.len())
        .filter(|&i| valid[i].kind != RecordKind::File)
        .collect();
    let (index, duplicates) =
        IdentifierIndex::build(containers.iter().map(|&i| (valid[i].key(), i)));
    let (works, _) = IdentifierIndex::build(
        containers
            .iter()
            .filter(|&&i| valid[i].kind == RecordKind::Work)
            .map(|&i| (valid[i].key(), i)),
    );
    for (position, first) in duplicates {
        let record = &valid[position];
        let key = record.key().unwrap_or("");
        let scope = if works.resolve(key) == Some(position) {
            "collections and works cannot use it as a parent, files still attach to it"
        } else {
            "nothing can use it as a parent"
        };
        report.warn(format!(
            "Line {}: identifier '{key}' is already used on line {}; {scope}",
            record.line_number,
            valid[first].line_number,
        ));
    }

    let mut parent: Vec<Option<usize>> = vec![None; valid.len()];
    for &i in &containers {
        let record = &valid[i];
        let Some(parent_key) = record.parent_key() else {
            continue;
        };
        match index.resolve(parent_key) {
            Some(p) => parent[i] = Some(p),
            None => report.warn(format!(
                "Line {}: could not find parent '{parent_key}' for {} '{}' - will be created without a parent",
                record.line_number,
                record.kind,
                record.display_name(),
            )),
        }
    }
    break_cycles(&valid, &mut parent, report);

    let mut dropped = vec![false; valid.len()];
    for i in (0..valid.len()).filter(|&i| valid[i].kind == RecordKind::File) {
        let record = &valid[i];
        match record.parent_key() {
            Some(parent_key) => match works.resolve(parent_key) {
                Some(p) => parent[i] = Some(p),
                None => {
                    report.warn(format!(
                        "Line {}: could not find parent work '{parent_key}' for file '{}' - file will be ignored",
                        record.line_number,
                        record.display_name(),
                    ));
                    dropped[i] = true;
                }
            },
            None => {
                report.warn(format!(
                    "Line {}: file '{}' has no parent work - file will be ignored",
                    record.line_number,
                    record.display_name(),
                ));
                dropped[i] = true;
            }
        }
    }

    let depth = depths(&parent);
    let mut order: Vec<usize> = (0..valid.len()).filter(|&i| !dropped[i]).collect();
    // Children are built before their parents. Within one parent, collections
    // and works come before files, each in manifest order.
    order.sort_by_key(|&i| (Reverse(depth[i]), valid[i].kind == RecordKind::File, i));

    let mut slots: Vec<Option<Record>> = valid.into_iter().map(Some).collect();
    let mut roots = Vec::new();
    for i in order {
        let Some(mut record) = slots[i].take() else {
            continue;
        };
        record.status = Status::AttachedValid;
        match parent[i].and_then(|p| slots[p].as_mut()) {
            Some(parent_record) => parent_record.children.push(record),
            None => roots.push(record),
        }
    }

    info!(
        roots = roots.len(),
        invalid = report.invalid.len(),
        dropped = dropped.iter().filter(|&&d| d).count(),
        "Graph assembled"
    );
    roots
}

/// Clears the parent link of any record that would close a loop, so the
/// result is a forest. The record attaches to the root with a warning.
fn break_cycles(records: &[Record], parent: &mut [Option<usize>], report: &mut Report) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; records.len()];
    for start in 0..records.len() {
        if state[start] != UNSEEN {
            continue;
        }
        let mut path = Vec::new();
        let mut current = start;
        loop {
            state[current] = ON_PATH;
            path.push(current);
            match parent[current] {
                Some(p) if state[p] == UNSEEN => current = p,
                Some(p) if state[p] == ON_PATH => {
                    let record = &records[current];
                    debug!(line = record.line_number, "Breaking parent cycle");
                    report.warn(format!(
                        "Line {}: parent '{}' of {} '{}' would create a cycle - will be created without a parent",
                        record.line_number,
                        records[p].key().unwrap_or(""),
                        record.kind,
                        record.display_name(),
                    ));
                    parent[current] = None;
                    break;
                }
                _ => break,
            }
        }
        for i in path {
            state[i] = DONE;
        }
    }
}

/// Distance from the root for every record. `parent` must be acyclic.
fn depths(parent: &[Option<usize>]) -> Vec<usize> {
    let mut depth: Vec<Option<usize>> = vec![None; parent.len()];
    let mut path = Vec::new();
    for start in 0..parent.len() {
        path.clear();
        let mut base = 0;
        let mut current = Some(start);
        while let Some(i) = current {
            if let Some(d) = depth[i] {
                base = d + 1;
                break;
            }
            path.push(i);
            current = parent[i];
        }
        for (offset, &i) in path.iter().rev().enumerate() {
            depth[i] = Some(base + offset);
        }
    }
    depth.into_iter().map(|d| d.unwrap_or(0)).collect()
}
