//! Test-path resolution and edge test status.
//!
//! Raw path exports reference edges by statement hash and nodes by name;
//! resolving them against an assembled model yields [`PathRecord`]s with
//! graph-local ids. References that do not resolve (the path mentions a
//! statement or node the model no longer contains) are dropped silently,
//! matching the exports' loose coupling to model snapshots.

use ahash::AHashMap;
use biograph_ident::{EntityKind, GlobalId, IdSequence};
use biograph_model::{Edge, Node, PathRecord};
use serde::Deserialize;
use serde_json::Value;

use crate::AssembleError;

/// One raw path entry as exported per model/test pair.
#[derive(Debug, Deserialize)]
struct RawPathEntry {
    /// Id of the test statement this path explains.
    test: Value,
    #[serde(default)]
    graph_type: Option<String>,
    #[serde(default)]
    edges: Vec<RawPathEdgeGroup>,
    #[serde(default)]
    nodes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPathEdgeGroup {
    #[serde(rename = "type")]
    group_type: String,
    #[serde(default)]
    hashes: Vec<Value>,
}

/// Resolve raw path exports into [`PathRecord`]s.
///
/// `batches` pairs each test corpus id with its raw path entries; ids are
/// allocated across all batches in order, so one model's paths share one
/// sequence.
///
/// Statement hashes resolve through a statement-id → edge-id map; for a
/// multi-edge statement the map keeps the statement's last edge.
pub fn resolve_paths(
    model_id: GlobalId,
    batches: &[(GlobalId, Vec<Value>)],
    edges: &[Edge],
    nodes: &[Node],
) -> Result<Vec<PathRecord>, AssembleError> {
    let edge_by_statement: AHashMap<&str, GlobalId> = edges
        .iter()
        .map(|edge| (edge.statement_id.as_str(), edge.id))
        .collect();
    let node_by_name: AHashMap<&str, GlobalId> = nodes
        .iter()
        .map(|node| (node.name.as_str(), node.id))
        .collect();

    let mut seq = IdSequence::new(EntityKind::Path);
    let mut records = Vec::new();

    for (test_id, entries) in batches {
        for raw in entries {
            let entry: RawPathEntry = match serde_json::from_value(raw.clone()) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed path entry");
                    continue;
                }
            };

            let edge_ids: Vec<GlobalId> = entry
                .edges
                .iter()
                .filter(|group| group.group_type == "statements")
                .flat_map(|group| group.hashes.iter())
                .filter_map(scalar_string)
                .filter_map(|hash| edge_by_statement.get(hash.as_str()).copied())
                .collect();
            let node_ids: Vec<GlobalId> = entry
                .nodes
                .iter()
                .filter_map(|name| node_by_name.get(name.as_str()).copied())
                .collect();

            records.push(PathRecord {
                id: seq.next_id()?,
                model_id,
                test_id: *test_id,
                test_statement_id: scalar_string(&entry.test).unwrap_or_default(),
                path_type: entry.graph_type.unwrap_or_default(),
                edge_ids,
                node_ids,
            });
        }
    }

    Ok(records)
}

/// Mark every edge referenced by at least one path as tested.
pub fn apply_test_status(edges: &mut [Edge], paths: &[PathRecord]) {
    let mut paths_by_edge: AHashMap<GlobalId, Vec<GlobalId>> = AHashMap::new();
    for path in paths {
        for edge_id in &path.edge_ids {
            paths_by_edge.entry(*edge_id).or_default().push(path.id);
        }
    }

    for edge in edges {
        match paths_by_edge.get(&edge.id) {
            Some(path_ids) => {
                edge.tested = true;
                edge.test_path_ids = path_ids.clone();
            }
            None => {
                edge.tested = false;
                edge.test_path_ids = Vec::new();
            }
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
