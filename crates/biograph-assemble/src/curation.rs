//! Edge curation status.
//!
//! Curation exports bucket statement ids by status label
//! (`incorrect`/`correct`/`partial`/`uncurated`). An edge whose statement
//! appears in no bucket stays `uncurated`.

use ahash::AHashMap;
use biograph_model::{CurationStatus, Edge};
use serde_json::Value;

/// Apply a curation export to a model's edges.
///
/// Unknown bucket labels and non-scalar statement ids are skipped with a
/// warning; a non-object export is a no-op.
pub fn apply_curation(edges: &mut [Edge], curation: &Value) {
    let Some(buckets) = curation.as_object() else {
        if !curation.is_null() {
            tracing::warn!("curation export is not an object, ignoring");
        }
        return;
    };

    let mut status_by_statement: AHashMap<String, CurationStatus> = AHashMap::new();
    for (label, ids) in buckets {
        let Some(status) = CurationStatus::from_label(label) else {
            tracing::warn!(label = %label, "unknown curation bucket label, skipping");
            continue;
        };
        let Some(ids) = ids.as_array() else {
            tracing::warn!(label = %label, "curation bucket is not a list, skipping");
            continue;
        };
        for id in ids {
            let statement_id = match id {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            status_by_statement.insert(statement_id, status);
        }
    }

    for edge in edges {
        edge.curated = status_by_statement
            .get(&edge.statement_id)
            .copied()
            .unwrap_or(CurationStatus::Uncurated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble_model;
    use biograph_ident::{EntityKind, GlobalId};
    use serde_json::json;

    #[test]
    fn statuses_apply_per_statement_with_uncurated_default() {
        let model_id = GlobalId::encode(0, EntityKind::Model).unwrap();
        let statements: Vec<Value> = (1..=3)
            .map(|i| {
                json!({
                    "matches_hash": i,
                    "type": "Activation",
                    "belief": 0.9,
                    "subj": {"name": format!("S{i}"), "db_refs": {}},
                    "obj": {"name": format!("O{i}"), "db_refs": {}},
                })
            })
            .collect();
        let mut graph = assemble_model(model_id, &statements).unwrap();

        let curation = json!({
            "correct": [1],
            "incorrect": ["2"],
            "bogus-label": [3],
        });
        apply_curation(&mut graph.edges, &curation);

        assert_eq!(graph.edges[0].curated, CurationStatus::Correct);
        assert_eq!(graph.edges[1].curated, CurationStatus::Incorrect);
        assert_eq!(graph.edges[2].curated, CurationStatus::Uncurated);
    }

    #[test]
    fn non_object_export_is_a_no_op() {
        let model_id = GlobalId::encode(0, EntityKind::Model).unwrap();
        let statements = vec![json!({
            "matches_hash": 1,
            "type": "Activation",
            "belief": 0.9,
            "subj": {"name": "A", "db_refs": {}},
            "obj": {"name": "B", "db_refs": {}},
        })];
        let mut graph = assemble_model(model_id, &statements).unwrap();
        apply_curation(&mut graph.edges, &json!([1, 2]));
        assert_eq!(graph.edges[0].curated, CurationStatus::Uncurated);
    }
}
