//! Projection preambles.
//!
//! Each output file kind has a *preamble*: an ordered list of expected
//! fields with a human-readable description per field. The preamble is a
//! projection contract, not an algorithm. A row written through it contains
//! exactly the listed fields, with absent ones padded to `null`, and the
//! preamble object itself is emitted as the first line of each output file
//! so consumers can interpret columns without out-of-band schema knowledge.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Output record kinds covered by the projection contract.
///
/// This is a superset of the id namespaces: node attributes are keyed by
/// `node_id` and allocate no ids of their own, but still have a preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Models,
    Tests,
    Paths,
    Edges,
    Evidences,
    Docs,
    Nodes,
    NodeAtts,
    Groups,
}

/// Unknown record-kind token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a valid record kind")]
pub struct UnknownRecordKind(pub String);

impl RecordKind {
    pub const ALL: [RecordKind; 9] = [
        RecordKind::Models,
        RecordKind::Tests,
        RecordKind::Paths,
        RecordKind::Edges,
        RecordKind::Evidences,
        RecordKind::Docs,
        RecordKind::Nodes,
        RecordKind::NodeAtts,
        RecordKind::Groups,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RecordKind::Models => "models",
            RecordKind::Tests => "tests",
            RecordKind::Paths => "paths",
            RecordKind::Edges => "edges",
            RecordKind::Evidences => "evidences",
            RecordKind::Docs => "docs",
            RecordKind::Nodes => "nodes",
            RecordKind::NodeAtts => "nodeAtts",
            RecordKind::Groups => "groups",
        }
    }

    /// Ordered `(field, description)` pairs for this kind.
    pub const fn fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordKind::Models => &[
                ("id", "<int> ID of this model"),
                ("name", "<str> human-readable name of this model"),
                ("description", "<str> human-readable description of this model"),
                ("test_ids", "<list of ints> IDs of the tests this model was evaluated against"),
                ("snapshot_time", "<str> ISO 8601 UTC time at which the model data was snapshotted"),
            ],
            RecordKind::Tests => &[
                ("id", "<int> ID of this test corpus"),
                ("name", "<str> human-readable name of this test corpus"),
                ("model_ids", "<list of ints> IDs of the models evaluated against this corpus"),
                ("snapshot_time", "<str> ISO 8601 UTC time at which the test data was snapshotted"),
            ],
            RecordKind::Paths => &[
                ("id", "<int> ID of this path"),
                ("model_id", "<int> ID of the associated model"),
                ("test_id", "<int> ID of the associated test corpus"),
                ("test_statement_id", "<str> id of the test statement this path explains"),
                ("type", "<str> graph type of this path (`unsigned_graph`, `signed_graph`, ...)"),
                ("edge_ids", "<list of ints> IDs of the edges along this path"),
                ("node_ids", "<list of ints> IDs of the nodes along this path"),
            ],
            RecordKind::Edges => &[
                ("id", "<int> ID of this edge"),
                ("model_id", "<int> ID of the associated model"),
                ("statement_id", "<str> stable id (`matches_hash`) of the source statement"),
                ("statement_type", "<str> relation kind of the source statement"),
                ("belief", "<float> belief score of the source statement"),
                ("evidence_ids", "<list of ints> IDs of the evidences supporting the source statement"),
                ("doc_ids", "<list of ints> IDs of the docs supporting the source statement"),
                ("source_node_id", "<int> ID of the source node"),
                ("target_node_id", "<int> ID of the target node"),
                ("tested", "<bool> whether any test path references this edge"),
                ("test_path_ids", "<list of ints> IDs of the paths that reference this edge"),
                ("curated", "<int> curation status (0 incorrect, 1 correct, 2 partial, 3 uncurated)"),
                ("directed", "<bool> whether this edge is directed"),
                ("polarity", "<bool> polarity (`true` positive, `false` negative, `null` undefined)"),
            ],
            RecordKind::Evidences => &[
                ("id", "<int> ID of this evidence"),
                ("model_id", "<int> ID of the associated model"),
                ("text", "<str> plain text of this evidence"),
            ],
            RecordKind::Docs => &[
                ("id", "<int> ID of this doc"),
                ("model_id", "<int> ID of the associated model"),
                ("evidence_ids", "<list of ints> IDs of the evidences referencing this doc"),
                ("edge_ids", "<list of ints> IDs of the edges referencing this doc"),
                ("identifier", "<list of objects> external doc identifiers (keys = `type`, `id`)"),
            ],
            RecordKind::Nodes => &[
                ("id", "<int> ID of this node"),
                ("model_id", "<int> ID of the associated model"),
                ("name", "<str> human-readable name of this node"),
                ("grounded_db", "<bool> whether this node carries any non-text database reference"),
                ("db_ids", "<list of objects> database references (`namespace`, `id`), priority-sorted"),
                ("edge_ids_source", "<list of ints> IDs of the edges with this node as source"),
                ("edge_ids_target", "<list of ints> IDs of the edges with this node as target"),
                ("out_degree", "<int> out-degree of this node"),
                ("in_degree", "<int> in-degree of this node"),
            ],
            RecordKind::NodeAtts => &[
                ("node_id", "<int> ID of the node"),
                ("grounded_group", "<bool> whether this node is grounded to the given ontology"),
                ("type", "<str> outermost ancestor term of this node's ancestry"),
                ("group_ids", "<list of ints> ancestry as group IDs, ancestor-first"),
                ("node_group_level", "<int> length of this node's ancestry path"),
            ],
            RecordKind::Groups => &[
                ("id", "<int> ID of this group"),
                ("id_onto", "<str> ontology term of this group (`namespace:id`)"),
                ("name", "<str> human-readable name of this group"),
                ("level", "<int> smallest ancestry depth at which this group's term appears"),
                ("parent_id", "<int> ID of the immediate parent group (`null` for roots)"),
                ("children_ids", "<list of ints> IDs of the immediate child groups"),
                ("model_id", "<int> ID of the associated model"),
                ("node_ids_all", "<list of ints> nodes grounded to this group or any descendant"),
                ("node_ids_direct", "<list of ints> nodes directly grounded to this group"),
            ],
        }
    }

    /// The preamble as a JSON object, suitable for the first line of an
    /// output file.
    pub fn preamble_object(self) -> Value {
        let mut obj = Map::new();
        for (field, description) in self.fields() {
            obj.insert((*field).to_string(), Value::String((*description).to_string()));
        }
        Value::Object(obj)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownRecordKind(s.to_string()))
    }
}

/// Project a serialized record through a preamble: keep exactly the listed
/// fields, in order, padding absent ones with `null`.
pub fn project(record: &Value, kind: RecordKind) -> Value {
    let mut out = Map::new();
    let source = record.as_object();
    for (field, _) in kind.fields() {
        let value = source
            .and_then(|obj| obj.get(*field))
            .cloned()
            .unwrap_or(Value::Null);
        out.insert((*field).to_string(), value);
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_kind_tokens_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
        }
        assert!("docLayout".parse::<RecordKind>().is_err());
    }

    #[test]
    fn projection_whitelists_and_pads() {
        let row = json!({
            "id": 3,
            "model_id": 1,
            "text": "K binds R.",
            "source_hash": "should not survive projection",
        });
        let projected = project(&row, RecordKind::Evidences);
        let obj = projected.as_object().unwrap();
        assert_eq!(obj.len(), RecordKind::Evidences.fields().len());
        assert_eq!(obj["text"], json!("K binds R."));
        assert!(!obj.contains_key("source_hash"));
    }

    #[test]
    fn projection_pads_missing_fields_with_null() {
        let projected = project(&json!({"id": 9}), RecordKind::Docs);
        assert_eq!(projected["identifier"], Value::Null);
        assert_eq!(projected["id"], json!(9));
    }

    #[test]
    fn preamble_object_lists_every_field() {
        let obj = RecordKind::Edges.preamble_object();
        let obj = obj.as_object().unwrap();
        assert_eq!(obj.len(), RecordKind::Edges.fields().len());
        assert!(obj.contains_key("polarity"));
    }
}
