//! Output record types.
//!
//! One struct per record kind emitted by the pipeline. Field names are the
//! wire contract: rows are serialized with `serde_json` and then projected
//! through the matching [`crate::preamble`] whitelist, so anything not listed
//! there stays internal.
//!
//! All id fields are [`GlobalId`]s; collections owned by one model never
//! reference another model's records.

use biograph_ident::GlobalId;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Source-entity ("model") metadata. Populated by the I/O layer; carried here
/// so the projection contract covers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: GlobalId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub test_ids: Vec<GlobalId>,
    pub snapshot_time: Option<String>,
}

/// Test-corpus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCorpus {
    pub id: GlobalId,
    pub name: Option<String>,
    pub model_ids: Vec<GlobalId>,
    pub snapshot_time: Option<String>,
}

/// One explanatory/test path through a model's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    pub id: GlobalId,
    pub model_id: GlobalId,
    pub test_id: GlobalId,
    pub test_statement_id: String,
    #[serde(rename = "type")]
    pub path_type: String,
    pub edge_ids: Vec<GlobalId>,
    pub node_ids: Vec<GlobalId>,
}

/// Curation status of an edge's source statement.
///
/// Serializes as its wire integer (`incorrect = 0`, `correct = 1`,
/// `partial = 2`, `uncurated = 3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurationStatus {
    Incorrect,
    Correct,
    Partial,
    Uncurated,
}

impl CurationStatus {
    pub const fn as_wire(self) -> u8 {
        match self {
            CurationStatus::Incorrect => 0,
            CurationStatus::Correct => 1,
            CurationStatus::Partial => 2,
            CurationStatus::Uncurated => 3,
        }
    }

    /// Parse a curation bucket label as it appears in curation exports.
    pub fn from_label(label: &str) -> Option<CurationStatus> {
        match label {
            "incorrect" => Some(CurationStatus::Incorrect),
            "correct" => Some(CurationStatus::Correct),
            "partial" => Some(CurationStatus::Partial),
            "uncurated" => Some(CurationStatus::Uncurated),
            _ => None,
        }
    }
}

impl Default for CurationStatus {
    fn default() -> Self {
        CurationStatus::Uncurated
    }
}

impl Serialize for CurationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for CurationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(CurationStatus::Incorrect),
            1 => Ok(CurationStatus::Correct),
            2 => Ok(CurationStatus::Partial),
            3 => Ok(CurationStatus::Uncurated),
            other => Err(de::Error::custom(format!(
                "invalid curation status value: {other}"
            ))),
        }
    }
}

/// A directed edge derived from one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: GlobalId,
    pub model_id: GlobalId,
    /// Stable id (`matches_hash`) of the source statement.
    pub statement_id: String,
    pub statement_type: String,
    pub belief: f64,
    pub evidence_ids: Vec<GlobalId>,
    pub doc_ids: Vec<GlobalId>,
    pub source_node_id: GlobalId,
    pub target_node_id: GlobalId,
    pub tested: bool,
    pub test_path_ids: Vec<GlobalId>,
    pub curated: CurationStatus,
    pub directed: bool,
    /// `Some(true)` positive, `Some(false)` negative, `None` undefined.
    pub polarity: Option<bool>,
}

/// A deduplicated evidentiary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: GlobalId,
    pub model_id: GlobalId,
    pub text: Option<String>,
    pub text_refs: Option<Value>,
    /// Content hash that identifies this evidence across statements.
    pub source_hash: String,
    pub statement_ids: Vec<String>,
    pub edge_ids: Vec<GlobalId>,
    pub doc_ids: Vec<GlobalId>,
}

/// One external document identifier entry (`text_refs` key/value pair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocIdentifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub id: Value,
}

/// A deduplicated source document, merged over structurally-equal
/// `text_refs` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub id: GlobalId,
    pub model_id: GlobalId,
    pub evidence_ids: Vec<GlobalId>,
    pub edge_ids: Vec<GlobalId>,
    pub identifier: Vec<DocIdentifier>,
}

/// One external database reference attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRef {
    pub namespace: String,
    pub id: Value,
}

impl DbRef {
    /// Render as a `namespace:local_id` term, the form ontology node ids use.
    pub fn curie(&self) -> String {
        match &self.id {
            Value::String(s) => format!("{}:{}", self.namespace, s),
            other => format!("{}:{}", self.namespace, other),
        }
    }
}

/// A graph node, keyed by entity name within one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: GlobalId,
    pub model_id: GlobalId,
    pub name: String,
    /// True iff at least one non-text database reference remains.
    pub grounded_db: bool,
    /// External references, sorted by namespace priority (descending).
    pub db_ids: Vec<DbRef>,
    pub edge_ids_source: Vec<GlobalId>,
    pub edge_ids_target: Vec<GlobalId>,
    pub in_degree: usize,
    pub out_degree: usize,
}

/// How a node's ancestry was determined by the grounding resolver.
///
/// The length-1 fallbacks are deliberately distinct so "this term has no
/// reachable root" never masquerades as "this term is a root".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroundingOutcome {
    /// No usable database reference, or the reference is absent from the
    /// ontology. A defined, first-class outcome, not an error.
    Ungrounded,
    /// The term's connected component has exactly one member.
    TrivialComponent,
    /// The term itself is a root of its component.
    ComponentRoot,
    /// A shortest path to the nearest ancestor root was found.
    AncestorPath,
    /// The term sits in a non-trivial component but no root is reachable
    /// from it (e.g. every outgoing walk stays inside a cycle).
    NoRootReachable,
}

impl fmt::Display for GroundingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroundingOutcome::Ungrounded => "ungrounded",
            GroundingOutcome::TrivialComponent => "trivial-component",
            GroundingOutcome::ComponentRoot => "component-root",
            GroundingOutcome::AncestorPath => "ancestor-path",
            GroundingOutcome::NoRootReachable => "no-root-reachable",
        };
        f.write_str(s)
    }
}

/// The synthetic ancestry term assigned to ungroundable nodes.
pub const NOT_GROUNDED_REF: &str = "not-grounded";

/// Per-node grounding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttribute {
    pub node_id: GlobalId,
    /// Highest-priority `namespace:id` term, if the node has any reference.
    pub db_ref_priority: Option<String>,
    /// True iff the priority term exists in the ontology.
    pub grounded_group: bool,
    /// Outermost ancestor term of the canonicalized ancestry path.
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    /// Ancestry as group ids, ancestor-first.
    pub group_ids: Vec<GlobalId>,
    /// Ancestry as ontology terms, ancestor-first.
    pub group_refs: Vec<String>,
    /// Length of the ancestry path.
    pub node_group_level: usize,
    pub outcome: GroundingOutcome,
}

/// A synthesized hierarchy group for one distinct ontology term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GlobalId,
    /// The ontology term this group represents (`namespace:id`, or the
    /// synthetic [`NOT_GROUNDED_REF`]).
    pub id_onto: String,
    pub name: String,
    /// Smallest depth at which the term appears across all ancestry paths.
    pub level: usize,
    pub parent_id: Option<GlobalId>,
    pub children_ids: Vec<GlobalId>,
    pub model_id: GlobalId,
    /// Nodes whose ancestry contains this term anywhere.
    pub node_ids_all: Vec<GlobalId>,
    /// Nodes directly grounded to this term (last path element).
    pub node_ids_direct: Vec<GlobalId>,
}
