//! Ontology grounding and group synthesis.
//!
//! Consumes one model's assembled nodes plus an ontology graph and produces:
//!
//! - per-node ancestry ([`grounding`]): whether the node's highest-priority
//!   database reference exists in the ontology, and if so the shortest path
//!   from that term to the nearest ancestor root, canonicalized so nodes
//!   sharing an ancestor at a depth share a byte-identical lineage prefix;
//! - the group hierarchy ([`groups`]): one deduplicated group per distinct
//!   ontology term encountered, with parent/child links and direct plus
//!   transitive membership.
//!
//! The ontology itself ([`graph`]) is a directed node-link graph whose edges
//! point from a term to its immediate broader term; a term with no outgoing
//! edge is a root of its component.

pub mod graph;
pub mod grounding;
pub mod groups;

use biograph_ident::GlobalId;
use biograph_model::{Group, Node, NodeAttribute};

pub use graph::{OntologyGraph, OntologyError, OntologyTerm};
pub use grounding::{compute_ancestry, ground_nodes};
pub use groups::synthesize_groups;

/// Run the full grounding stage for one model: presence check, ancestry
/// resolution, lineage canonicalization, and group synthesis.
pub fn ground_and_group(
    model_id: GlobalId,
    nodes: &[Node],
    ontology: &OntologyGraph,
) -> Result<(Vec<NodeAttribute>, Vec<Group>), OntologyError> {
    let mut atts = ground_nodes(nodes, ontology);
    compute_ancestry(&mut atts, ontology);
    let groups = synthesize_groups(model_id, &mut atts, ontology)?;
    Ok((atts, groups))
}
