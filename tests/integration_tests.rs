//! Integration tests for the complete biograph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Statements → Transformer → nodes/edges/evidences/docs
//! - Nodes + Ontology → Grounding → node attributes
//! - Node attributes → Group synthesis → hierarchy
//!
//! Run with: cargo test --test integration_tests

use serde_json::{json, Value};

use biograph_assemble::namespaces::{ordered_namespaces, sort_node_groundings};
use biograph_assemble::{assemble_model, ModelGraph};
use biograph_ident::{EntityKind, GlobalId};
use biograph_model::records::NOT_GROUNDED_REF;
use biograph_model::GroundingOutcome;
use biograph_ontology::{ground_and_group, OntologyGraph};

// ============================================================================
// Fixtures
// ============================================================================

fn model_id() -> GlobalId {
    GlobalId::encode(0, EntityKind::Model).unwrap()
}

fn agent(name: &str, db_refs: Value) -> Value {
    json!({"name": name, "db_refs": db_refs})
}

/// A small corpus exercising every role pattern plus shared evidence.
fn sample_statements() -> Vec<Value> {
    vec![
        json!({
            "matches_hash": 1,
            "type": "Activation",
            "belief": 0.9,
            "subj": agent("MEK", json!({"FPLX": "MEK", "TEXT": "mek"})),
            "obj": agent("ERK", json!({"FPLX": "ERK"})),
            "evidence": [
                {"source_hash": 100, "text": "MEK activates ERK.", "text_refs": {"PMID": "11"}},
            ],
        }),
        json!({
            "matches_hash": 2,
            "type": "Phosphorylation",
            "belief": 0.8,
            "enz": agent("MEK", json!({"FPLX": "MEK"})),
            "sub": agent("ERK", json!({"FPLX": "ERK"})),
            "evidence": [
                {"source_hash": 100, "text": "duplicate of the activation evidence"},
                {"source_hash": 101, "text": "MEK phosphorylates ERK.", "text_refs": {"PMID": "11"}},
            ],
        }),
        json!({
            "matches_hash": 3,
            "type": "Complex",
            "belief": 0.7,
            "members": [
                agent("RAF", json!({"FPLX": "RAF"})),
                agent("MEK", json!({"FPLX": "MEK"})),
                agent("HSP90", json!({"TEXT": "hsp90"})),
            ],
        }),
        // Matches no role pattern: dropped.
        json!({"matches_hash": 4, "type": "Translocation", "belief": 0.3}),
    ]
}

fn sample_ontology() -> OntologyGraph {
    // FPLX:MEK -> FPLX:KINASE -> FPLX:PROTEIN (root)
    // FPLX:ERK -> FPLX:KINASE
    // FPLX:RAF is present but isolated.
    OntologyGraph::from_value(&json!({
        "directed": true,
        "nodes": [
            {"id": "FPLX:PROTEIN", "name": "protein"},
            {"id": "FPLX:KINASE", "name": "kinase"},
            {"id": "FPLX:MEK", "name": "MEK"},
            {"id": "FPLX:ERK", "name": "ERK"},
            {"id": "FPLX:RAF", "name": "RAF"},
        ],
        "links": [
            {"source": "FPLX:MEK", "target": "FPLX:KINASE", "type": "isa"},
            {"source": "FPLX:ERK", "target": "FPLX:KINASE", "type": "isa"},
            {"source": "FPLX:KINASE", "target": "FPLX:PROTEIN", "type": "isa"},
            {"source": "FPLX:MEK", "target": "HGNC:6840", "type": "xref"},
        ],
    }))
    .unwrap()
}

fn assembled() -> ModelGraph {
    let mut graph = assemble_model(model_id(), &sample_statements()).unwrap();
    let priority = vec!["FPLX".to_string(), "HGNC".to_string()];
    let order = ordered_namespaces(&priority, &graph.nodes, sample_ontology().term_ids());
    sort_node_groundings(&mut graph.nodes, &order);
    graph
}

// ============================================================================
// Transformer → grounding → groups, end to end
// ============================================================================

#[test]
fn full_pipeline_counts() {
    let graph = assembled();

    // 1 activation + 1 phosphorylation + 3·2 complex pairs.
    assert_eq!(graph.edges.len(), 8);
    assert_eq!(graph.nodes.len(), 4); // MEK, ERK, RAF, HSP90
    assert_eq!(graph.evidences.len(), 2); // source_hash 100 deduplicated
    assert_eq!(graph.docs.len(), 1); // both text_refs are {"PMID": "11"}
    assert_eq!(graph.report.statements_matched, 3);
    assert_eq!(graph.report.skipped_unmatched, 1);
    assert_eq!(graph.report.skipped_malformed, 0);
}

#[test]
fn shared_evidence_unions_statements_and_edges() {
    let graph = assembled();

    let shared = graph
        .evidences
        .iter()
        .find(|ev| ev.source_hash == "100")
        .expect("deduplicated evidence");
    assert_eq!(shared.statement_ids, vec!["1", "2"]);
    // One edge from each of the two statements.
    assert_eq!(shared.edge_ids.len(), 2);
    // First-seen text wins.
    assert_eq!(shared.text.as_deref(), Some("MEK activates ERK."));

    // The single doc aggregates both evidences.
    let doc = &graph.docs[0];
    assert_eq!(doc.evidence_ids.len(), 2);
    assert!(doc.identifier.iter().any(|i| i.id_type == "pmid"));
}

#[test]
fn grounding_resolves_ancestry_and_groups() {
    let graph = assembled();
    let ontology = sample_ontology();
    let (atts, groups) = ground_and_group(model_id(), &graph.nodes, &ontology).unwrap();

    for (node, att) in graph.nodes.iter().zip(atts.iter()) {
        match node.name.as_str() {
            "MEK" | "ERK" => {
                assert!(att.grounded_group);
                assert_eq!(att.node_group_level, 3);
                assert_eq!(att.group_refs[0], "FPLX:PROTEIN");
                assert_eq!(att.group_refs[1], "FPLX:KINASE");
                assert_eq!(att.node_type.as_deref(), Some("FPLX:PROTEIN"));
                assert_eq!(att.outcome, GroundingOutcome::AncestorPath);
            }
            "RAF" => {
                // Present in the ontology but in a single-term component.
                assert!(att.grounded_group);
                assert_eq!(att.group_refs, vec!["FPLX:RAF"]);
                assert_eq!(att.outcome, GroundingOutcome::TrivialComponent);
            }
            "HSP90" => {
                // Text-only grounding: not groundable.
                assert!(!att.grounded_group);
                assert_eq!(att.group_refs, vec![NOT_GROUNDED_REF]);
                assert_eq!(att.node_group_level, 1);
                assert_eq!(att.outcome, GroundingOutcome::Ungrounded);
            }
            other => panic!("unexpected node {other}"),
        }
    }

    // One group per distinct term: PROTEIN, KINASE, MEK, ERK, RAF, not-grounded.
    assert_eq!(groups.len(), 6);
    let find = |term: &str| groups.iter().find(|g| g.id_onto == term).unwrap();

    let protein = find("FPLX:PROTEIN");
    let kinase = find("FPLX:KINASE");
    assert_eq!(protein.level, 0);
    assert_eq!(protein.parent_id, None);
    assert_eq!(kinase.parent_id, Some(protein.id));
    assert!(protein.children_ids.contains(&kinase.id));
    assert_eq!(protein.name, "protein");

    // MEK and ERK are transitively under PROTEIN, directly under themselves.
    assert_eq!(protein.node_ids_all.len(), 2);
    assert!(protein.node_ids_direct.is_empty());
    let mek = find("FPLX:MEK");
    assert_eq!(mek.node_ids_direct.len(), 1);

    let ungrounded = find(NOT_GROUNDED_REF);
    assert_eq!(ungrounded.name, NOT_GROUNDED_REF);
    assert_eq!(ungrounded.node_ids_all, ungrounded.node_ids_direct);
}

#[test]
fn hierarchy_consistency_across_sibling_nodes() {
    let graph = assembled();
    let ontology = sample_ontology();
    let (atts, _) = ground_and_group(model_id(), &graph.nodes, &ontology).unwrap();

    // Any two nodes sharing a term at a depth share the full prefix.
    for a in &atts {
        for b in &atts {
            for (depth, term) in a.group_refs.iter().enumerate() {
                if b.group_refs.get(depth) == Some(term) {
                    assert_eq!(a.group_refs[..depth], b.group_refs[..depth]);
                }
            }
        }
    }
}

#[test]
fn group_forest_has_consistent_parent_child_links() {
    let graph = assembled();
    let ontology = sample_ontology();
    let (_, groups) = ground_and_group(model_id(), &graph.nodes, &ontology).unwrap();

    for group in &groups {
        if let Some(parent_id) = group.parent_id {
            let parent = groups.iter().find(|g| g.id == parent_id).unwrap();
            assert!(parent.children_ids.contains(&group.id));
        }
        for child_id in &group.children_ids {
            let child = groups.iter().find(|g| g.id == *child_id).unwrap();
            assert_eq!(child.parent_id, Some(group.id));
        }
        for node_id in &group.node_ids_direct {
            assert!(group.node_ids_all.contains(node_id));
        }
    }
}

#[test]
fn ids_are_globally_unique_across_namespaces() {
    let graph = assembled();
    let ontology = sample_ontology();
    let (_, groups) = ground_and_group(model_id(), &graph.nodes, &ontology).unwrap();

    let mut all_ids: Vec<GlobalId> = Vec::new();
    all_ids.extend(graph.nodes.iter().map(|n| n.id));
    all_ids.extend(graph.edges.iter().map(|e| e.id));
    all_ids.extend(graph.evidences.iter().map(|e| e.id));
    all_ids.extend(graph.docs.iter().map(|d| d.id));
    all_ids.extend(groups.iter().map(|g| g.id));

    let mut deduped = all_ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), all_ids.len());
}

// ============================================================================
// Degenerate inputs
// ============================================================================

#[test]
fn empty_model_grounds_against_empty_ontology() {
    let graph = assemble_model(model_id(), &[]).unwrap();
    assert!(graph.nodes.is_empty());

    let ontology = OntologyGraph::from_value(&json!({
        "directed": true, "nodes": [], "links": [],
    }))
    .unwrap();
    let (atts, groups) = ground_and_group(model_id(), &graph.nodes, &ontology).unwrap();
    assert!(atts.is_empty());
    assert!(groups.is_empty());
}

#[test]
fn populated_model_against_empty_ontology_is_all_ungrounded() {
    let graph = assembled();
    let ontology = OntologyGraph::from_value(&json!({
        "directed": true, "nodes": [], "links": [],
    }))
    .unwrap();
    let (atts, groups) = ground_and_group(model_id(), &graph.nodes, &ontology).unwrap();

    assert!(atts.iter().all(|att| !att.grounded_group));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id_onto, NOT_GROUNDED_REF);
    assert_eq!(groups[0].node_ids_all.len(), graph.nodes.len());
}
