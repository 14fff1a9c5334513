//! Group hierarchy synthesis.
//!
//! Every distinct term appearing in any node's canonicalized ancestry path
//! (including the synthetic `not-grounded` term) becomes one group. Group
//! ids are assigned by descending occurrence count (ascending term as the
//! deterministic tie-break); this is an allocation order, not a meaningful
//! ranking.

use ahash::AHashMap;
use biograph_ident::{EntityKind, GlobalId, IdSequence};
use biograph_model::{Group, NodeAttribute};

use crate::graph::{OntologyError, OntologyGraph};

/// Synthesize the group hierarchy from canonicalized ancestry paths and
/// backfill each node attribute's `group_ids`.
pub fn synthesize_groups(
    model_id: GlobalId,
    atts: &mut [NodeAttribute],
    ontology: &OntologyGraph,
) -> Result<Vec<Group>, OntologyError> {
    // Occurrence count per term over the multiset of all path elements.
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for att in atts.iter() {
        for term in &att.group_refs {
            *counts.entry(term.clone()).or_default() += 1;
        }
    }

    let mut ordered_terms: Vec<(String, usize)> = counts.into_iter().collect();
    ordered_terms.sort_by(|(term_a, count_a), (term_b, count_b)| {
        count_b.cmp(count_a).then_with(|| term_a.cmp(term_b))
    });
    let ordered_terms: Vec<String> = ordered_terms.into_iter().map(|(term, _)| term).collect();

    let mut seq = IdSequence::new(EntityKind::Group);
    let mut id_by_term: AHashMap<String, GlobalId> = AHashMap::new();
    for term in &ordered_terms {
        id_by_term.insert(term.clone(), seq.next_id()?);
    }

    // Smallest depth per term, and each term's parent from the first path
    // (in input order) that contains it.
    let mut level_by_term: AHashMap<String, usize> = AHashMap::new();
    let mut parent_by_term: AHashMap<String, Option<String>> = AHashMap::new();
    for att in atts.iter() {
        for (depth, term) in att.group_refs.iter().enumerate() {
            let level = level_by_term.entry(term.clone()).or_insert(depth);
            *level = (*level).min(depth);
            parent_by_term.entry(term.clone()).or_insert_with(|| {
                let first = att
                    .group_refs
                    .iter()
                    .position(|t| t == term)
                    .expect("term taken from this path");
                (first > 0).then(|| att.group_refs[first - 1].clone())
            });
        }
    }

    // Invert parents into children, in group id order.
    let mut children_by_term: AHashMap<String, Vec<GlobalId>> = AHashMap::new();
    for term in &ordered_terms {
        if let Some(Some(parent)) = parent_by_term.get(term) {
            children_by_term
                .entry(parent.clone())
                .or_default()
                .push(id_by_term[term]);
        }
    }

    // Membership, in node input order.
    let mut all_by_term: AHashMap<String, Vec<GlobalId>> = AHashMap::new();
    let mut direct_by_term: AHashMap<String, Vec<GlobalId>> = AHashMap::new();
    for att in atts.iter() {
        for term in &ordered_terms {
            if att.group_refs.iter().any(|t| t == term) {
                all_by_term
                    .entry(term.clone())
                    .or_default()
                    .push(att.node_id);
            }
        }
        if let Some(last) = att.group_refs.last() {
            direct_by_term
                .entry(last.clone())
                .or_default()
                .push(att.node_id);
        }
    }

    let groups = ordered_terms
        .iter()
        .map(|term| Group {
            id: id_by_term[term],
            id_onto: term.clone(),
            name: ontology
                .label(term)
                .map(str::to_string)
                .unwrap_or_else(|| term.clone()),
            level: level_by_term[term],
            parent_id: parent_by_term[term]
                .as_deref()
                .map(|parent| id_by_term[parent]),
            children_ids: children_by_term.remove(term).unwrap_or_default(),
            model_id,
            node_ids_all: all_by_term.remove(term).unwrap_or_default(),
            node_ids_direct: direct_by_term.remove(term).unwrap_or_default(),
        })
        .collect();

    for att in atts.iter_mut() {
        att.group_ids = att
            .group_refs
            .iter()
            .map(|term| id_by_term[term])
            .collect();
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biograph_model::records::NOT_GROUNDED_REF;
    use biograph_model::GroundingOutcome;
    use serde_json::json;

    fn att(local: u32, refs: &[&str]) -> NodeAttribute {
        NodeAttribute {
            node_id: GlobalId::encode(local, EntityKind::Node).unwrap(),
            db_ref_priority: refs.last().map(|term| term.to_string()),
            grounded_group: refs != [NOT_GROUNDED_REF],
            node_type: refs.first().map(|term| term.to_string()),
            group_ids: Vec::new(),
            group_refs: refs.iter().map(|term| term.to_string()).collect(),
            node_group_level: refs.len(),
            outcome: GroundingOutcome::AncestorPath,
        }
    }

    fn model_id() -> GlobalId {
        GlobalId::encode(0, EntityKind::Model).unwrap()
    }

    fn labeled_ontology() -> OntologyGraph {
        OntologyGraph::from_value(&json!({
            "directed": true,
            "nodes": [
                {"id": "X:R", "name": "receptors"},
                {"id": "X:B"},
                {"id": "X:A", "name": ""},
            ],
            "links": [],
        }))
        .unwrap()
    }

    #[test]
    fn one_group_per_distinct_term_with_count_ordering() {
        let mut atts = vec![
            att(0, &["X:R", "X:B", "X:A"]),
            att(1, &["X:R", "X:B"]),
            att(2, &[NOT_GROUNDED_REF]),
        ];
        let groups = synthesize_groups(model_id(), &mut atts, &labeled_ontology()).unwrap();

        assert_eq!(groups.len(), 4);
        // X:R and X:B both occur twice; the term string breaks the tie.
        assert_eq!(groups[0].id_onto, "X:B");
        assert_eq!(groups[1].id_onto, "X:R");
        assert_eq!(groups[0].id.kind(), Some(EntityKind::Group));
    }

    #[test]
    fn labels_fall_back_to_the_raw_term() {
        let mut atts = vec![att(0, &["X:R", "X:B", "X:A"]), att(1, &[NOT_GROUNDED_REF])];
        let groups = synthesize_groups(model_id(), &mut atts, &labeled_ontology()).unwrap();

        let by_term: AHashMap<&str, &Group> =
            groups.iter().map(|g| (g.id_onto.as_str(), g)).collect();
        assert_eq!(by_term["X:R"].name, "receptors");
        // Missing and empty ontology labels both fall back.
        assert_eq!(by_term["X:B"].name, "X:B");
        assert_eq!(by_term["X:A"].name, "X:A");
        assert_eq!(by_term[NOT_GROUNDED_REF].name, NOT_GROUNDED_REF);
    }

    #[test]
    fn parent_child_links_are_mutual_inverses() {
        let mut atts = vec![
            att(0, &["X:R", "X:B", "X:A"]),
            att(1, &["X:R", "X:C"]),
            att(2, &[NOT_GROUNDED_REF]),
        ];
        let groups = synthesize_groups(model_id(), &mut atts, &labeled_ontology()).unwrap();
        let by_id: AHashMap<GlobalId, &Group> = groups.iter().map(|g| (g.id, g)).collect();

        for group in &groups {
            match group.parent_id {
                Some(parent_id) => {
                    assert!(by_id[&parent_id].children_ids.contains(&group.id));
                }
                None => {
                    assert_eq!(group.level, 0);
                }
            }
            for child_id in &group.children_ids {
                assert_eq!(by_id[child_id].parent_id, Some(group.id));
            }
        }

        // No cycles in the parent chain.
        for group in &groups {
            let mut hops = 0;
            let mut cursor = group.parent_id;
            while let Some(parent_id) = cursor {
                cursor = by_id[&parent_id].parent_id;
                hops += 1;
                assert!(hops <= groups.len(), "cycle in parent chain");
            }
        }
    }

    #[test]
    fn levels_are_the_smallest_observed_depth() {
        let mut atts = vec![att(0, &["X:R", "X:B"]), att(1, &["X:B", "X:A"])];
        let groups = synthesize_groups(model_id(), &mut atts, &labeled_ontology()).unwrap();
        let by_term: AHashMap<&str, &Group> =
            groups.iter().map(|g| (g.id_onto.as_str(), g)).collect();

        assert_eq!(by_term["X:R"].level, 0);
        // X:B appears at depth 1 and depth 0; the smaller wins.
        assert_eq!(by_term["X:B"].level, 0);
        assert_eq!(by_term["X:A"].level, 1);
    }

    #[test]
    fn membership_is_direct_subset_of_all() {
        let mut atts = vec![
            att(0, &["X:R", "X:B", "X:A"]),
            att(1, &["X:R", "X:B"]),
            att(2, &["X:R"]),
        ];
        let groups = synthesize_groups(model_id(), &mut atts, &labeled_ontology()).unwrap();
        let by_term: AHashMap<&str, &Group> =
            groups.iter().map(|g| (g.id_onto.as_str(), g)).collect();

        let r = by_term["X:R"];
        assert_eq!(r.node_ids_all.len(), 3);
        assert_eq!(r.node_ids_direct, vec![atts[2].node_id]);

        let b = by_term["X:B"];
        assert_eq!(b.node_ids_all.len(), 2);
        assert_eq!(b.node_ids_direct, vec![atts[1].node_id]);

        for group in &groups {
            for node_id in &group.node_ids_direct {
                assert!(group.node_ids_all.contains(node_id));
            }
        }
    }

    #[test]
    fn group_ids_backfill_onto_node_attributes() {
        let mut atts = vec![att(0, &["X:R", "X:B"])];
        let groups = synthesize_groups(model_id(), &mut atts, &labeled_ontology()).unwrap();
        let by_term: AHashMap<&str, &Group> =
            groups.iter().map(|g| (g.id_onto.as_str(), g)).collect();

        assert_eq!(
            atts[0].group_ids,
            vec![by_term["X:R"].id, by_term["X:B"].id]
        );
    }
}
