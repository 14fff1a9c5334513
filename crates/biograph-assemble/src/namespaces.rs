//! Grounding namespace ordering.
//!
//! Each node's external references must be sorted by a single model-wide
//! namespace priority before grounding picks the head reference. The order
//! is: the externally supplied priority list, then the model's remaining
//! namespaces (sorted), then the ontology's remaining namespaces (sorted),
//! so every namespace appearing anywhere in the model or the ontology has a
//! defined rank.

use ahash::AHashSet;
use biograph_model::{DbRef, Node};
use std::collections::BTreeSet;

/// Build the ordered namespace list for one model.
pub fn ordered_namespaces<'a>(
    priority: &[String],
    nodes: &[Node],
    ontology_terms: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let priority_set: AHashSet<&str> = priority.iter().map(String::as_str).collect();

    let model_namespaces: BTreeSet<&str> = nodes
        .iter()
        .flat_map(|node| node.db_ids.iter().map(|db_ref| db_ref.namespace.as_str()))
        .collect();

    let ontology_namespaces: BTreeSet<&str> = ontology_terms
        .into_iter()
        .filter_map(term_namespace)
        .collect();

    let mut ordered: Vec<String> = priority.to_vec();
    ordered.extend(
        model_namespaces
            .iter()
            .filter(|ns| !priority_set.contains(**ns))
            .map(|ns| ns.to_string()),
    );
    ordered.extend(
        ontology_namespaces
            .iter()
            .filter(|ns| !priority_set.contains(**ns) && !model_namespaces.contains(**ns))
            .map(|ns| ns.to_string()),
    );
    ordered
}

/// Namespace token of a `namespace:local_id` ontology term.
pub fn term_namespace(term: &str) -> Option<&str> {
    match term.split_once(':') {
        Some((namespace, _)) if !namespace.is_empty() => Some(namespace),
        _ => None,
    }
}

/// Reorder each node's `db_ids` by the ordered namespace list.
///
/// The ordered list contains every model namespace by construction, so no
/// reference is lost here.
pub fn sort_node_groundings(nodes: &mut [Node], order: &[String]) {
    for node in nodes {
        let mut remaining: Vec<Option<DbRef>> =
            node.db_ids.drain(..).map(Some).collect();
        let mut sorted = Vec::with_capacity(remaining.len());
        for namespace in order {
            for slot in remaining.iter_mut() {
                if slot
                    .as_ref()
                    .is_some_and(|db_ref| &db_ref.namespace == namespace)
                {
                    sorted.push(slot.take().expect("checked above"));
                }
            }
        }
        // Anything the order missed keeps its original relative position.
        sorted.extend(remaining.into_iter().flatten());
        node.db_ids = sorted;
    }
}
