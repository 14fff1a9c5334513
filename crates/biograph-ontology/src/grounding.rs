//! Per-node ancestry resolution.
//!
//! For each node the resolver takes the highest-priority database reference
//! and, when it exists in the ontology, walks narrower→broader edges to the
//! nearest root by edge count. Equal-length paths are disambiguated
//! arbitrarily by traversal order; the lineage canonicalization pass at the
//! end is what actually guarantees that nodes sharing an ancestor at a depth
//! carry identical prefixes.

use ahash::AHashMap;
use biograph_model::records::NOT_GROUNDED_REF;
use biograph_model::{GroundingOutcome, Node, NodeAttribute};
use std::collections::VecDeque;

use crate::graph::OntologyGraph;

/// Weakly-connected components of the ontology, ordered by descending size
/// (stable tie-break on smallest member index).
pub(crate) struct ComponentIndex {
    component_of: Vec<usize>,
    members: Vec<Vec<u32>>,
    roots: Vec<Vec<u32>>,
}

impl ComponentIndex {
    pub(crate) fn build(graph: &OntologyGraph) -> ComponentIndex {
        let n = graph.term_count();
        let mut parent: Vec<u32> = (0..n as u32).collect();

        fn find(parent: &mut [u32], x: u32) -> u32 {
            let mut root = x;
            while parent[root as usize] != root {
                root = parent[root as usize];
            }
            // Path compression.
            let mut cur = x;
            while parent[cur as usize] != root {
                let next = parent[cur as usize];
                parent[cur as usize] = root;
                cur = next;
            }
            root
        }

        for term in 0..n as u32 {
            for &broader in graph.broader(term) {
                let a = find(&mut parent, term);
                let b = find(&mut parent, broader);
                if a != b {
                    parent[b as usize] = a;
                }
            }
        }

        // Group members per representative, keeping term order within each
        // component.
        let mut by_rep: AHashMap<u32, Vec<u32>> = AHashMap::new();
        let mut rep_order: Vec<u32> = Vec::new();
        for term in 0..n as u32 {
            let rep = find(&mut parent, term);
            by_rep
                .entry(rep)
                .or_insert_with(|| {
                    rep_order.push(rep);
                    Vec::new()
                })
                .push(term);
        }

        let mut members: Vec<Vec<u32>> = rep_order
            .into_iter()
            .map(|rep| by_rep.remove(&rep).expect("grouped above"))
            .collect();
        members.sort_by_key(|component| std::cmp::Reverse(component.len()));

        let mut component_of = vec![0usize; n];
        for (comp, component) in members.iter().enumerate() {
            for &term in component {
                component_of[term as usize] = comp;
            }
        }

        let roots = members
            .iter()
            .map(|component| {
                component
                    .iter()
                    .copied()
                    .filter(|&term| graph.is_root(term))
                    .collect()
            })
            .collect();

        ComponentIndex {
            component_of,
            members,
            roots,
        }
    }

    pub(crate) fn component_of(&self, term: u32) -> usize {
        self.component_of[term as usize]
    }

    pub(crate) fn size(&self, comp: usize) -> usize {
        self.members[comp].len()
    }

    pub(crate) fn roots(&self, comp: usize) -> &[u32] {
        &self.roots[comp]
    }

    pub(crate) fn component_count(&self) -> usize {
        self.members.len()
    }
}

/// Presence check: mark each node grounded or not, seeding ungrounded nodes
/// with the synthetic length-1 ancestry.
pub fn ground_nodes(nodes: &[Node], ontology: &OntologyGraph) -> Vec<NodeAttribute> {
    nodes
        .iter()
        .map(|node| {
            let db_ref_priority = node.db_ids.first().map(|db_ref| db_ref.curie());
            let grounded = db_ref_priority
                .as_deref()
                .is_some_and(|term| ontology.contains(term));

            if grounded {
                NodeAttribute {
                    node_id: node.id,
                    db_ref_priority,
                    grounded_group: true,
                    node_type: None,
                    group_ids: Vec::new(),
                    group_refs: Vec::new(),
                    node_group_level: 0,
                    outcome: GroundingOutcome::AncestorPath,
                }
            } else {
                NodeAttribute {
                    node_id: node.id,
                    db_ref_priority,
                    grounded_group: false,
                    node_type: None,
                    group_ids: Vec::new(),
                    group_refs: vec![NOT_GROUNDED_REF.to_string()],
                    node_group_level: 1,
                    outcome: GroundingOutcome::Ungrounded,
                }
            }
        })
        .collect()
}

/// Resolve each grounded node's ancestry, canonicalize lineages, and assign
/// node types.
pub fn compute_ancestry(atts: &mut [NodeAttribute], ontology: &OntologyGraph) {
    let components = ComponentIndex::build(ontology);
    tracing::debug!(
        components = components.component_count(),
        terms = ontology.term_count(),
        "resolving ancestry against ontology"
    );

    for att in atts.iter_mut() {
        if !att.grounded_group {
            continue;
        }
        let term = att
            .db_ref_priority
            .as_deref()
            .expect("grounded nodes carry a priority reference");
        let index = ontology
            .index_of(term)
            .expect("grounded nodes exist in the ontology");
        let comp = components.component_of(index);

        let (refs, outcome) = if components.size(comp) == 1 {
            (vec![term.to_string()], GroundingOutcome::TrivialComponent)
        } else if ontology.is_root(index) {
            (vec![term.to_string()], GroundingOutcome::ComponentRoot)
        } else {
            match shortest_root_path(ontology, index, components.roots(comp)) {
                Some(path) => {
                    let refs = path
                        .into_iter()
                        .map(|i| ontology.term(i).id.clone())
                        .collect();
                    (refs, GroundingOutcome::AncestorPath)
                }
                None => {
                    // Distinct from the trivial/root cases: the term sits in
                    // a non-trivial component whose every root is
                    // unreachable from it.
                    tracing::debug!(term, "no ancestor root reachable");
                    (vec![term.to_string()], GroundingOutcome::NoRootReachable)
                }
            }
        };

        att.node_group_level = refs.len();
        att.group_refs = refs;
        att.outcome = outcome;
    }

    canonicalize_lineages(atts);

    for att in atts.iter_mut() {
        att.node_type = att.group_refs.first().cloned();
    }
}

/// BFS over narrower→broader edges; among all roots reached, the minimum
/// distance wins, ties broken by root order. Returns the path ancestor-first
/// (root ... start), or `None` when no root is reachable.
fn shortest_root_path(graph: &OntologyGraph, start: u32, roots: &[u32]) -> Option<Vec<u32>> {
    let mut parent: AHashMap<u32, u32> = AHashMap::new();
    let mut dist: AHashMap<u32, usize> = AHashMap::new();
    let mut queue = VecDeque::new();

    dist.insert(start, 0);
    queue.push_back(start);
    while let Some(term) = queue.pop_front() {
        let d = dist[&term];
        for &broader in graph.broader(term) {
            if !dist.contains_key(&broader) {
                dist.insert(broader, d + 1);
                parent.insert(broader, term);
                queue.push_back(broader);
            }
        }
    }

    let target = roots
        .iter()
        .copied()
        .filter(|root| dist.contains_key(root))
        .min_by_key(|root| dist[root])?;

    let mut path = vec![target];
    let mut cur = target;
    while cur != start {
        cur = parent[&cur];
        path.push(cur);
    }
    // Built root→start already: parent chase walks back toward the start,
    // so `path` reads ancestor-first as required.
    Some(path)
}

/// Enforce hierarchy consistency: for every depth, all paths carrying the
/// same term at that depth are rewritten to share the prefix of the first
/// such path (in input order).
fn canonicalize_lineages(atts: &mut [NodeAttribute]) {
    let max_len = atts
        .iter()
        .map(|att| att.group_refs.len())
        .max()
        .unwrap_or(0);

    for depth in 1..max_len {
        let mut canonical: AHashMap<String, Vec<String>> = AHashMap::new();
        for att in atts.iter() {
            if att.group_refs.len() > depth {
                canonical
                    .entry(att.group_refs[depth].clone())
                    .or_insert_with(|| att.group_refs[..depth].to_vec());
            }
        }
        for att in atts.iter_mut() {
            if att.group_refs.len() > depth {
                let prefix = &canonical[&att.group_refs[depth]];
                att.group_refs[..depth].clone_from_slice(prefix);
            }
        }
    }
}
