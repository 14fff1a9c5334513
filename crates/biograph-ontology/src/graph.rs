//! Ontology graph (node-link form).
//!
//! The ontology arrives as a directed node-link structure:
//! `{directed: true, nodes: [{id, name?}], links: [{source, target, type}]}`.
//! Links of type `xref` are cross-references, not hierarchy, and are
//! discarded before use. Terms are interned to dense `u32` indices; all
//! traversal happens over the compact adjacency lists.

use ahash::AHashMap;
use serde_json::Value;

/// Structural problems with an input ontology. Fatal to the grounding stage
/// for the affected model only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OntologyError {
    #[error("ontology is not a JSON object")]
    NotAnObject,

    #[error("ontology is missing required member `{0}`")]
    MissingMember(&'static str),

    #[error("ontology must be a directed graph")]
    NotDirected,

    #[error("ontology node at index {index} has no `id`")]
    NodeWithoutId { index: usize },

    #[error("ontology link at index {index} is malformed")]
    MalformedLink { index: usize },

    #[error(transparent)]
    Identifier(#[from] biograph_ident::IdError),
}

/// One interned ontology term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyTerm {
    /// `namespace:local_id` identifier.
    pub id: String,
    /// Human-readable label, if the ontology provides a non-empty one.
    pub name: Option<String>,
}

/// A parsed ontology: interned terms plus narrower→broader adjacency.
#[derive(Debug, Clone, Default)]
pub struct OntologyGraph {
    terms: Vec<OntologyTerm>,
    index: AHashMap<String, u32>,
    out: Vec<Vec<u32>>,
}

impl OntologyGraph {
    /// Parse a node-link ontology, discarding `xref` links.
    ///
    /// Link endpoints naming unknown terms are interned implicitly, the way
    /// node-link readers conventionally behave.
    pub fn from_value(value: &Value) -> Result<Self, OntologyError> {
        let obj = value.as_object().ok_or(OntologyError::NotAnObject)?;

        let directed = obj
            .get("directed")
            .ok_or(OntologyError::MissingMember("directed"))?;
        if directed.as_bool() != Some(true) {
            return Err(OntologyError::NotDirected);
        }
        let nodes = obj
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or(OntologyError::MissingMember("nodes"))?;
        let links = obj
            .get("links")
            .and_then(Value::as_array)
            .ok_or(OntologyError::MissingMember("links"))?;

        let mut graph = OntologyGraph::default();

        for (index, node) in nodes.iter().enumerate() {
            let id = node
                .get("id")
                .and_then(Value::as_str)
                .ok_or(OntologyError::NodeWithoutId { index })?;
            let term_index = graph.intern(id);
            let name = node
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty());
            if let Some(name) = name {
                graph.terms[term_index as usize].name = Some(name.to_string());
            }
        }

        let mut dropped_xrefs = 0usize;
        for (index, link) in links.iter().enumerate() {
            if link.get("type").and_then(Value::as_str) == Some("xref") {
                dropped_xrefs += 1;
                continue;
            }
            let source = link
                .get("source")
                .and_then(Value::as_str)
                .ok_or(OntologyError::MalformedLink { index })?;
            let target = link
                .get("target")
                .and_then(Value::as_str)
                .ok_or(OntologyError::MalformedLink { index })?;
            let source = graph.intern(source);
            let target = graph.intern(target);
            graph.out[source as usize].push(target);
        }

        if dropped_xrefs > 0 {
            tracing::debug!(dropped_xrefs, "discarded xref links from ontology");
        }

        Ok(graph)
    }

    fn intern(&mut self, id: &str) -> u32 {
        if let Some(index) = self.index.get(id) {
            return *index;
        }
        let index = self.terms.len() as u32;
        self.terms.push(OntologyTerm {
            id: id.to_string(),
            name: None,
        });
        self.out.push(Vec::new());
        self.index.insert(id.to_string(), index);
        index
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn index_of(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    pub fn term(&self, index: u32) -> &OntologyTerm {
        &self.terms[index as usize]
    }

    /// Human-readable label for a term id, if present and non-empty.
    pub fn label(&self, term: &str) -> Option<&str> {
        self.index_of(term)
            .and_then(|index| self.terms[index as usize].name.as_deref())
    }

    /// All term ids, in interning order.
    pub fn term_ids(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|term| term.id.as_str())
    }

    /// Broader terms immediately reachable from `index`.
    pub fn broader(&self, index: u32) -> &[u32] {
        &self.out[index as usize]
    }

    pub fn out_degree(&self, index: u32) -> usize {
        self.out[index as usize].len()
    }

    /// A term with no broader term is a root of its component.
    pub fn is_root(&self, index: u32) -> bool {
        self.out[index as usize].is_empty()
    }
}
