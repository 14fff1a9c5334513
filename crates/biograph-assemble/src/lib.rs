//! Statement-to-graph assembly.
//!
//! Converts one model's raw statements into the canonical graph collections:
//! directed edges (one, two, or `k(k-1)` per statement depending on its role
//! pattern), evidences deduplicated by `source_hash`, docs deduplicated by
//! structural `text_refs` identity, and nodes keyed by entity name.
//!
//! Malformed or unmatched statements are skipped and counted, never fatal:
//! the only hard failure here is exhausting an id namespace.
//!
//! The post-assembly passes live in sibling modules:
//! [`namespaces`] (grounding priority order), [`paths`] (test-path
//! resolution and edge test status), and [`curation`] (edge curation
//! status).

pub mod curation;
pub mod namespaces;
pub mod paths;

use ahash::AHashMap;
use biograph_ident::{EntityKind, GlobalId, IdError, IdSequence};
use biograph_model::digest::value_digest_v1;
use biograph_model::{
    Agent, CurationStatus, DbRef, Doc, DocIdentifier, Edge, Evidence, Node, Statement,
    StatementShape,
};
use serde::Serialize;
use serde_json::Value;

/// Pseudo-namespaces holding raw reader text rather than database ids;
/// excluded from grounding.
pub const TEXT_NAMESPACES: [&str; 2] = ["TEXT", "TEXT_NORM"];

/// Relation kinds whose subject→object edge carries positive polarity.
const POSITIVE_STATEMENT_TYPES: [&str; 2] = ["Activation", "IncreaseAmount"];

/// Assembly failures. Per-statement problems are counted in
/// [`AssemblyReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error(transparent)]
    Id(#[from] IdError),
}

/// Skip-and-continue accounting for one model's assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub statements_total: usize,
    pub statements_matched: usize,
    /// Statements matching no role pattern.
    pub skipped_unmatched: usize,
    /// Statements matching a pattern but missing a required sub-field.
    pub skipped_malformed: usize,
}

/// The canonical graph collections for one model.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub evidences: Vec<Evidence>,
    pub docs: Vec<Doc>,
    pub report: AssemblyReport,
}

/// A directed edge before node-id resolution.
struct EdgeDraft {
    id: GlobalId,
    statement_id: String,
    statement_type: String,
    belief: f64,
    polarity: Option<bool>,
    source: Agent,
    target: Agent,
}

/// Assemble one model's statements into its graph collections.
///
/// An empty statement list yields empty collections, not an error.
pub fn assemble_model(model_id: GlobalId, raw_statements: &[Value]) -> Result<ModelGraph, AssembleError> {
    let mut report = AssemblyReport {
        statements_total: raw_statements.len(),
        ..AssemblyReport::default()
    };

    let mut statements = Vec::with_capacity(raw_statements.len());
    for raw in raw_statements {
        match Statement::from_value(raw) {
            Ok(Some(statement)) => {
                report.statements_matched += 1;
                statements.push(statement);
            }
            Ok(None) => {
                report.skipped_unmatched += 1;
                tracing::debug!("statement matches no role pattern, dropping");
            }
            Err(err) => {
                report.skipped_malformed += 1;
                tracing::warn!(%err, "skipping malformed statement");
            }
        }
    }

    let drafts = draft_edges(&statements)?;

    // statement id -> ids of the edges it produced
    let mut edges_by_statement: AHashMap<&str, Vec<GlobalId>> = AHashMap::new();
    for draft in &drafts {
        edges_by_statement
            .entry(draft.statement_id.as_str())
            .or_default()
            .push(draft.id);
    }

    let evidences = dedup_evidences(model_id, &statements, &edges_by_statement)?;

    // edge id -> evidence ids
    let mut evidence_ids_by_edge: AHashMap<GlobalId, Vec<GlobalId>> = AHashMap::new();
    for evidence in &evidences {
        for edge_id in &evidence.edge_ids {
            evidence_ids_by_edge
                .entry(*edge_id)
                .or_default()
                .push(evidence.id);
        }
    }

    let (docs, doc_ids_by_evidence) = dedup_docs(model_id, &evidences)?;
    let evidences = backfill_evidence_docs(evidences, &doc_ids_by_evidence);

    // edge id -> doc ids
    let mut doc_ids_by_edge: AHashMap<GlobalId, Vec<GlobalId>> = AHashMap::new();
    for doc in &docs {
        for edge_id in &doc.edge_ids {
            doc_ids_by_edge.entry(*edge_id).or_default().push(doc.id);
        }
    }

    let nodes = extract_nodes(model_id, &drafts)?;
    let node_id_by_name: AHashMap<&str, GlobalId> =
        nodes.iter().map(|node| (node.name.as_str(), node.id)).collect();

    let edges = drafts
        .into_iter()
        .map(|draft| {
            // Every draft endpoint was registered during node extraction.
            let source_node_id = node_id_by_name[draft.source.name.as_str()];
            let target_node_id = node_id_by_name[draft.target.name.as_str()];
            Edge {
                id: draft.id,
                model_id,
                evidence_ids: evidence_ids_by_edge.remove(&draft.id).unwrap_or_default(),
                doc_ids: doc_ids_by_edge.remove(&draft.id).unwrap_or_default(),
                statement_id: draft.statement_id,
                statement_type: draft.statement_type,
                belief: draft.belief,
                source_node_id,
                target_node_id,
                tested: false,
                test_path_ids: Vec::new(),
                curated: CurationStatus::Uncurated,
                directed: true,
                polarity: draft.polarity,
            }
        })
        .collect();

    Ok(ModelGraph {
        nodes,
        edges,
        evidences,
        docs,
        report,
    })
}

/// Emit edge drafts per statement shape and assign edge ids in emission
/// order.
fn draft_edges(statements: &[Statement]) -> Result<Vec<EdgeDraft>, AssembleError> {
    let mut seq = IdSequence::new(EntityKind::Edge);
    let mut drafts = Vec::new();

    for statement in statements {
        let mut pairs: Vec<(&Agent, &Agent, Option<bool>)> = Vec::new();
        match &statement.shape {
            StatementShape::SubjectObject { subject, object } => {
                let positive = POSITIVE_STATEMENT_TYPES
                    .contains(&statement.statement_type.as_str());
                pairs.push((subject, object, Some(positive)));
            }
            StatementShape::EnzymeSubstrate { enzyme, substrate } => {
                pairs.push((enzyme, substrate, None));
            }
            StatementShape::GefRasLike { gef, ras } => {
                pairs.push((gef, ras, None));
            }
            StatementShape::GapRasLike { gap, ras } => {
                pairs.push((gap, ras, None));
            }
            StatementShape::Conversion {
                subject,
                object_from,
                object_to,
            } => {
                pairs.push((subject, object_from, Some(false)));
                pairs.push((subject, object_to, Some(true)));
            }
            StatementShape::Members { members } => {
                // Symmetric relation approximated as bidirectional: all
                // k(k-1) ordered pairs.
                for (i, source) in members.iter().enumerate() {
                    for (j, target) in members.iter().enumerate() {
                        if i != j {
                            pairs.push((source, target, None));
                        }
                    }
                }
            }
        }

        for (source, target, polarity) in pairs {
            drafts.push(EdgeDraft {
                id: seq.next_id()?,
                statement_id: statement.matches_hash.clone(),
                statement_type: statement.statement_type.clone(),
                belief: statement.belief,
                polarity,
                source: source.clone(),
                target: target.clone(),
            });
        }
    }

    Ok(drafts)
}

/// Deduplicate evidentiary records by `source_hash`, keeping first-seen
/// text/text_refs and aggregating referencing statement and edge ids.
fn dedup_evidences(
    model_id: GlobalId,
    statements: &[Statement],
    edges_by_statement: &AHashMap<&str, Vec<GlobalId>>,
) -> Result<Vec<Evidence>, AssembleError> {
    struct Accum {
        text: Option<String>,
        text_refs: Option<Value>,
        statement_ids: Vec<String>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut by_hash: AHashMap<String, Accum> = AHashMap::new();

    for statement in statements {
        for raw in &statement.evidence {
            let accum = by_hash.entry(raw.source_hash.clone()).or_insert_with(|| {
                order.push(raw.source_hash.clone());
                Accum {
                    text: raw.text.clone(),
                    text_refs: raw.text_refs.clone(),
                    statement_ids: Vec::new(),
                }
            });
            if !accum.statement_ids.contains(&statement.matches_hash) {
                accum.statement_ids.push(statement.matches_hash.clone());
            }
        }
    }

    let mut seq = IdSequence::new(EntityKind::Evidence);
    let mut evidences = Vec::with_capacity(order.len());
    for source_hash in order {
        let accum = by_hash.remove(&source_hash).expect("accumulated above");
        let edge_ids = dedup_preserving_order(
            accum
                .statement_ids
                .iter()
                .flat_map(|sid| edges_by_statement.get(sid.as_str()).into_iter().flatten())
                .copied(),
        );
        evidences.push(Evidence {
            id: seq.next_id()?,
            model_id,
            text: accum.text,
            text_refs: accum.text_refs,
            source_hash,
            statement_ids: accum.statement_ids,
            edge_ids,
            doc_ids: Vec::new(),
        });
    }

    Ok(evidences)
}

/// Group evidences by structural `text_refs` identity; one doc per group.
///
/// Returns the docs plus the evidence-id → doc-id assignment used to
/// backfill [`Evidence::doc_ids`].
fn dedup_docs(
    model_id: GlobalId,
    evidences: &[Evidence],
) -> Result<(Vec<Doc>, AHashMap<GlobalId, GlobalId>), AssembleError> {
    struct Accum {
        text_refs: Value,
        evidence_ids: Vec<GlobalId>,
        edge_ids: Vec<GlobalId>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut by_key: AHashMap<String, Accum> = AHashMap::new();

    for evidence in evidences {
        let Some(text_refs) = &evidence.text_refs else {
            continue;
        };
        if !text_refs.is_object() {
            tracing::debug!(
                source_hash = %evidence.source_hash,
                "evidence text_refs is not an object, no doc emitted"
            );
            continue;
        }

        let key = value_digest_v1(text_refs);
        let accum = by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Accum {
                text_refs: text_refs.clone(),
                evidence_ids: Vec::new(),
                edge_ids: Vec::new(),
            }
        });
        accum.evidence_ids.push(evidence.id);
        accum.edge_ids.extend(evidence.edge_ids.iter().copied());
    }

    let mut seq = IdSequence::new(EntityKind::Doc);
    let mut docs = Vec::with_capacity(order.len());
    let mut doc_ids_by_evidence = AHashMap::new();

    for key in order {
        let accum = by_key.remove(&key).expect("accumulated above");
        let id = seq.next_id()?;
        for evidence_id in &accum.evidence_ids {
            doc_ids_by_evidence.insert(*evidence_id, id);
        }
        let identifier = accum
            .text_refs
            .as_object()
            .expect("only object text_refs accumulate")
            .iter()
            .map(|(k, v)| DocIdentifier {
                id_type: k.to_lowercase(),
                id: v.clone(),
            })
            .collect();
        docs.push(Doc {
            id,
            model_id,
            evidence_ids: accum.evidence_ids,
            edge_ids: dedup_preserving_order(accum.edge_ids.into_iter()),
            identifier,
        });
    }

    Ok((docs, doc_ids_by_evidence))
}

fn backfill_evidence_docs(
    evidences: Vec<Evidence>,
    doc_ids_by_evidence: &AHashMap<GlobalId, GlobalId>,
) -> Vec<Evidence> {
    evidences
        .into_iter()
        .map(|mut evidence| {
            evidence.doc_ids = doc_ids_by_evidence
                .get(&evidence.id)
                .map(|doc_id| vec![*doc_id])
                .unwrap_or_default();
            evidence
        })
        .collect()
}

/// Extract one node per distinct entity name: source names in edge order
/// first, then target names not already seen. A name's `db_refs` come from
/// the last edge that mentions it.
fn extract_nodes(model_id: GlobalId, drafts: &[EdgeDraft]) -> Result<Vec<Node>, AssembleError> {
    #[derive(Default)]
    struct Accum<'a> {
        db_refs: Option<&'a Agent>,
        edge_ids_source: Vec<GlobalId>,
        edge_ids_target: Vec<GlobalId>,
    }

    let mut order: Vec<&str> = Vec::new();
    let mut by_name: AHashMap<&str, Accum<'_>> = AHashMap::new();

    for draft in drafts {
        let name = draft.source.name.as_str();
        if !by_name.contains_key(name) {
            order.push(name);
            by_name.insert(name, Accum::default());
        }
    }
    for draft in drafts {
        let name = draft.target.name.as_str();
        if !by_name.contains_key(name) {
            order.push(name);
            by_name.insert(name, Accum::default());
        }
    }

    for draft in drafts {
        let source = by_name
            .get_mut(draft.source.name.as_str())
            .expect("registered above");
        source.db_refs = Some(&draft.source);
        source.edge_ids_source.push(draft.id);

        let target = by_name
            .get_mut(draft.target.name.as_str())
            .expect("registered above");
        target.db_refs = Some(&draft.target);
        target.edge_ids_target.push(draft.id);
    }

    let mut seq = IdSequence::new(EntityKind::Node);
    let mut nodes = Vec::with_capacity(order.len());
    for name in order {
        let accum = by_name.remove(name).expect("registered above");
        let db_ids: Vec<DbRef> = accum
            .db_refs
            .map(|agent| {
                agent
                    .db_refs
                    .iter()
                    .filter(|(namespace, _)| {
                        !TEXT_NAMESPACES.contains(&namespace.as_str())
                    })
                    .map(|(namespace, id)| DbRef {
                        namespace: namespace.clone(),
                        id: id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        nodes.push(Node {
            id: seq.next_id()?,
            model_id,
            name: name.to_string(),
            grounded_db: !db_ids.is_empty(),
            db_ids,
            in_degree: accum.edge_ids_target.len(),
            out_degree: accum.edge_ids_source.len(),
            edge_ids_source: accum.edge_ids_source,
            edge_ids_target: accum.edge_ids_target,
        });
    }

    Ok(nodes)
}

fn dedup_preserving_order(ids: impl Iterator<Item = GlobalId>) -> Vec<GlobalId> {
    let mut seen = ahash::AHashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
