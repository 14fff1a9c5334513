//! The per-model pipeline and its file plumbing.
//!
//! Models are independent: each one's assemble → ground → synthesize chain
//! runs on its own rayon worker, and a structural failure in one model's
//! inputs skips that model (with its name and failing stage in the error)
//! while the others proceed.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Args;
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use biograph_assemble::curation::apply_curation;
use biograph_assemble::namespaces::{ordered_namespaces, sort_node_groundings, term_namespace};
use biograph_assemble::paths::{apply_test_status, resolve_paths};
use biograph_assemble::{assemble_model, AssemblyReport, ModelGraph};
use biograph_ident::{EntityKind, GlobalId};
use biograph_model::preamble::{project, RecordKind};
use biograph_model::{Model, TestCorpus};
use biograph_ontology::{ground_and_group, OntologyGraph};

const DEFAULT_NAMESPACE_PRIORITY: &str = "FPLX UPPRO HGNC UP CHEBI GO MESH MIRBASE DOID HP EFO";

#[derive(Debug, Args)]
pub struct AssembleArgs {
    /// Statement corpus files, one JSON array per model.
    #[arg(long = "statements", required = true, num_args = 1..)]
    pub statements: Vec<PathBuf>,

    /// Node-link ontology JSON.
    #[arg(long)]
    pub ontology: PathBuf,

    /// Space-separated namespace priority list.
    #[arg(long, default_value = DEFAULT_NAMESPACE_PRIORITY)]
    pub namespaces_priority: String,

    /// Curation export JSON files, parallel to `--statements`.
    #[arg(long = "curation", num_args = 0..)]
    pub curation: Vec<PathBuf>,

    /// Test-path export JSON files, parallel to `--statements`.
    #[arg(long = "paths", num_args = 0..)]
    pub paths: Vec<PathBuf>,

    /// Output directory; one subdirectory per model.
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Print a per-model namespace usage table.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Serialize)]
struct ModelRunSummary {
    name: String,
    model_id: GlobalId,
    nodes: usize,
    edges: usize,
    evidences: usize,
    docs: usize,
    groups: usize,
    report: AssemblyReport,
}

pub fn run(args: AssembleArgs) -> Result<()> {
    let snapshot_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let ontology_value = read_json(&args.ontology)
        .with_context(|| format!("reading ontology {}", args.ontology.display()))?;
    let ontology = OntologyGraph::from_value(&ontology_value)
        .with_context(|| format!("parsing ontology {}", args.ontology.display()))?;
    tracing::info!(terms = ontology.term_count(), "loaded ontology");

    let priority: Vec<String> = args
        .namespaces_priority
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let results: Vec<(String, Result<ModelRunSummary>)> = args
        .statements
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let name = model_name(path);
            let result = process_model(&args, index, path, &ontology, &priority, &snapshot_time);
            (name, result)
        })
        .collect();

    let mut summaries = Vec::new();
    let mut failures = 0usize;
    for (name, result) in results {
        match result {
            Ok(summary) => {
                tracing::info!(
                    model = %name,
                    nodes = summary.nodes,
                    edges = summary.edges,
                    groups = summary.groups,
                    "model assembled"
                );
                summaries.push(summary);
            }
            Err(err) => {
                failures += 1;
                tracing::error!(model = %name, error = %format!("{err:#}"), "model skipped");
            }
        }
    }

    if summaries.is_empty() {
        bail!("all {failures} model(s) failed");
    }

    write_models_file(&args.out_dir, &summaries, &snapshot_time, !args.paths.is_empty())?;

    let manifest = serde_json::json!({
        "generated_at": snapshot_time,
        "ontology_terms": ontology.term_count(),
        "models": summaries,
        "failures": failures,
    });
    fs::write(
        args.out_dir.join("run.json"),
        serde_json::to_string_pretty(&manifest)?,
    )
    .with_context(|| format!("writing manifest under {}", args.out_dir.display()))?;

    Ok(())
}

fn process_model(
    args: &AssembleArgs,
    index: usize,
    statements_path: &Path,
    ontology: &OntologyGraph,
    priority: &[String],
    snapshot_time: &str,
) -> Result<ModelRunSummary> {
    let name = model_name(statements_path);
    let model_id = GlobalId::encode(index as u32, EntityKind::Model)?;
    let model_dir = args.out_dir.join(&name);

    let raw = read_json(statements_path)
        .with_context(|| format!("model `{name}`: reading statements"))?;
    let statements: Vec<Value> = match raw {
        Value::Array(items) => items,
        _ => return Err(anyhow!("model `{name}`: statement corpus is not a JSON array")),
    };

    let mut graph = assemble_model(model_id, &statements)
        .with_context(|| format!("model `{name}`: assembling graph"))?;

    let order = ordered_namespaces(priority, &graph.nodes, ontology.term_ids());
    sort_node_groundings(&mut graph.nodes, &order);

    if let Some(curation_path) = args.curation.get(index) {
        let curation = read_json(curation_path)
            .with_context(|| format!("model `{name}`: reading curation"))?;
        apply_curation(&mut graph.edges, &curation);
    }

    if let Some(paths_path) = args.paths.get(index) {
        let raw_paths = read_json(paths_path)
            .with_context(|| format!("model `{name}`: reading test paths"))?;
        let entries: Vec<Value> = match raw_paths {
            Value::Array(items) => items,
            _ => return Err(anyhow!("model `{name}`: path export is not a JSON array")),
        };
        let test_id = GlobalId::encode(0, EntityKind::Test)?;
        let path_records = resolve_paths(model_id, &[(test_id, entries)], &graph.edges, &graph.nodes)
            .with_context(|| format!("model `{name}`: resolving test paths"))?;
        apply_test_status(&mut graph.edges, &path_records);
        write_jsonl(&model_dir.join("paths.jsonl"), RecordKind::Paths, &path_records)?;

        let test = TestCorpus {
            id: test_id,
            name: Some(model_name(paths_path)),
            model_ids: vec![model_id],
            snapshot_time: Some(snapshot_time.to_string()),
        };
        write_jsonl(&model_dir.join("tests.jsonl"), RecordKind::Tests, &[test])?;
    }

    let (atts, groups) = ground_and_group(model_id, &graph.nodes, ontology)
        .with_context(|| format!("model `{name}`: grounding against ontology"))?;

    write_jsonl(&model_dir.join("nodes.jsonl"), RecordKind::Nodes, &graph.nodes)?;
    write_jsonl(&model_dir.join("edges.jsonl"), RecordKind::Edges, &graph.edges)?;
    write_jsonl(
        &model_dir.join("evidences.jsonl"),
        RecordKind::Evidences,
        &graph.evidences,
    )?;
    write_jsonl(&model_dir.join("docs.jsonl"), RecordKind::Docs, &graph.docs)?;
    write_jsonl(&model_dir.join("nodeAtts.jsonl"), RecordKind::NodeAtts, &atts)?;
    write_jsonl(&model_dir.join("groups.jsonl"), RecordKind::Groups, &groups)?;

    if args.summary {
        print_namespace_summary(&name, &order, &graph, ontology);
    }

    Ok(ModelRunSummary {
        name,
        model_id,
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        evidences: graph.evidences.len(),
        docs: graph.docs.len(),
        groups: groups.len(),
        report: graph.report,
    })
}

fn write_models_file(
    out_dir: &Path,
    summaries: &[ModelRunSummary],
    snapshot_time: &str,
    with_tests: bool,
) -> Result<()> {
    let test_ids = if with_tests {
        vec![GlobalId::encode(0, EntityKind::Test)?]
    } else {
        Vec::new()
    };
    let models: Vec<Model> = summaries
        .iter()
        .map(|summary| Model {
            id: summary.model_id,
            name: Some(summary.name.clone()),
            description: None,
            test_ids: test_ids.clone(),
            snapshot_time: Some(snapshot_time.to_string()),
        })
        .collect();
    write_jsonl(&out_dir.join("models.jsonl"), RecordKind::Models, &models)
}

/// Write one preamble-headed JSONL file: the preamble object first, then one
/// projected row per record.
fn write_jsonl<T: Serialize>(path: &Path, kind: RecordKind, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut out = String::new();
    out.push_str(&kind.preamble_object().to_string());
    out.push('\n');
    for row in rows {
        let value = serde_json::to_value(row)
            .with_context(|| format!("serializing a `{kind}` row"))?;
        out.push_str(&project(&value, kind).to_string());
        out.push('\n');
    }

    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

/// Namespace usage table: occurrences in the model's groundings vs. the
/// ontology's term ids.
fn print_namespace_summary(
    name: &str,
    order: &[String],
    graph: &ModelGraph,
    ontology: &OntologyGraph,
) {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for namespace in order {
        counts.insert(namespace, (0, 0));
    }
    for node in &graph.nodes {
        for db_ref in &node.db_ids {
            if let Some(entry) = counts.get_mut(db_ref.namespace.as_str()) {
                entry.0 += 1;
            }
        }
    }
    for term in ontology.term_ids() {
        if let Some(namespace) = term_namespace(term) {
            if let Some(entry) = counts.get_mut(namespace) {
                entry.1 += 1;
            }
        }
    }

    println!("\n{}", format!("Model {name}").bold());
    println!("{:-<46}", "");
    println!(
        "| {:^20} | {:^8} | {:^8} |",
        "Namespace".bold(),
        "Model".bold(),
        "Ontology".bold()
    );
    println!("{:-<46}", "");
    for namespace in order {
        let (model_count, onto_count) = counts[namespace.as_str()];
        println!("| {namespace:^20} | {model_count:>8} | {onto_count:>8} |");
    }
    println!("{:-<46}\n", "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, file: &str, value: &Value) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn sample_inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let statements = write(
            dir,
            "covid19.json",
            &json!([
                {
                    "matches_hash": 1,
                    "type": "Activation",
                    "belief": 0.9,
                    "subj": {"name": "A", "db_refs": {"HGNC": "1"}},
                    "obj": {"name": "B", "db_refs": {}},
                    "evidence": [
                        {"source_hash": 10, "text": "A activates B.", "text_refs": {"PMID": "7"}}
                    ],
                },
            ]),
        );
        let ontology = write(
            dir,
            "ontology.json",
            &json!({
                "directed": true,
                "nodes": [
                    {"id": "HGNC:1", "name": "A"},
                    {"id": "FPLX:AF", "name": "A family"},
                ],
                "links": [
                    {"source": "HGNC:1", "target": "FPLX:AF", "type": "isa"},
                ],
            }),
        );
        (statements, ontology)
    }

    #[test]
    fn pipeline_writes_preamble_headed_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let (statements, ontology) = sample_inputs(dir.path());
        let out_dir = dir.path().join("out");

        run(AssembleArgs {
            statements: vec![statements],
            ontology,
            namespaces_priority: "FPLX HGNC".to_string(),
            curation: vec![],
            paths: vec![],
            out_dir: out_dir.clone(),
            summary: false,
        })
        .unwrap();

        let nodes_file = fs::read_to_string(out_dir.join("covid19/nodes.jsonl")).unwrap();
        let mut lines = nodes_file.lines();

        let preamble: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert!(preamble["grounded_db"].is_string());

        let first: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(first["name"], json!("A"));
        assert_eq!(first["grounded_db"], json!(true));
        // Projection keeps exactly the preamble fields.
        assert_eq!(
            first.as_object().unwrap().len(),
            RecordKind::Nodes.fields().len()
        );

        let groups_file = fs::read_to_string(out_dir.join("covid19/groups.jsonl")).unwrap();
        assert!(groups_file.contains("FPLX:AF"));
        assert!(groups_file.contains("not-grounded"));

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(out_dir.join("run.json")).unwrap()).unwrap();
        assert_eq!(manifest["failures"], json!(0));
        assert_eq!(manifest["models"][0]["nodes"], json!(2));
    }

    #[test]
    fn one_bad_model_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (statements, ontology) = sample_inputs(dir.path());
        let bad = write(dir.path(), "bad.json", &json!({"not": "an array"}));
        let out_dir = dir.path().join("out");

        run(AssembleArgs {
            statements: vec![bad, statements],
            ontology,
            namespaces_priority: "FPLX HGNC".to_string(),
            curation: vec![],
            paths: vec![],
            out_dir: out_dir.clone(),
            summary: false,
        })
        .unwrap();

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(out_dir.join("run.json")).unwrap()).unwrap();
        assert_eq!(manifest["failures"], json!(1));
        assert!(out_dir.join("covid19/nodes.jsonl").exists());
        assert!(!out_dir.join("bad/nodes.jsonl").exists());
    }

    #[test]
    fn all_models_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_, ontology) = sample_inputs(dir.path());
        let bad = write(dir.path(), "bad.json", &json!(42));

        let result = run(AssembleArgs {
            statements: vec![bad],
            ontology,
            namespaces_priority: String::new(),
            curation: vec![],
            paths: vec![],
            out_dir: dir.path().join("out"),
            summary: false,
        });
        assert!(result.is_err());
    }
}
