//! Raw statement wire model.
//!
//! Statements arrive as loosely-shaped JSON records whose relation kind is
//! identified by which *role fields* are present. Instead of duck-typed key
//! probing scattered through the transformer, classification happens once,
//! here, against a fixed priority-ordered table of role patterns; the result
//! is an explicit tagged union ([`StatementShape`]) the transformer matches
//! on.
//!
//! A statement matching none of the patterns is not an error; the caller
//! drops it. A statement that *matches* a pattern but lacks one of the
//! pattern's required sub-fields is a per-statement data error
//! ([`ShapeError`]); the caller skips it and keeps going.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Per-statement extraction failures. Never fatal to a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("statement is not a JSON object")]
    NotAnObject,

    #[error("statement `{statement}` ({pattern}) is missing required field `{field}`")]
    MissingRequiredField {
        statement: String,
        pattern: RolePattern,
        field: String,
    },
}

/// The known role-pair patterns, in match-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RolePattern {
    SubjectObject,
    EnzymeSubstrate,
    GefRasLike,
    GapRasLike,
    Conversion,
    Members,
}

impl RolePattern {
    /// Wire keys whose joint presence selects this pattern.
    pub const fn role_keys(self) -> &'static [&'static str] {
        match self {
            RolePattern::SubjectObject => &["subj", "obj"],
            RolePattern::EnzymeSubstrate => &["enz", "sub"],
            RolePattern::GefRasLike => &["gef", "ras"],
            RolePattern::GapRasLike => &["gap", "ras"],
            RolePattern::Conversion => &["subj", "obj_from", "obj_to"],
            RolePattern::Members => &["members"],
        }
    }
}

impl fmt::Display for RolePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.role_keys();
        write!(f, "({})", keys.join(","))
    }
}

/// Priority-ordered pattern table. First match wins.
pub const ROLE_PATTERNS: [RolePattern; 6] = [
    RolePattern::SubjectObject,
    RolePattern::EnzymeSubstrate,
    RolePattern::GefRasLike,
    RolePattern::GapRasLike,
    RolePattern::Conversion,
    RolePattern::Members,
];

/// A participant in a statement: an entity name plus its external database
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub name: String,
    pub db_refs: BTreeMap<String, Value>,
}

/// One evidentiary record attached to a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvidence {
    pub source_hash: String,
    pub text: Option<String>,
    pub text_refs: Option<Value>,
}

/// The tagged union of statement shapes after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementShape {
    SubjectObject { subject: Agent, object: Agent },
    EnzymeSubstrate { enzyme: Agent, substrate: Agent },
    GefRasLike { gef: Agent, ras: Agent },
    GapRasLike { gap: Agent, ras: Agent },
    Conversion { subject: Agent, object_from: Agent, object_to: Agent },
    Members { members: Vec<Agent> },
}

impl StatementShape {
    pub fn pattern(&self) -> RolePattern {
        match self {
            StatementShape::SubjectObject { .. } => RolePattern::SubjectObject,
            StatementShape::EnzymeSubstrate { .. } => RolePattern::EnzymeSubstrate,
            StatementShape::GefRasLike { .. } => RolePattern::GefRasLike,
            StatementShape::GapRasLike { .. } => RolePattern::GapRasLike,
            StatementShape::Conversion { .. } => RolePattern::Conversion,
            StatementShape::Members { .. } => RolePattern::Members,
        }
    }
}

/// A classified, extracted statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Opaque stable id of the statement (`matches_hash`).
    pub matches_hash: String,
    pub statement_type: String,
    pub belief: f64,
    pub shape: StatementShape,
    pub evidence: Vec<RawEvidence>,
}

impl Statement {
    /// Classify and extract one raw statement.
    ///
    /// Returns `Ok(None)` when no role pattern matches (the statement is to
    /// be dropped), `Err` when a matched pattern is missing a required
    /// sub-field.
    pub fn from_value(raw: &Value) -> Result<Option<Statement>, ShapeError> {
        let obj = raw.as_object().ok_or(ShapeError::NotAnObject)?;

        let Some(pattern) = classify(obj) else {
            return Ok(None);
        };

        let matches_hash = coerce_string(require(obj, pattern, "matches_hash")?)
            .ok_or_else(|| missing(obj, pattern, "matches_hash"))?;
        let statement_type = coerce_string(require(obj, pattern, "type")?)
            .ok_or_else(|| missing(obj, pattern, "type"))?;
        let belief = require(obj, pattern, "belief")?
            .as_f64()
            .ok_or_else(|| missing(obj, pattern, "belief"))?;

        let shape = extract_shape(obj, pattern)?;
        let evidence = extract_evidence(obj);

        Ok(Some(Statement {
            matches_hash,
            statement_type,
            belief,
            shape,
            evidence,
        }))
    }
}

/// First pattern (in priority order) whose role keys are all present.
pub fn classify(obj: &Map<String, Value>) -> Option<RolePattern> {
    ROLE_PATTERNS
        .into_iter()
        .find(|pattern| pattern.role_keys().iter().all(|key| obj.contains_key(*key)))
}

fn statement_label(obj: &Map<String, Value>) -> String {
    obj.get("matches_hash")
        .and_then(coerce_string)
        .unwrap_or_else(|| "<no matches_hash>".to_string())
}

fn missing(obj: &Map<String, Value>, pattern: RolePattern, field: &str) -> ShapeError {
    ShapeError::MissingRequiredField {
        statement: statement_label(obj),
        pattern,
        field: field.to_string(),
    }
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    pattern: RolePattern,
    field: &str,
) -> Result<&'a Value, ShapeError> {
    match obj.get(field) {
        Some(Value::Null) | None => Err(missing(obj, pattern, field)),
        Some(value) => Ok(value),
    }
}

fn extract_shape(obj: &Map<String, Value>, pattern: RolePattern) -> Result<StatementShape, ShapeError> {
    match pattern {
        RolePattern::SubjectObject => Ok(StatementShape::SubjectObject {
            subject: extract_agent(obj, pattern, "subj")?,
            object: extract_agent(obj, pattern, "obj")?,
        }),
        RolePattern::EnzymeSubstrate => Ok(StatementShape::EnzymeSubstrate {
            enzyme: extract_agent(obj, pattern, "enz")?,
            substrate: extract_agent(obj, pattern, "sub")?,
        }),
        RolePattern::GefRasLike => Ok(StatementShape::GefRasLike {
            gef: extract_agent(obj, pattern, "gef")?,
            ras: extract_agent(obj, pattern, "ras")?,
        }),
        RolePattern::GapRasLike => Ok(StatementShape::GapRasLike {
            gap: extract_agent(obj, pattern, "gap")?,
            ras: extract_agent(obj, pattern, "ras")?,
        }),
        RolePattern::Conversion => Ok(StatementShape::Conversion {
            subject: extract_agent(obj, pattern, "subj")?,
            object_from: extract_first_agent(obj, pattern, "obj_from")?,
            object_to: extract_first_agent(obj, pattern, "obj_to")?,
        }),
        RolePattern::Members => {
            let raw = require(obj, pattern, "members")?
                .as_array()
                .ok_or_else(|| missing(obj, pattern, "members"))?;
            let members = raw
                .iter()
                .map(|entry| agent_from_value(entry, obj, pattern, "members"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(StatementShape::Members { members })
        }
    }
}

fn extract_agent(
    obj: &Map<String, Value>,
    pattern: RolePattern,
    field: &str,
) -> Result<Agent, ShapeError> {
    agent_from_value(require(obj, pattern, field)?, obj, pattern, field)
}

/// `obj_from` / `obj_to` carry a list of agents; the first entry is the edge
/// endpoint.
fn extract_first_agent(
    obj: &Map<String, Value>,
    pattern: RolePattern,
    field: &str,
) -> Result<Agent, ShapeError> {
    let list = require(obj, pattern, field)?
        .as_array()
        .ok_or_else(|| missing(obj, pattern, field))?;
    let first = list.first().ok_or_else(|| missing(obj, pattern, field))?;
    agent_from_value(first, obj, pattern, field)
}

fn agent_from_value(
    value: &Value,
    obj: &Map<String, Value>,
    pattern: RolePattern,
    field: &str,
) -> Result<Agent, ShapeError> {
    let agent = value
        .as_object()
        .ok_or_else(|| missing(obj, pattern, field))?;
    let name = agent
        .get("name")
        .and_then(coerce_string)
        .ok_or_else(|| missing(obj, pattern, &format!("{field}.name")))?;
    let db_refs = agent
        .get("db_refs")
        .and_then(Value::as_object)
        .ok_or_else(|| missing(obj, pattern, &format!("{field}.db_refs")))?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(Agent { name, db_refs })
}

/// Evidence is optional; malformed entries are dropped rather than failing
/// the statement.
fn extract_evidence(obj: &Map<String, Value>) -> Vec<RawEvidence> {
    let Some(entries) = obj.get("evidence").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let ev = entry.as_object()?;
            let source_hash = ev.get("source_hash").and_then(coerce_string)?;
            Some(RawEvidence {
                source_hash,
                text: ev.get("text").and_then(coerce_string),
                text_refs: ev
                    .get("text_refs")
                    .filter(|v| !v.is_null())
                    .cloned(),
            })
        })
        .collect()
}

/// Statement corpora are sloppy about scalar types: hashes arrive as both
/// integers and strings. Coerce scalars to their textual form.
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
