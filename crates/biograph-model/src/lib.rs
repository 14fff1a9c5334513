//! Canonical biograph data model.
//!
//! This crate defines the shared vocabulary of the pipeline:
//!
//! - [`records`]: the output record types (nodes, edges, evidences, docs,
//!   node attributes, groups, paths, model/test metadata),
//! - [`statement`]: the raw statement wire model and the priority-ordered
//!   role-pattern table that classifies it,
//! - [`digest`]: a deterministic, non-cryptographic content digest used for
//!   structural-identity keys,
//! - [`preamble`]: the per-kind field whitelists ("preambles") that output
//!   rows are projected through.
//!
//! Everything here is plain data; the algorithmic stages live in
//! `biograph-assemble` and `biograph-ontology`.

pub mod digest;
pub mod preamble;
pub mod records;
pub mod statement;

pub use records::{
    CurationStatus, DbRef, Doc, DocIdentifier, Edge, Evidence, Group, GroundingOutcome, Model,
    Node, NodeAttribute, PathRecord, TestCorpus,
};
pub use statement::{Agent, RawEvidence, RolePattern, ShapeError, Statement, StatementShape};
