//! Globally unique identifiers for biograph entities.
//!
//! Every record produced by the pipeline (models, test corpora, paths, edges,
//! evidences, docs, nodes, groups) carries a 32-bit id that is unique across
//! *all* record kinds: the entity kind occupies the top 4 bits as a namespace
//! tag, the locally-scoped sequence number the remaining 28 bits.
//!
//! Encoding is a pure bijection within one namespace:
//! `GlobalId::encode(local, kind)?.local() == local` for every
//! `local < 2^28`. Exhausting the 28-bit local space is a hard
//! [`IdError::IdentifierOverflow`], never a silent wraparound.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Total width of a global id, in bits.
pub const GLOBAL_BITS: u32 = 32;

/// Bits reserved for the entity-kind namespace tag.
pub const NAMESPACE_BITS: u32 = 4;

/// Bits available for the locally-scoped sequence number.
pub const LOCAL_BITS: u32 = GLOBAL_BITS - NAMESPACE_BITS;

/// Number of distinct local ids representable per namespace.
pub const LOCAL_CAPACITY: u32 = 1 << LOCAL_BITS;

/// Identifier allocation errors. Both variants are programmer errors: the
/// caller either named a kind outside the enumerated set or ran past the
/// 28-bit local id space.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("`{0}` is not a valid entity kind")]
    InvalidKind(String),

    #[error("local id {local} exceeds the {LOCAL_BITS}-bit capacity of namespace `{kind}`")]
    IdentifierOverflow { local: u32, kind: EntityKind },
}

/// The enumerated entity kinds, in namespace-index order.
///
/// The discriminant order is part of the wire contract: it determines the
/// namespace tag packed into the high bits of every [`GlobalId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Model,
    Test,
    Path,
    Edge,
    Evidence,
    Doc,
    Node,
    Group,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Model,
        EntityKind::Test,
        EntityKind::Path,
        EntityKind::Edge,
        EntityKind::Evidence,
        EntityKind::Doc,
        EntityKind::Node,
        EntityKind::Group,
    ];

    /// Namespace index packed into the high bits of a global id.
    pub const fn namespace_index(self) -> u32 {
        self as u32
    }

    /// Stable textual token for this kind (used in record-kind lookups and
    /// diagnostics).
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Model => "models",
            EntityKind::Test => "tests",
            EntityKind::Path => "paths",
            EntityKind::Edge => "edges",
            EntityKind::Evidence => "evidences",
            EntityKind::Doc => "docs",
            EntityKind::Node => "nodes",
            EntityKind::Group => "groups",
        }
    }

    fn from_namespace_index(index: u32) -> Option<EntityKind> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IdError::InvalidKind(s.to_string()))
    }
}

/// A globally unique, reversible 32-bit identifier.
///
/// Serializes as a plain integer so downstream row formats see ordinary
/// numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct GlobalId(u32);

impl GlobalId {
    /// Pack a local sequence number into the namespace of `kind`.
    pub fn encode(local: u32, kind: EntityKind) -> Result<GlobalId, IdError> {
        if local >= LOCAL_CAPACITY {
            return Err(IdError::IdentifierOverflow { local, kind });
        }
        Ok(GlobalId((kind.namespace_index() << LOCAL_BITS) | local))
    }

    /// The locally-scoped sequence number (low 28 bits).
    pub const fn local(self) -> u32 {
        self.0 & (LOCAL_CAPACITY - 1)
    }

    /// Recover the entity kind from the namespace tag. `None` only for ids
    /// whose tag lies outside the enumerated kinds (a foreign id).
    pub fn kind(self) -> Option<EntityKind> {
        EntityKind::from_namespace_index(self.0 >> LOCAL_BITS)
    }

    /// The raw packed representation.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuild an id from its raw packed representation.
    pub const fn from_raw(raw: u32) -> GlobalId {
        GlobalId(raw)
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential id allocator for one namespace.
///
/// A convenience over [`GlobalId::encode`] for the common "enumerate the
/// collection in emission order" case.
#[derive(Debug, Clone)]
pub struct IdSequence {
    kind: EntityKind,
    next: u32,
}

impl IdSequence {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind, next: 0 }
    }

    /// Allocate the next id in this namespace.
    pub fn next_id(&mut self) -> Result<GlobalId, IdError> {
        let id = GlobalId::encode(self.next, self.kind)?;
        self.next += 1;
        Ok(id)
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}
