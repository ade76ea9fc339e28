//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the Rex core:
//! - Instance and generation identifiers (`Guid`, `GenId`)
//! - Provenance and instance category tags (`Provenance`, `InstanceCategory`)
//! - Digest records (`EntityDigest`, `RelationshipDigest`)
//! - Error types (`RexError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so they can key `BTreeMap`/`BTreeSet`
//! and produce the same iteration order on every run.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Globally unique identifier of a repository instance.
///
/// Entities and relationships share one GUID space within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Guid(pub String);

impl Guid {
    /// Create a new GUID from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the GUID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the GUID is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Guid {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Guid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a generation.
///
/// Generation ids are 1-based logical sequence numbers. `GenId(0)` is the
/// "no generation" value reported by an empty store; it never names a
/// committed generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct GenId(pub u32);

impl GenId {
    /// The id reported when no generation exists.
    pub const NONE: Self = Self(0);

    /// The id that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Check whether this is the "no generation" id.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TAGS
// =============================================================================

/// Where and how an instance was sourced when it was retrieved.
///
/// The wire form is the repository's string tag. Tags outside the known set
/// decode into `Unrecognized` so callers handle them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    /// The queried server is the instance's home repository.
    Home,
    /// The queried server holds a reference copy.
    RefCopy,
    /// Only a stub was seen, at the end of a relationship.
    Proxy,
    /// Retrieved through an enterprise (federated) query; origin unknown.
    Enterprise,
    /// A tag this build does not understand.
    Unrecognized(String),
}

impl Provenance {
    /// The repository's string tag for this provenance.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::RefCopy => "refCopy",
            Self::Proxy => "proxy",
            Self::Enterprise => "ent",
            Self::Unrecognized(tag) => tag,
        }
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for Provenance {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "home" => Self::Home,
            "refCopy" => Self::RefCopy,
            "proxy" => Self::Proxy,
            "ent" => Self::Enterprise,
            _ => Self::Unrecognized(tag),
        }
    }
}

impl From<&str> for Provenance {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<Provenance> for String {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Unrecognized(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a repository instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InstanceCategory {
    Entity,
    Relationship,
}

impl InstanceCategory {
    /// Human-readable name, as shown in history.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::Relationship => "Relationship",
        }
    }
}

impl fmt::Display for InstanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// DIGESTS
// =============================================================================

/// Compact summary of one entity as known inside the graph.
///
/// Full detail is fetched on demand; the digest is what generations store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDigest {
    #[serde(rename = "entityGUID")]
    pub entity_guid: Guid,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default)]
    pub metadata_collection_name: Option<String>,
    #[serde(default)]
    pub metadata_collection_id: Option<String>,
    /// Generation the entity belongs to, once assigned.
    #[serde(rename = "gen", default)]
    pub generation: Option<GenId>,
}

impl EntityDigest {
    /// Create a digest with no home collection and no generation.
    #[must_use]
    pub fn new(guid: impl Into<Guid>, label: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            entity_guid: guid.into(),
            label: label.into(),
            provenance,
            metadata_collection_name: None,
            metadata_collection_id: None,
            generation: None,
        }
    }

    /// Record the home metadata collection.
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.metadata_collection_name = Some(name.into());
        self.metadata_collection_id = Some(id.into());
        self
    }
}

/// Compact summary of one relationship as known inside the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDigest {
    #[serde(rename = "relationshipGUID")]
    pub relationship_guid: Guid,
    #[serde(rename = "end1GUID")]
    pub end1_guid: Guid,
    #[serde(rename = "end2GUID")]
    pub end2_guid: Guid,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default)]
    pub metadata_collection_name: Option<String>,
    #[serde(default)]
    pub metadata_collection_id: Option<String>,
    #[serde(rename = "gen", default)]
    pub generation: Option<GenId>,
}

impl RelationshipDigest {
    /// Create a digest linking two entity GUIDs.
    #[must_use]
    pub fn new(
        guid: impl Into<Guid>,
        end1: impl Into<Guid>,
        end2: impl Into<Guid>,
        label: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            relationship_guid: guid.into(),
            end1_guid: end1.into(),
            end2_guid: end2.into(),
            label: label.into(),
            provenance,
            metadata_collection_name: None,
            metadata_collection_id: None,
            generation: None,
        }
    }

    /// Record the home metadata collection.
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.metadata_collection_name = Some(name.into());
        self.metadata_collection_id = Some(id.into());
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Rex core.
///
/// - No silent failures
/// - Use `Result<T, RexError>` for fallible operations
/// - The core never panics; the graph is left in its last committed state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RexError {
    /// The GUID is not present in the identifier index.
    #[error("Instance not known: {0}")]
    UnknownInstance(Guid),

    /// A candidate generation carries a GUID that is already indexed.
    #[error("Instance already belongs to generation {generation}: {guid}")]
    DuplicateInstance { guid: Guid, generation: GenId },

    /// A provenance tag outside the known set was found.
    #[error("Unknown value {0} for instance provenance was encountered")]
    UnrecognizedProvenance(String),

    /// The repository answered with a status other than 200.
    #[error("Repository returned status {status}")]
    RepositoryFailure { status: u16 },

    /// The repository response lacked an expected field.
    #[error("Repository response is missing {0}")]
    MissingPayload(&'static str),

    /// A response was issued under a session epoch that has since been cleared.
    #[error("Stale response from epoch {issued} (current epoch {current})")]
    StaleResponse { issued: u64, current: u64 },

    /// The operation needs a focus instance and there is none.
    #[error("No focus instance")]
    NoFocus,

    /// A request was rejected before reaching the repository.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
