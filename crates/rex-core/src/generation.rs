//! # Generations
//!
//! A generation is the net-new contribution of one retrieval event to the
//! graph: the entities and relationships it introduced, the server context
//! they were retrieved under, and the operation that produced them.

use crate::{EntityDigest, GenId, Guid, RelationshipDigest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server context recorded when a generation was retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContext {
    pub server_name: String,
    pub platform_name: String,
    /// Whether the query federated across all known repositories.
    #[serde(default)]
    pub enterprise_option: bool,
}

impl ServerContext {
    /// Create a server context.
    #[must_use]
    pub fn new(
        server_name: impl Into<String>,
        platform_name: impl Into<String>,
        enterprise_option: bool,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            platform_name: platform_name.into(),
            enterprise_option,
        }
    }
}

/// Query metadata of a neighborhood traversal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalQuery {
    /// Entity the traversal started from.
    #[serde(rename = "entityGUID")]
    pub root: Guid,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub entity_type_names: Option<Vec<String>>,
    #[serde(default)]
    pub relationship_type_names: Option<Vec<String>>,
    #[serde(default)]
    pub classification_names: Option<Vec<String>>,
}

/// The retrieval operation that produced a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Operation {
    GetEntity,
    GetRelationship,
    Traversal(TraversalQuery),
    EntitySearch {
        #[serde(rename = "searchText")]
        search_text: String,
    },
    RelationshipSearch {
        #[serde(rename = "searchText")]
        search_text: String,
    },
    /// Any operation tag this build does not understand.
    #[serde(other)]
    Unrecognized,
}

/// One committed (or candidate) generation.
///
/// `id` is a logical sequence number assigned by the store at append time.
/// It is kept as an explicit field and never derived from storage position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    #[serde(rename = "gen", default)]
    pub id: GenId,
    #[serde(default)]
    pub entities: BTreeMap<Guid, EntityDigest>,
    #[serde(default)]
    pub relationships: BTreeMap<Guid, RelationshipDigest>,
    #[serde(flatten)]
    pub origin: ServerContext,
    pub operation: Operation,
}

impl Generation {
    /// Create an empty, unassigned generation.
    #[must_use]
    pub fn new(origin: ServerContext, operation: Operation) -> Self {
        Self {
            id: GenId::NONE,
            entities: BTreeMap::new(),
            relationships: BTreeMap::new(),
            origin,
            operation,
        }
    }

    /// Add an entity digest, keyed by its GUID.
    pub fn insert_entity(&mut self, digest: EntityDigest) {
        self.entities.insert(digest.entity_guid.clone(), digest);
    }

    /// Add a relationship digest, keyed by its GUID.
    pub fn insert_relationship(&mut self, digest: RelationshipDigest) {
        self.relationships
            .insert(digest.relationship_guid.clone(), digest);
    }

    /// Builder form of `insert_entity`.
    #[must_use]
    pub fn with_entity(mut self, digest: EntityDigest) -> Self {
        self.insert_entity(digest);
        self
    }

    /// Builder form of `insert_relationship`.
    #[must_use]
    pub fn with_relationship(mut self, digest: RelationshipDigest) -> Self {
        self.insert_relationship(digest);
        self
    }

    /// All instance GUIDs introduced by this generation, entities first.
    pub fn keys(&self) -> impl Iterator<Item = &Guid> {
        self.entities.keys().chain(self.relationships.keys())
    }

    /// Check whether this generation introduced the given GUID.
    #[must_use]
    pub fn contains(&self, guid: &Guid) -> bool {
        self.entities.contains_key(guid) || self.relationships.contains_key(guid)
    }

    /// Check whether the generation carries no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Total number of instances in the generation.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.entities.len() + self.relationships.len()
    }

    /// Stamp every digest with the given generation id.
    pub(crate) fn stamp(&mut self, id: GenId) {
        self.id = id;
        for digest in self.entities.values_mut() {
            digest.generation = Some(id);
        }
        for digest in self.relationships.values_mut() {
            digest.generation = Some(id);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
