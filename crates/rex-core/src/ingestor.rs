//! # Ingestor Module
//!
//! Retrieval processing for the Rex core.
//!
//! - Deduplicate every retrieved instance against the store index
//! - Build a candidate generation from whatever is new
//! - Commit it in one append, or commit nothing
//!
//! Focus is not touched here; the session decides what to focus.

use crate::payload::{ExpandedEntity, ExpandedRelationship};
use crate::store::GenerationStore;
use crate::{
    EntityDigest, GenId, Generation, Operation, Provenance, RexError, ServerContext,
};

/// What happened to a single retrieved instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    /// Already in the graph, in this generation.
    Known(GenId),
    /// New, committed as this generation.
    Committed(GenId),
}

impl Retrieval {
    /// The generation the instance belongs to.
    #[must_use]
    pub const fn generation(self) -> GenId {
        match self {
            Self::Known(id) | Self::Committed(id) => id,
        }
    }
}

/// What happened to a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOutcome {
    /// Net-new instances were committed as this generation.
    Committed(GenId),
    /// Everything in the traversal was already known.
    NothingNew,
}

/// Stateless processor that folds retrievals into a store.
pub struct RetrievalProcessor;

impl RetrievalProcessor {
    /// Process a retrieved entity.
    ///
    /// A known entity is stamped with its existing generation. If it was first
    /// seen as a proxy, the proxy provenance is kept on the fresh digest. An
    /// unknown entity becomes a new single-entity generation.
    pub fn process_entity(
        store: &mut GenerationStore,
        entity: &mut ExpandedEntity,
    ) -> Result<Retrieval, RexError> {
        let guid = entity.entity_digest.entity_guid.clone();

        if let Some(known) = store.lookup_generation_id(&guid) {
            entity.entity_digest.generation = Some(known);
            let stored_as_proxy = store
                .entity_digest(&guid)
                .is_some_and(|digest| digest.provenance == Provenance::Proxy);
            if stored_as_proxy {
                entity.entity_digest.provenance = Provenance::Proxy;
            }
            return Ok(Retrieval::Known(known));
        }

        let origin = ServerContext::new(
            entity.server_name.clone(),
            entity.platform_name.clone(),
            entity.entity_digest.provenance == Provenance::Enterprise,
        );
        let candidate = Generation::new(origin, Operation::GetEntity)
            .with_entity(entity.entity_digest.clone());

        let id = store.append_generation(candidate)?;
        entity.entity_digest.generation = Some(id);
        Ok(Retrieval::Committed(id))
    }

    /// Process a retrieved relationship.
    ///
    /// An unknown relationship becomes a new generation together with any end
    /// entity that is not yet known. Known ends keep their generation.
    pub fn process_relationship(
        store: &mut GenerationStore,
        relationship: &mut ExpandedRelationship,
    ) -> Result<Retrieval, RexError> {
        let guid = relationship.relationship_digest.relationship_guid.clone();

        if let Some(known) = store.lookup_generation_id(&guid) {
            relationship.relationship_digest.generation = Some(known);
            for end in [
                &mut relationship.entity_one_digest,
                &mut relationship.entity_two_digest,
            ] {
                end.generation = store.lookup_generation_id(&end.entity_guid);
            }
            return Ok(Retrieval::Known(known));
        }

        let origin = ServerContext::new(
            relationship.server_name.clone(),
            relationship.platform_name.clone(),
            relationship.relationship_digest.provenance == Provenance::Enterprise,
        );
        let mut candidate = Generation::new(origin, Operation::GetRelationship)
            .with_relationship(relationship.relationship_digest.clone());

        let new_ends: Vec<EntityDigest> = [
            &relationship.entity_one_digest,
            &relationship.entity_two_digest,
        ]
        .into_iter()
        .filter(|end| !store.contains(&end.entity_guid))
        .cloned()
        .collect();
        // Both ends may name the same entity; the map keeps one copy.
        for end in new_ends {
            candidate.insert_entity(end);
        }

        let id = store.append_generation(candidate)?;
        relationship.relationship_digest.generation = Some(id);
        for end in [
            &mut relationship.entity_one_digest,
            &mut relationship.entity_two_digest,
        ] {
            end.generation = store.lookup_generation_id(&end.entity_guid);
        }
        Ok(Retrieval::Committed(id))
    }

    /// Process a traversal or search selection.
    ///
    /// Everything already indexed is dropped from the candidate. If nothing is
    /// left the store is untouched and `NothingNew` is returned.
    pub fn process_traversal(
        store: &mut GenerationStore,
        mut candidate: Generation,
    ) -> Result<TraversalOutcome, RexError> {
        candidate.entities.retain(|guid, _| !store.contains(guid));
        candidate.relationships.retain(|guid, _| !store.contains(guid));

        if candidate.is_empty() {
            return Ok(TraversalOutcome::NothingNew);
        }

        let id = store.append_generation(candidate)?;
        Ok(TraversalOutcome::Committed(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
