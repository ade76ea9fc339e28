//! # Generation Store
//!
//! The ordered list of generations plus the reverse index from instance GUID
//! to the generation that first introduced it.
//!
//! Both halves live behind `Arc`s. Mutations go through `Arc::make_mut`, so a
//! clone taken before a mutation (a session snapshot) keeps seeing the old
//! state while the mutated copy moves on.

use crate::{EntityDigest, GenId, Generation, Guid, RelationshipDigest, RexError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Append-only sequence of generations with a GUID index.
///
/// Only the newest generation can ever be removed. Committed generations are
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStore {
    generations: Arc<Vec<Arc<Generation>>>,
    index: Arc<BTreeMap<Guid, GenId>>,
}

impl GenerationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the newest generation, or `GenId::NONE` when empty.
    #[must_use]
    pub fn latest_active_generation_id(&self) -> GenId {
        self.generations
            .last()
            .map(|generation| generation.id)
            .unwrap_or(GenId::NONE)
    }

    /// The newest committed generation.
    #[must_use]
    pub fn latest_generation(&self) -> Option<Arc<Generation>> {
        self.generations.last().cloned()
    }

    /// Id the next committed generation will receive.
    #[must_use]
    pub fn next_generation_id(&self) -> GenId {
        self.latest_active_generation_id().next()
    }

    /// Commit a candidate generation.
    ///
    /// Assigns the next id, stamps it on every digest, appends, and indexes
    /// every key. The candidate must contain only GUIDs that are not yet
    /// indexed; otherwise nothing changes and `DuplicateInstance` is returned.
    pub fn append_generation(&mut self, mut candidate: Generation) -> Result<GenId, RexError> {
        if let Some(guid) = candidate.keys().find(|guid| self.index.contains_key(*guid)) {
            let generation = self.index.get(guid).copied().unwrap_or(GenId::NONE);
            return Err(RexError::DuplicateInstance {
                guid: guid.clone(),
                generation,
            });
        }
        // A relationship GUID colliding with an entity GUID in the same batch.
        if let Some(guid) = candidate
            .relationships
            .keys()
            .find(|guid| candidate.entities.contains_key(*guid))
        {
            return Err(RexError::DuplicateInstance {
                guid: guid.clone(),
                generation: GenId::NONE,
            });
        }

        let id = self.next_generation_id();
        candidate.stamp(id);

        let index = Arc::make_mut(&mut self.index);
        for guid in candidate.keys() {
            index.insert(guid.clone(), id);
        }
        Arc::make_mut(&mut self.generations).push(Arc::new(candidate));

        tracing::debug!(generation = id.value(), "generation appended");
        Ok(id)
    }

    /// Pop the newest generation and unindex its keys.
    ///
    /// Returns `None` on an empty store.
    pub fn remove_latest_generation(&mut self) -> Option<Arc<Generation>> {
        let removed = Arc::make_mut(&mut self.generations).pop()?;

        let index = Arc::make_mut(&mut self.index);
        for guid in removed.keys() {
            index.remove(guid);
        }

        tracing::debug!(generation = removed.id.value(), "generation removed");
        Some(removed)
    }

    /// Drop every generation and the whole index.
    pub fn clear(&mut self) {
        self.generations = Arc::new(Vec::new());
        self.index = Arc::new(BTreeMap::new());
    }

    /// Generation id that introduced the GUID, if known.
    #[must_use]
    pub fn lookup_generation_id(&self, guid: &Guid) -> Option<GenId> {
        self.index.get(guid).copied()
    }

    /// Find a generation by its logical id.
    #[must_use]
    pub fn generation(&self, id: GenId) -> Option<&Arc<Generation>> {
        self.generations
            .binary_search_by_key(&id, |generation| generation.id)
            .ok()
            .and_then(|position| self.generations.get(position))
    }

    /// All generations in ascending id order.
    #[must_use]
    pub fn generations(&self) -> &[Arc<Generation>] {
        &self.generations
    }

    /// The GUID to generation index.
    #[must_use]
    pub fn index(&self) -> &BTreeMap<Guid, GenId> {
        &self.index
    }

    /// Stored digest of a known entity.
    #[must_use]
    pub fn entity_digest(&self, guid: &Guid) -> Option<&EntityDigest> {
        let id = self.lookup_generation_id(guid)?;
        self.generation(id)?.entities.get(guid)
    }

    /// Stored digest of a known relationship.
    #[must_use]
    pub fn relationship_digest(&self, guid: &Guid) -> Option<&RelationshipDigest> {
        let id = self.lookup_generation_id(guid)?;
        self.generation(id)?.relationships.get(guid)
    }

    /// Check whether the GUID is indexed.
    #[must_use]
    pub fn contains(&self, guid: &Guid) -> bool {
        self.index.contains_key(guid)
    }

    /// Number of generations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Check whether the store holds no generations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Total entities across all generations.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.generations.iter().map(|g| g.entities.len()).sum()
    }

    /// Total relationships across all generations.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.generations.iter().map(|g| g.relationships.len()).sum()
    }

    /// Check the structural invariants of the store.
    ///
    /// - ids run 1..=n in storage order
    /// - the index keys are exactly the union of all generation keys
    /// - every index entry points at the generation holding that key
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = BTreeSet::new();
        for (position, generation) in self.generations.iter().enumerate() {
            if generation.id.value() as usize != position + 1 {
                return false;
            }
            for guid in generation.keys() {
                if !seen.insert(guid) {
                    return false;
                }
                if self.index.get(guid) != Some(&generation.id) {
                    return false;
                }
            }
        }
        seen.len() == self.index.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
