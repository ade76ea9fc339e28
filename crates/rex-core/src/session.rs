//! # Session Module
//!
//! The exploration session: generation store, focus and epoch held as one
//! immutable snapshot.
//!
//! Every transition clones the snapshot (cheap, the store is `Arc`-backed),
//! applies the change to the clone and swaps it in only if the whole change
//! succeeded. Readers holding an older snapshot are never affected.
//!
//! ## Epochs
//!
//! `clear()` bumps the epoch. A caller that releases the session while a
//! repository request is in flight takes a `RetrievalTicket` first and checks
//! it before applying the response.

use crate::focus::{Focus, FocusChange};
use crate::history::{HistoryCompiler, HistoryEntry};
use crate::ingestor::{Retrieval, RetrievalProcessor, TraversalOutcome};
use crate::payload::{ExpandedEntity, ExpandedRelationship};
use crate::query::{ExploreFilters, RepositoryQuery};
use crate::reload::ReloadResolver;
use crate::store::GenerationStore;
use crate::{GenId, Generation, Guid, InstanceCategory, RexError};
use std::sync::Arc;

/// One consistent view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub store: GenerationStore,
    pub focus: Focus,
    pub epoch: u64,
}

/// Epoch captured when a repository request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalTicket {
    pub epoch: u64,
}

/// An exploration session.
///
/// Cloning is cheap and yields an independent session starting from the same
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<SessionState>,
}

impl Session {
    /// Create an empty session at epoch 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Later transitions do not affect it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    /// The generation store.
    #[must_use]
    pub fn store(&self) -> &GenerationStore {
        &self.state.store
    }

    /// The focus.
    #[must_use]
    pub fn focus(&self) -> &Focus {
        &self.state.focus
    }

    /// The current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.state.epoch
    }

    fn transition<T>(
        &mut self,
        change: impl FnOnce(&mut SessionState) -> Result<T, RexError>,
    ) -> Result<T, RexError> {
        let mut next = SessionState::clone(&self.state);
        let output = change(&mut next)?;
        self.state = Arc::new(next);
        Ok(output)
    }

    // =========================================================================
    // STORE READS
    // =========================================================================

    /// Id of the newest generation, or `GenId::NONE`.
    #[must_use]
    pub fn latest_active_generation_id(&self) -> GenId {
        self.state.store.latest_active_generation_id()
    }

    /// The newest generation.
    #[must_use]
    pub fn latest_generation(&self) -> Option<Arc<Generation>> {
        self.state.store.latest_generation()
    }

    /// Generation that introduced the GUID.
    #[must_use]
    pub fn lookup_generation_id(&self, guid: &Guid) -> Option<GenId> {
        self.state.store.lookup_generation_id(guid)
    }

    /// Human-readable history of every generation.
    #[must_use]
    pub fn compile_history(&self) -> Vec<HistoryEntry> {
        HistoryCompiler::compile(&self.state.store)
    }

    // =========================================================================
    // RETRIEVALS
    // =========================================================================

    /// Fold a retrieved entity into the graph and focus it.
    pub fn process_entity(&mut self, mut entity: ExpandedEntity) -> Result<Retrieval, RexError> {
        self.transition(|state| {
            let retrieval = RetrievalProcessor::process_entity(&mut state.store, &mut entity)?;
            state.focus = Focus::Entity(Arc::new(entity));
            Ok(retrieval)
        })
    }

    /// Fold a retrieved relationship into the graph and focus it.
    pub fn process_relationship(
        &mut self,
        mut relationship: ExpandedRelationship,
    ) -> Result<Retrieval, RexError> {
        self.transition(|state| {
            let retrieval =
                RetrievalProcessor::process_relationship(&mut state.store, &mut relationship)?;
            state.focus = Focus::Relationship(Arc::new(relationship));
            Ok(retrieval)
        })
    }

    /// Fold a traversal or search selection into the graph. Focus is unchanged.
    pub fn process_traversal(&mut self, candidate: Generation) -> Result<TraversalOutcome, RexError> {
        self.transition(|state| RetrievalProcessor::process_traversal(&mut state.store, candidate))
    }

    // =========================================================================
    // FOCUS
    // =========================================================================

    /// Focus an entity that is already in the graph.
    pub fn set_focus_entity(&mut self, entity: Arc<ExpandedEntity>) -> Result<(), RexError> {
        self.transition(|state| {
            if !state.store.contains(entity.guid()) {
                return Err(RexError::UnknownInstance(entity.guid().clone()));
            }
            state.focus = Focus::Entity(entity);
            Ok(())
        })
    }

    /// Focus a relationship that is already in the graph.
    pub fn set_focus_relationship(
        &mut self,
        relationship: Arc<ExpandedRelationship>,
    ) -> Result<(), RexError> {
        self.transition(|state| {
            if !state.store.contains(relationship.guid()) {
                return Err(RexError::UnknownInstance(relationship.guid().clone()));
            }
            state.focus = Focus::Relationship(relationship);
            Ok(())
        })
    }

    /// Deselect the focus.
    pub fn clear_focus(&mut self) {
        if self.state.focus.is_none() {
            return;
        }
        let mut next = SessionState::clone(&self.state);
        next.focus = Focus::None;
        self.state = Arc::new(next);
    }

    /// GUID of the focus instance.
    #[must_use]
    pub fn focus_guid(&self) -> Option<&Guid> {
        self.state.focus.guid()
    }

    /// Category of the focus instance.
    #[must_use]
    pub fn focus_category(&self) -> Option<InstanceCategory> {
        self.state.focus.category()
    }

    /// The focus entity, if an entity is focused.
    #[must_use]
    pub fn focus_entity(&self) -> Option<&Arc<ExpandedEntity>> {
        self.state.focus.entity()
    }

    /// The focus relationship, if a relationship is focused.
    #[must_use]
    pub fn focus_relationship(&self) -> Option<&Arc<ExpandedRelationship>> {
        self.state.focus.relationship()
    }

    /// Generation holding the focus instance.
    #[must_use]
    pub fn focus_generation_id(&self) -> Option<GenId> {
        self.focus_guid()
            .and_then(|guid| self.state.store.lookup_generation_id(guid))
    }

    /// The generation holding the focus instance.
    #[must_use]
    pub fn focus_generation(&self) -> Option<Arc<Generation>> {
        let id = self.focus_generation_id()?;
        self.state.store.generation(id).cloned()
    }

    /// Toggle or reload focus for a known instance.
    ///
    /// - the current focus is deselected
    /// - a known instance yields a reload plan routed by its provenance
    /// - an unknown GUID (or one of the other category) changes nothing
    ///
    /// An unrecognized provenance is logged and returned as an error; no
    /// reload should be issued for it.
    pub fn change_focus(
        &mut self,
        category: InstanceCategory,
        guid: &Guid,
    ) -> Result<FocusChange, RexError> {
        if self.state.focus.is(guid) {
            self.clear_focus();
            return Ok(FocusChange::Deselected);
        }

        let store = &self.state.store;
        let Some(generation) = store
            .lookup_generation_id(guid)
            .and_then(|id| store.generation(id))
        else {
            return Ok(FocusChange::Unknown);
        };
        let provenance = match category {
            InstanceCategory::Entity => generation.entities.get(guid).map(|d| &d.provenance),
            InstanceCategory::Relationship => {
                generation.relationships.get(guid).map(|d| &d.provenance)
            }
        };
        let Some(provenance) = provenance else {
            return Ok(FocusChange::Unknown);
        };

        match ReloadResolver::plan(category, guid.clone(), provenance, &generation.origin) {
            Ok(plan) => Ok(FocusChange::Reload(plan)),
            Err(e) => {
                tracing::warn!(
                    guid = %guid,
                    provenance = %provenance,
                    "Unknown value {} for instance provenance was encountered",
                    provenance
                );
                Err(e)
            }
        }
    }

    /// Query for a one-hop exploration around the focus entity.
    pub fn explore_query(&self, filters: ExploreFilters) -> Result<RepositoryQuery, RexError> {
        filters.validate()?;
        match &self.state.focus {
            Focus::None => Err(RexError::NoFocus),
            Focus::Relationship(_) => Err(RexError::InvalidRequest(
                "explore needs an entity focus".to_string(),
            )),
            Focus::Entity(entity) => Ok(RepositoryQuery::explore(entity.guid().clone(), filters)),
        }
    }

    // =========================================================================
    // UNDO AND RESET
    // =========================================================================

    /// Pop the newest generation.
    ///
    /// Focus is cleared in the same step when the popped generation held it.
    pub fn remove_latest_generation(&mut self) -> Option<Arc<Generation>> {
        let mut next = SessionState::clone(&self.state);
        let removed = next.store.remove_latest_generation()?;
        if next.focus.guid().is_some_and(|guid| removed.contains(guid)) {
            next.focus = Focus::None;
        }
        self.state = Arc::new(next);
        Some(removed)
    }

    /// Drop all generations and the focus, and start a new epoch.
    pub fn clear(&mut self) {
        let epoch = self.state.epoch.saturating_add(1);
        self.state = Arc::new(SessionState {
            epoch,
            ..SessionState::default()
        });
        tracing::info!(epoch, "session cleared");
    }

    // =========================================================================
    // TICKETS
    // =========================================================================

    /// Capture the current epoch before releasing the session.
    #[must_use]
    pub fn ticket(&self) -> RetrievalTicket {
        RetrievalTicket {
            epoch: self.state.epoch,
        }
    }

    /// Reject a ticket issued before the last `clear()`.
    pub fn check_ticket(&self, ticket: RetrievalTicket) -> Result<(), RexError> {
        if ticket.epoch == self.state.epoch {
            Ok(())
        } else {
            Err(RexError::StaleResponse {
                issued: ticket.epoch,
                current: self.state.epoch,
            })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
