//! # Exploration Tier Tests (T0-T3)
//!
//! Scenario tests for the session as a whole.
//!
//! ## Tiers
//! - T0: Single retrievals and dedup
//! - T1: Relationship endpoint rules
//! - T2: Traversals
//! - T3: Undo, reset and reload routing

#![allow(clippy::unwrap_used, clippy::panic)]

use rex_core::{
    EntityDigest, ExpandedEntity, ExpandedRelationship, GenId, Generation, Guid, InstanceCategory,
    InstanceDetail, Operation, Provenance, RelationshipDigest, Retrieval, ServerContext, Session,
    TraversalOutcome, TraversalQuery,
};

fn entity(guid: &str, provenance: Provenance) -> ExpandedEntity {
    ExpandedEntity {
        server_name: "cocoMDS1".to_string(),
        platform_name: "platform".to_string(),
        entity_detail: InstanceDetail::bare(guid),
        entity_digest: EntityDigest::new(guid, format!("Label {guid}"), provenance),
    }
}

fn relationship(guid: &str, end1: &str, end2: &str) -> ExpandedRelationship {
    ExpandedRelationship {
        server_name: "cocoMDS1".to_string(),
        platform_name: "platform".to_string(),
        relationship: InstanceDetail::bare(guid),
        relationship_digest: RelationshipDigest::new(guid, end1, end2, "Link", Provenance::Home),
        entity_one_digest: EntityDigest::new(end1, end1, Provenance::Proxy),
        entity_two_digest: EntityDigest::new(end2, end2, Provenance::Proxy),
    }
}

fn traversal(root: &str) -> Generation {
    Generation::new(
        ServerContext::new("cocoMDS1", "platform", false),
        Operation::Traversal(TraversalQuery {
            root: Guid::new(root),
            depth: 1,
            ..TraversalQuery::default()
        }),
    )
}

// =============================================================================
// TIER T0: SINGLE RETRIEVALS
// =============================================================================

mod t0_single_retrievals {
    use super::*;

    /// T0.1: A new entity becomes generation 1 and the focus.
    #[test]
    fn first_entity_is_generation_one() {
        let mut session = Session::new();

        let retrieval = session
            .process_entity(entity("E1", Provenance::Home))
            .expect("process");

        assert_eq!(retrieval, Retrieval::Committed(GenId(1)));
        let generation = session.latest_generation().expect("generation");
        assert_eq!(generation.entities.keys().collect::<Vec<_>>(), vec![&Guid::new("E1")]);
        assert_eq!(session.focus_category(), Some(InstanceCategory::Entity));
        assert_eq!(session.focus_guid(), Some(&Guid::new("E1")));
    }

    /// T0.2: Re-retrieving a known entity adds nothing but refreshes focus.
    #[test]
    fn known_entity_updates_focus_only() {
        let mut session = Session::new();
        session
            .process_entity(entity("E1", Provenance::Home))
            .expect("process");

        let retrieval = session
            .process_entity(entity("E1", Provenance::RefCopy))
            .expect("process");

        assert_eq!(retrieval, Retrieval::Known(GenId(1)));
        assert_eq!(session.latest_active_generation_id(), GenId(1));
        let focused = session.focus_entity().expect("entity focus");
        assert_eq!(focused.entity_digest.provenance, Provenance::RefCopy);
        assert_eq!(focused.entity_digest.generation, Some(GenId(1)));
    }

    /// T0.3: Enterprise provenance marks the generation as enterprise.
    #[test]
    fn enterprise_entity_sets_enterprise_option() {
        let mut session = Session::new();
        session
            .process_entity(entity("E1", Provenance::Enterprise))
            .expect("process");

        let generation = session.latest_generation().expect("generation");
        assert!(generation.origin.enterprise_option);
    }
}

// =============================================================================
// TIER T1: RELATIONSHIP ENDPOINTS
// =============================================================================

mod t1_relationship_endpoints {
    use super::*;

    /// T1.1: Both endpoints unknown: two entities plus the relationship.
    #[test]
    fn unknown_ends_join_the_new_generation() {
        let mut session = Session::new();

        session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");

        let generation = session.latest_generation().expect("generation");
        assert_eq!(generation.entities.len(), 2);
        assert_eq!(generation.relationships.len(), 1);
        assert!(
            generation
                .entities
                .values()
                .map(|d| d.generation)
                .chain(generation.relationships.values().map(|d| d.generation))
                .all(|g| g == Some(GenId(1)))
        );
    }

    /// T1.2: Both endpoints known: only the relationship is added.
    #[test]
    fn known_ends_are_not_duplicated() {
        let mut session = Session::new();
        session
            .process_entity(entity("E1", Provenance::Home))
            .expect("process");
        session
            .process_entity(entity("E2", Provenance::Home))
            .expect("process");

        session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");

        let generation = session.latest_generation().expect("generation");
        assert_eq!(generation.id, GenId(3));
        assert!(generation.entities.is_empty());
        assert_eq!(generation.relationships.len(), 1);
        assert_eq!(session.lookup_generation_id(&Guid::new("E2")), Some(GenId(2)));
    }

    /// T1.3: A known relationship commits nothing.
    #[test]
    fn known_relationship_is_idempotent() {
        let mut session = Session::new();
        session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");

        let retrieval = session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");

        assert_eq!(retrieval, Retrieval::Known(GenId(1)));
        assert_eq!(session.store().len(), 1);
    }
}

// =============================================================================
// TIER T2: TRAVERSALS
// =============================================================================

mod t2_traversals {
    use super::*;

    /// T2.1: Known instances are filtered out of a traversal.
    #[test]
    fn traversal_keeps_only_new_instances() {
        let mut session = Session::new();
        session
            .process_entity(entity("E1", Provenance::Home))
            .expect("process");

        let candidate = traversal("E1")
            .with_entity(EntityDigest::new("E1", "E1", Provenance::Home))
            .with_entity(EntityDigest::new("E2", "E2", Provenance::Home))
            .with_relationship(RelationshipDigest::new(
                "R1",
                "E1",
                "E2",
                "Link",
                Provenance::Home,
            ));
        let outcome = session.process_traversal(candidate).expect("process");

        assert_eq!(outcome, TraversalOutcome::Committed(GenId(2)));
        let generation = session.latest_generation().expect("generation");
        assert_eq!(
            generation.keys().map(Guid::as_str).collect::<Vec<_>>(),
            vec!["E2", "R1"]
        );
        assert_eq!(session.lookup_generation_id(&Guid::new("E1")), Some(GenId(1)));
        assert_eq!(session.focus_guid(), Some(&Guid::new("E1")));
    }

    /// T2.2: A traversal of nothing new commits nothing.
    #[test]
    fn vacuous_traversal_changes_nothing() {
        let mut session = Session::new();
        session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");
        let before = session.snapshot();

        let candidate = traversal("E1")
            .with_entity(EntityDigest::new("E2", "E2", Provenance::Home))
            .with_relationship(RelationshipDigest::new(
                "R1",
                "E1",
                "E2",
                "Link",
                Provenance::Home,
            ));
        let outcome = session.process_traversal(candidate).expect("process");

        assert_eq!(outcome, TraversalOutcome::NothingNew);
        assert_eq!(session.latest_active_generation_id(), GenId(1));
        assert_eq!(*session.snapshot(), *before);
    }
}

// =============================================================================
// TIER T3: UNDO, RESET, RELOAD
// =============================================================================

mod t3_undo_reset_reload {
    use super::*;
    use rex_core::FocusChange;

    /// T3.1: Undo then re-append reproduces the removed id.
    #[test]
    fn undo_then_reappend_reuses_id() {
        let mut session = Session::new();
        session
            .process_entity(entity("E1", Provenance::Home))
            .expect("process");
        session
            .process_entity(entity("E2", Provenance::Home))
            .expect("process");

        let removed = session.remove_latest_generation().expect("pop");
        assert_eq!(removed.id, GenId(2));
        assert!(session.focus().is_none());

        let retrieval = session
            .process_entity(entity("E2", Provenance::Home))
            .expect("process");
        assert_eq!(retrieval, Retrieval::Committed(GenId(2)));
    }

    /// T3.2: Clear always resets to the empty state.
    #[test]
    fn clear_resets_everything() {
        let mut session = Session::new();
        session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");

        session.clear();

        assert_eq!(session.latest_active_generation_id(), GenId::NONE);
        assert!(session.store().generations().is_empty());
        assert!(session.store().index().is_empty());
        assert!(session.focus().is_none());
        assert_eq!(session.epoch(), 1);
    }

    /// T3.3: Reload of a proxy end uses enterprise mode on the original server.
    #[test]
    fn proxy_end_reloads_in_enterprise_mode() {
        let mut session = Session::new();
        session
            .process_relationship(relationship("R1", "E1", "E2"))
            .expect("process");

        let change = session
            .change_focus(InstanceCategory::Entity, &Guid::new("E1"))
            .expect("change");

        let FocusChange::Reload(plan) = change else {
            panic!("expected a reload plan");
        };
        assert_eq!(plan.target.server_name, "cocoMDS1");
        assert!(plan.target.enterprise_mode);
    }

    /// T3.4: History summarises every generation in order.
    #[test]
    fn history_follows_generations() {
        let mut session = Session::new();
        session
            .process_entity(entity("E1", Provenance::Home))
            .expect("process");
        session
            .process_traversal(
                traversal("E1").with_entity(EntityDigest::new("E2", "E2", Provenance::Home)),
            )
            .expect("process");

        let history = session.compile_history();

        assert_eq!(history.len(), 2);
        assert_eq!(
            history[1].query,
            "[cocoMDS1] Local Traversal from entity Label E1 Depth: 1 \
             Entity Type Filters: none Relationship Type Filters: none \
             Classification Filters: none"
        );
    }
}
