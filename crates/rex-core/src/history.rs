//! # History
//!
//! Read-only, human-readable description of every generation in a store.
//! Nothing here mutates state.

use crate::primitives::UNRECOGNISED_OPERATION_SUMMARY;
use crate::store::GenerationStore;
use crate::{GenId, Generation, Guid, InstanceCategory, Operation, Provenance, TraversalQuery};
use serde::{Deserialize, Serialize};

/// One instance listed under a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryInstance {
    pub category: InstanceCategory,
    pub label: String,
    pub guid: Guid,
    pub provenance: Provenance,
}

/// Summary of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "gen")]
    pub generation: GenId,
    pub query: String,
    pub instances: Vec<HistoryInstance>,
}

/// Builds history entries from a store.
pub struct HistoryCompiler;

impl HistoryCompiler {
    /// One entry per generation, in ascending id order.
    #[must_use]
    pub fn compile(store: &GenerationStore) -> Vec<HistoryEntry> {
        store
            .generations()
            .iter()
            .map(|generation| HistoryEntry {
                generation: generation.id,
                query: Self::summarize(store, generation),
                instances: Self::instances(generation),
            })
            .collect()
    }

    /// One-line description of the query that produced a generation.
    #[must_use]
    pub fn summarize(store: &GenerationStore, generation: &Generation) -> String {
        let mode = if generation.origin.enterprise_option {
            "Enterprise"
        } else {
            "Local"
        };
        let prefix = format!("[{}] {}", generation.origin.server_name, mode);

        match &generation.operation {
            Operation::GetEntity => format!("{prefix} Entity retrieval using GUID"),
            Operation::GetRelationship => format!("{prefix} Relationship retrieval using GUID"),
            Operation::Traversal(query) => {
                format!("{prefix} {}", Self::traversal_summary(store, query))
            }
            Operation::EntitySearch { search_text } => {
                format!("{prefix} Entity Search: Expression [{search_text}]")
            }
            Operation::RelationshipSearch { search_text } => {
                format!("{prefix} Relationship Search: Expression [{search_text}]")
            }
            Operation::Unrecognized => {
                tracing::warn!(
                    generation = generation.id.value(),
                    "generation carries an unrecognised operation"
                );
                UNRECOGNISED_OPERATION_SUMMARY.to_string()
            }
        }
    }

    fn traversal_summary(store: &GenerationStore, query: &TraversalQuery) -> String {
        let root = match store.entity_digest(&query.root) {
            Some(digest) => digest.label.clone(),
            None => {
                tracing::warn!(root = %query.root, "traversal root is no longer known");
                query.root.to_string()
            }
        };
        format!(
            "Traversal from entity {root} Depth: {} Entity Type Filters: {} Relationship Type Filters: {} Classification Filters: {}",
            query.depth,
            names(query.entity_type_names.as_deref()),
            names(query.relationship_type_names.as_deref()),
            names(query.classification_names.as_deref()),
        )
    }

    fn instances(generation: &Generation) -> Vec<HistoryInstance> {
        let entities = generation.entities.values().map(|digest| {
            listed(
                generation.id,
                InstanceCategory::Entity,
                &digest.label,
                &digest.entity_guid,
                &digest.provenance,
            )
        });
        let relationships = generation.relationships.values().map(|digest| {
            listed(
                generation.id,
                InstanceCategory::Relationship,
                &digest.label,
                &digest.relationship_guid,
                &digest.provenance,
            )
        });
        entities.chain(relationships).collect()
    }
}

fn listed(
    generation: GenId,
    category: InstanceCategory,
    label: &str,
    guid: &Guid,
    provenance: &Provenance,
) -> HistoryInstance {
    if let Provenance::Unrecognized(tag) = provenance {
        tracing::warn!(
            generation = generation.value(),
            guid = %guid,
            "Unknown value {} for instance provenance was encountered",
            tag
        );
    }
    HistoryInstance {
        category,
        label: label.to_string(),
        guid: guid.clone(),
        provenance: provenance.clone(),
    }
}

fn names(list: Option<&[String]>) -> String {
    match list {
        Some(list) if !list.is_empty() => list.join(", "),
        _ => "none".to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
