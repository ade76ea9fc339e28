//! # Query Module
//!
//! Request shapes issued to the repository.
//!
//! - One variant per retrieval the explorer can make
//! - Each query knows its path, its JSON body and its failure label
//! - Traversals are always depth 1

use crate::primitives::{
    ENTITY_PATH, EXPLORE_DEPTH, EXPLORE_LABEL, GET_ENTITY_LABEL, GET_RELATIONSHIP_LABEL,
    MAX_FILTER_NAMES, RELATIONSHIP_PATH, TRAVERSAL_PATH,
};
use crate::{Guid, InstanceCategory, RexError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Type and classification filters applied to an exploration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreFilters {
    #[serde(default)]
    pub entity_type_guids: Vec<String>,
    #[serde(default)]
    pub relationship_type_guids: Vec<String>,
    #[serde(default)]
    pub classification_names: Vec<String>,
}

impl ExploreFilters {
    /// Reject filter lists longer than the accepted maximum.
    pub fn validate(&self) -> Result<(), RexError> {
        for (name, list) in [
            ("entityTypeGUIDs", &self.entity_type_guids),
            ("relationshipTypeGUIDs", &self.relationship_type_guids),
            ("classificationNames", &self.classification_names),
        ] {
            if list.len() > MAX_FILTER_NAMES {
                return Err(RexError::InvalidRequest(format!(
                    "{name} holds {} names (max {MAX_FILTER_NAMES})",
                    list.len()
                )));
            }
        }
        Ok(())
    }
}

/// A depth-limited traversal rooted at one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalRequest {
    pub root: Guid,
    pub depth: u32,
    pub filters: ExploreFilters,
    pub enterprise_option: Option<bool>,
}

/// A request the explorer can send to the repository.
///
/// `enterprise_option: None` means "use whatever the selected server context
/// says"; reloads always carry an explicit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryQuery {
    Entity {
        guid: Guid,
        enterprise_option: Option<bool>,
    },
    Relationship {
        guid: Guid,
        enterprise_option: Option<bool>,
    },
    Traversal(TraversalRequest),
}

impl RepositoryQuery {
    /// Entity retrieval helper.
    #[must_use]
    pub fn entity(guid: impl Into<Guid>) -> Self {
        Self::Entity {
            guid: guid.into(),
            enterprise_option: None,
        }
    }

    /// Relationship retrieval helper.
    #[must_use]
    pub fn relationship(guid: impl Into<Guid>) -> Self {
        Self::Relationship {
            guid: guid.into(),
            enterprise_option: None,
        }
    }

    /// Retrieval of an instance of the given category with a fixed mode.
    #[must_use]
    pub fn instance(category: InstanceCategory, guid: Guid, enterprise_option: bool) -> Self {
        match category {
            InstanceCategory::Entity => Self::Entity {
                guid,
                enterprise_option: Some(enterprise_option),
            },
            InstanceCategory::Relationship => Self::Relationship {
                guid,
                enterprise_option: Some(enterprise_option),
            },
        }
    }

    /// One-hop exploration around an entity.
    #[must_use]
    pub fn explore(root: Guid, filters: ExploreFilters) -> Self {
        Self::Traversal(TraversalRequest {
            root,
            depth: EXPLORE_DEPTH,
            filters,
            enterprise_option: None,
        })
    }

    /// Repository path, relative to the API root.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Entity { .. } => ENTITY_PATH,
            Self::Relationship { .. } => RELATIONSHIP_PATH,
            Self::Traversal(_) => TRAVERSAL_PATH,
        }
    }

    /// Label reported to the failure sink when this query fails.
    #[must_use]
    pub fn operation_label(&self) -> &'static str {
        match self {
            Self::Entity { .. } => GET_ENTITY_LABEL,
            Self::Relationship { .. } => GET_RELATIONSHIP_LABEL,
            Self::Traversal(_) => EXPLORE_LABEL,
        }
    }

    /// Enterprise mode this query will run under.
    #[must_use]
    pub fn enterprise_option(&self, selected: bool) -> bool {
        let explicit = match self {
            Self::Entity {
                enterprise_option, ..
            }
            | Self::Relationship {
                enterprise_option, ..
            } => *enterprise_option,
            Self::Traversal(request) => request.enterprise_option,
        };
        explicit.unwrap_or(selected)
    }

    /// JSON body, resolving an unset enterprise mode to `selected`.
    #[must_use]
    pub fn body(&self, selected: bool) -> Value {
        let enterprise_option = self.enterprise_option(selected);
        match self {
            Self::Entity { guid, .. } => json!({
                "entityGUID": guid,
                "enterpriseOption": enterprise_option,
            }),
            Self::Relationship { guid, .. } => json!({
                "relationshipGUID": guid,
                "enterpriseOption": enterprise_option,
            }),
            Self::Traversal(request) => json!({
                "entityGUID": request.root,
                "depth": request.depth,
                "entityTypeGUIDs": request.filters.entity_type_guids,
                "relationshipTypeGUIDs": request.filters.relationship_type_guids,
                "classificationNames": request.filters.classification_names,
                "enterpriseOption": enterprise_option,
            }),
        }
    }
}
