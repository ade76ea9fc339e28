//! # Focus
//!
//! The single instance currently selected by the user. Category, GUID and
//! full instance are one value, so they can only change together.

use crate::payload::{ExpandedEntity, ExpandedRelationship};
use crate::reload::ReloadPlan;
use crate::{Guid, InstanceCategory};
use std::sync::Arc;

/// The selected instance, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Focus {
    #[default]
    None,
    Entity(Arc<ExpandedEntity>),
    Relationship(Arc<ExpandedRelationship>),
}

impl Focus {
    /// GUID of the focus instance.
    #[must_use]
    pub fn guid(&self) -> Option<&Guid> {
        match self {
            Self::None => None,
            Self::Entity(entity) => Some(entity.guid()),
            Self::Relationship(relationship) => Some(relationship.guid()),
        }
    }

    /// Category of the focus instance.
    #[must_use]
    pub fn category(&self) -> Option<InstanceCategory> {
        match self {
            Self::None => None,
            Self::Entity(_) => Some(InstanceCategory::Entity),
            Self::Relationship(_) => Some(InstanceCategory::Relationship),
        }
    }

    /// The focus entity, only when an entity is focused.
    #[must_use]
    pub fn entity(&self) -> Option<&Arc<ExpandedEntity>> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// The focus relationship, only when a relationship is focused.
    #[must_use]
    pub fn relationship(&self) -> Option<&Arc<ExpandedRelationship>> {
        match self {
            Self::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }

    /// Check whether nothing is focused.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Check whether the given GUID is the focus.
    #[must_use]
    pub fn is(&self, guid: &Guid) -> bool {
        self.guid() == Some(guid)
    }
}

/// Result of asking to change focus to a known GUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusChange {
    /// The GUID was already the focus; focus is now cleared.
    Deselected,
    /// The GUID is known; issue this reload and focus the result.
    Reload(ReloadPlan),
    /// The GUID is not in the graph; nothing to do.
    Unknown,
}
