//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::explorer::Outcome;
use rex_core::{
    ExpandedEntity, ExpandedRelationship, Focus, GenId, Generation, Guid, HistoryEntry,
    InstanceCategory, RexError, ServerContext, SessionState, primitives::MAX_GUID_LENGTH,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Session status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub latest_generation: u32,
    pub generation_count: usize,
    pub entity_count: usize,
    pub relationship_count: usize,
    pub focus: Option<Guid>,
    pub epoch: u64,
    pub server: ServerContext,
}

impl StatusResponse {
    pub fn new(state: &SessionState, server: ServerContext) -> Self {
        Self {
            latest_generation: state.store.latest_active_generation_id().value(),
            generation_count: state.store.len(),
            entity_count: state.store.entity_count(),
            relationship_count: state.store.relationship_count(),
            focus: state.focus.guid().cloned(),
            epoch: state.epoch,
            server,
        }
    }
}

// =============================================================================
// GENERATIONS / HISTORY
// =============================================================================

/// All generations, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationsResponse {
    pub latest_generation: u32,
    pub generations: Vec<Generation>,
}

impl GenerationsResponse {
    pub fn new(state: &SessionState) -> Self {
        Self {
            latest_generation: state.store.latest_active_generation_id().value(),
            generations: state
                .store
                .generations()
                .iter()
                .map(|generation| (**generation).clone())
                .collect(),
        }
    }
}

/// Compiled history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

// =============================================================================
// FOCUS
// =============================================================================

/// The current focus, with its full expanded detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusResponse {
    pub category: Option<InstanceCategory>,
    pub guid: Option<Guid>,
    pub generation: Option<GenId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entity: Option<ExpandedEntity>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relationship: Option<ExpandedRelationship>,
}

impl FocusResponse {
    pub fn new(state: &SessionState) -> Self {
        let guid = state.focus.guid().cloned();
        let generation = guid
            .as_ref()
            .and_then(|guid| state.store.lookup_generation_id(guid));
        match &state.focus {
            Focus::None => Self::default(),
            Focus::Entity(entity) => Self {
                category: Some(InstanceCategory::Entity),
                guid,
                generation,
                entity: Some((**entity).clone()),
                relationship: None,
            },
            Focus::Relationship(relationship) => Self {
                category: Some(InstanceCategory::Relationship),
                guid,
                generation,
                entity: None,
                relationship: Some((**relationship).clone()),
            },
        }
    }
}

// =============================================================================
// GUID REQUEST
// =============================================================================

/// Request naming one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidRequest {
    pub guid: String,
}

impl GuidRequest {
    /// Validate and convert to a `Guid`.
    ///
    /// Rejects empty GUIDs and GUIDs longer than `MAX_GUID_LENGTH` bytes.
    pub fn to_guid(&self) -> Result<Guid, RexError> {
        let trimmed = self.guid.trim();
        if trimmed.is_empty() {
            return Err(RexError::InvalidRequest("GUID must not be empty".to_string()));
        }
        if trimmed.len() > MAX_GUID_LENGTH {
            return Err(RexError::InvalidRequest(format!(
                "GUID length {} exceeds maximum {} bytes",
                trimmed.len(),
                MAX_GUID_LENGTH
            )));
        }
        Ok(Guid::new(trimmed))
    }
}

// =============================================================================
// SERVER REQUEST
// =============================================================================

/// Server selection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRequest {
    pub server_name: String,
    pub platform_name: String,
    #[serde(default)]
    pub enterprise_option: bool,
}

impl ServerRequest {
    /// Validate and convert to a `ServerContext`.
    pub fn to_context(&self) -> Result<ServerContext, RexError> {
        if self.server_name.trim().is_empty() || self.platform_name.trim().is_empty() {
            return Err(RexError::InvalidRequest(
                "serverName and platformName are required".to_string(),
            ));
        }
        Ok(ServerContext::new(
            self.server_name.trim(),
            self.platform_name.trim(),
            self.enterprise_option,
        ))
    }
}

// =============================================================================
// ACTION RESPONSES
// =============================================================================

/// Response to any action that may change the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub outcome: Option<Outcome>,
    pub latest_generation: u32,
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn success(outcome: Outcome, latest: GenId) -> Self {
        Self {
            success: !matches!(outcome, Outcome::Failed { .. }),
            outcome: Some(outcome),
            latest_generation: latest.value(),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            latest_generation: 0,
            error: Some(msg.into()),
        }
    }
}

/// Undo response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResponse {
    pub removed: Option<GenId>,
    pub latest_generation: u32,
}
