//! # Repository Payloads
//!
//! Response shapes consumed from the repository. Every response carries a
//! `relatedHTTPCode`; anything other than 200, or a missing payload field,
//! is a repository failure.
//!
//! Instance details are kept as opaque JSON maps next to their GUID. Only the
//! digests are interpreted by the core.

use crate::primitives::{EXPLORE_DEPTH, HTTP_OK};
use crate::{
    EntityDigest, Generation, Guid, InstanceCategory, Operation, RelationshipDigest, RexError,
    ServerContext, TraversalQuery,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Full detail of an instance. Only the GUID is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDetail {
    pub guid: Guid,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl InstanceDetail {
    /// Detail carrying nothing but a GUID.
    #[must_use]
    pub fn bare(guid: impl Into<Guid>) -> Self {
        Self {
            guid: guid.into(),
            properties: Map::new(),
        }
    }
}

/// An entity as returned by a get-entity call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedEntity {
    pub server_name: String,
    pub platform_name: String,
    pub entity_detail: InstanceDetail,
    pub entity_digest: EntityDigest,
}

impl ExpandedEntity {
    /// GUID of the entity, taken from its digest.
    #[must_use]
    pub fn guid(&self) -> &Guid {
        &self.entity_digest.entity_guid
    }
}

/// A relationship as returned by a get-relationship call, with digests of
/// both end entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedRelationship {
    pub server_name: String,
    pub platform_name: String,
    pub relationship: InstanceDetail,
    pub relationship_digest: RelationshipDigest,
    pub entity_one_digest: EntityDigest,
    pub entity_two_digest: EntityDigest,
}

impl ExpandedRelationship {
    /// GUID of the relationship, taken from its digest.
    #[must_use]
    pub fn guid(&self) -> &Guid {
        &self.relationship_digest.relationship_guid
    }
}

// =============================================================================
// RESPONSE ENVELOPES
// =============================================================================

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RexError> {
    serde_json::from_value(value).map_err(|e| RexError::SerializationError(e.to_string()))
}

fn checked<T>(code: Option<u16>, payload: Option<T>, field: &'static str) -> Result<T, RexError> {
    match code {
        Some(HTTP_OK) => payload.ok_or(RexError::MissingPayload(field)),
        Some(status) => Err(RexError::RepositoryFailure { status }),
        None => Err(RexError::MissingPayload("relatedHTTPCode")),
    }
}

/// Envelope of a get-entity response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
    #[serde(rename = "relatedHTTPCode", default)]
    pub related_http_code: Option<u16>,
    #[serde(default)]
    pub expanded_entity_detail: Option<ExpandedEntity>,
}

impl EntityResponse {
    /// Decode and validate a raw response.
    pub fn parse(value: Value) -> Result<ExpandedEntity, RexError> {
        let response: Self = decode(value)?;
        checked(
            response.related_http_code,
            response.expanded_entity_detail,
            "expandedEntityDetail",
        )
    }
}

/// Envelope of a get-relationship response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResponse {
    #[serde(rename = "relatedHTTPCode", default)]
    pub related_http_code: Option<u16>,
    #[serde(default)]
    pub expanded_relationship: Option<ExpandedRelationship>,
}

impl RelationshipResponse {
    /// Decode and validate a raw response.
    pub fn parse(value: Value) -> Result<ExpandedRelationship, RexError> {
        let response: Self = decode(value)?;
        checked(
            response.related_http_code,
            response.expanded_relationship,
            "expandedRelationship",
        )
    }
}

/// Envelope of a traversal response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResponse {
    #[serde(rename = "relatedHTTPCode", default)]
    pub related_http_code: Option<u16>,
    #[serde(default)]
    pub rex_traversal: Option<TraversalPayload>,
}

impl TraversalResponse {
    /// Decode and validate a raw response.
    pub fn parse(value: Value) -> Result<TraversalPayload, RexError> {
        let response: Self = decode(value)?;
        checked(
            response.related_http_code,
            response.rex_traversal,
            "rexTraversal",
        )
    }
}

// =============================================================================
// TRAVERSALS AND SEARCH SELECTIONS
// =============================================================================

/// The neighborhood of an entity, already reduced to digests.
///
/// Server fields are optional; when absent, the context the request was sent
/// under is recorded instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalPayload {
    #[serde(default)]
    pub entities: BTreeMap<Guid, EntityDigest>,
    #[serde(default)]
    pub relationships: BTreeMap<Guid, RelationshipDigest>,
    #[serde(rename = "entityGUID", default)]
    pub entity_guid: Guid,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub entity_type_names: Option<Vec<String>>,
    #[serde(default)]
    pub relationship_type_names: Option<Vec<String>>,
    #[serde(default)]
    pub classification_names: Option<Vec<String>>,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub platform_name: Option<String>,
    #[serde(default)]
    pub enterprise_option: Option<bool>,
}

impl TraversalPayload {
    /// Convert into a candidate generation tagged as a traversal.
    #[must_use]
    pub fn into_generation(self, requested: &ServerContext) -> Generation {
        let origin = ServerContext {
            server_name: self
                .server_name
                .unwrap_or_else(|| requested.server_name.clone()),
            platform_name: self
                .platform_name
                .unwrap_or_else(|| requested.platform_name.clone()),
            enterprise_option: self
                .enterprise_option
                .unwrap_or(requested.enterprise_option),
        };
        let operation = Operation::Traversal(TraversalQuery {
            root: self.entity_guid,
            depth: self.depth.unwrap_or(EXPLORE_DEPTH),
            entity_type_names: self.entity_type_names,
            relationship_type_names: self.relationship_type_names,
            classification_names: self.classification_names,
        });

        keyed_by_digest(Generation::new(origin, operation), self.entities, self.relationships)
    }
}

/// Instances a user picked from a search result list.
///
/// Committed like a traversal, but recorded as a search in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSelection {
    pub server_name: String,
    pub platform_name: String,
    #[serde(default)]
    pub enterprise_option: bool,
    pub search_category: InstanceCategory,
    pub search_text: String,
    #[serde(default)]
    pub entities: BTreeMap<Guid, EntityDigest>,
    #[serde(default)]
    pub relationships: BTreeMap<Guid, RelationshipDigest>,
}

impl SearchSelection {
    /// Convert into a candidate generation tagged with the search operation.
    #[must_use]
    pub fn into_generation(self) -> Generation {
        let operation = match self.search_category {
            InstanceCategory::Entity => Operation::EntitySearch {
                search_text: self.search_text,
            },
            InstanceCategory::Relationship => Operation::RelationshipSearch {
                search_text: self.search_text,
            },
        };
        let origin = ServerContext::new(
            self.server_name,
            self.platform_name,
            self.enterprise_option,
        );

        keyed_by_digest(Generation::new(origin, operation), self.entities, self.relationships)
    }
}

/// Wire maps are keyed by whatever the server sent; the index is keyed by the
/// GUID inside each digest.
fn keyed_by_digest(
    mut generation: Generation,
    entities: BTreeMap<Guid, EntityDigest>,
    relationships: BTreeMap<Guid, RelationshipDigest>,
) -> Generation {
    for digest in entities.into_values() {
        generation.insert_entity(digest);
    }
    for digest in relationships.into_values() {
        generation.insert_relationship(digest);
    }
    generation
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Provenance;
    use serde_json::json;

    fn entity_json(guid: &str, provenance: &str) -> Value {
        json!({
            "relatedHTTPCode": 200,
            "expandedEntityDetail": {
                "serverName": "cocoMDS1",
                "platformName": "platform",
                "entityDetail": { "guid": guid, "version": 3 },
                "entityDigest": {
                    "entityGUID": guid,
                    "label": "Customer",
                    "provenance": provenance
                }
            }
        })
    }

    #[test]
    fn entity_response_parses() {
        let entity = EntityResponse::parse(entity_json("e-1", "home")).expect("parse");
        assert_eq!(entity.guid().as_str(), "e-1");
        assert_eq!(entity.entity_digest.provenance, Provenance::Home);
        assert_eq!(entity.entity_detail.properties.get("version"), Some(&json!(3)));
    }

    #[test]
    fn non_200_is_a_failure() {
        let raw = json!({ "relatedHTTPCode": 404, "exceptionErrorMessage": "not found" });
        assert_eq!(
            EntityResponse::parse(raw),
            Err(RexError::RepositoryFailure { status: 404 })
        );
    }

    #[test]
    fn missing_payload_is_a_failure() {
        let raw = json!({ "relatedHTTPCode": 200 });
        assert_eq!(
            RelationshipResponse::parse(raw),
            Err(RexError::MissingPayload("expandedRelationship"))
        );
    }

    #[test]
    fn traversal_falls_back_to_request_context() {
        let raw = json!({
            "relatedHTTPCode": 200,
            "rexTraversal": {
                "entityGUID": "e-1",
                "depth": 1,
                "entities": {
                    "e-2": { "entityGUID": "e-2", "label": "Neighbor", "provenance": "home" }
                },
                "relationships": {}
            }
        });
        let payload = TraversalResponse::parse(raw).expect("parse");
        let requested = ServerContext::new("cocoMDS2", "platform", true);
        let generation = payload.into_generation(&requested);

        assert_eq!(generation.origin, requested);
        assert_eq!(generation.entities.len(), 1);
        assert!(matches!(
            generation.operation,
            Operation::Traversal(ref query) if query.root.as_str() == "e-1" && query.depth == 1
        ));
    }

    #[test]
    fn search_selection_records_search_operation() {
        let selection = SearchSelection {
            server_name: "cocoMDS1".to_string(),
            platform_name: "platform".to_string(),
            enterprise_option: false,
            search_category: InstanceCategory::Relationship,
            search_text: "Contains.*".to_string(),
            entities: BTreeMap::new(),
            relationships: BTreeMap::new(),
        };
        let generation = selection.into_generation();
        assert_eq!(
            generation.operation,
            Operation::RelationshipSearch {
                search_text: "Contains.*".to_string()
            }
        );
    }

    #[test]
    fn candidate_is_keyed_by_digest_guid() {
        let raw = json!({
            "relatedHTTPCode": 200,
            "rexTraversal": {
                "entityGUID": "e-1",
                "entities": {
                    "slot-0": { "entityGUID": "e-2", "label": "Neighbor", "provenance": "home" }
                },
                "relationships": {
                    "slot-1": {
                        "relationshipGUID": "r-1", "end1GUID": "e-1", "end2GUID": "e-2",
                        "label": "Contains", "provenance": "home"
                    }
                }
            }
        });
        let payload = TraversalResponse::parse(raw).expect("parse");
        let generation = payload.into_generation(&ServerContext::default());

        let keys: Vec<_> = generation.keys().map(Guid::as_str).collect();
        assert_eq!(keys, vec!["e-2", "r-1"]);
        assert!(!generation.contains(&Guid::new("slot-0")));
    }
}
