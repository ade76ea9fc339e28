//! # Exploration Primitives
//!
//! Fixed constants shared by the core and the binary: repository paths,
//! operation labels used when reporting failures, and input limits.

/// Depth of every neighborhood exploration. Explore is always one hop.
pub const EXPLORE_DEPTH: u32 = 1;

/// The only `relatedHTTPCode` treated as success.
pub const HTTP_OK: u16 = 200;

// =============================================================================
// REPOSITORY PATHS
// =============================================================================

/// Path for retrieving an entity by GUID.
pub const ENTITY_PATH: &str = "instances/entity";

/// Path for retrieving a relationship by GUID.
pub const RELATIONSHIP_PATH: &str = "instances/relationship";

/// Path for a neighborhood traversal.
pub const TRAVERSAL_PATH: &str = "instances/traversal";

// =============================================================================
// OPERATION LABELS
// =============================================================================

/// Failure label for an entity retrieval.
pub const GET_ENTITY_LABEL: &str = "get entity";

/// Failure label for a relationship retrieval.
pub const GET_RELATIONSHIP_LABEL: &str = "get relationship";

/// Failure label for a neighborhood exploration.
pub const EXPLORE_LABEL: &str = "explore neighborhood around entity";

/// Advisory shown when a traversal contained nothing that was not already known.
pub const NOTHING_NEW_NOTICE: &str = "No additional objects were returned in the traversal";

/// History summary for a generation whose operation is not recognised.
pub const UNRECOGNISED_OPERATION_SUMMARY: &str = "Operation not recognised!";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for a GUID accepted from a caller.
pub const MAX_GUID_LENGTH: usize = 256;

/// Maximum number of names in a single exploration filter list.
pub const MAX_FILTER_NAMES: usize = 1000;
