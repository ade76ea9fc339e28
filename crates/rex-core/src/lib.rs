//! # rex-core
//!
//! The generation-indexed instance graph for Rex - THE LOGIC.
//!
//! This crate accumulates entities and relationships retrieved from a
//! metadata repository during one exploration session. Each retrieval that
//! discovers something new becomes a generation; generations can be undone
//! one at a time, newest first.
//!
//! ## Architectural Constraints
//!
//! - No async, no network: the binary issues requests and hands the decoded
//!   responses in
//! - `BTreeMap` everywhere so iteration order is stable
//! - Session state is an immutable snapshot replaced as a whole

// =============================================================================
// MODULES
// =============================================================================

pub mod focus;
pub mod generation;
pub mod history;
pub mod ingestor;
pub mod payload;
pub mod primitives;
pub mod query;
pub mod reload;
pub mod session;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use types::{EntityDigest, GenId, Guid, InstanceCategory, Provenance, RelationshipDigest, RexError};

pub use focus::{Focus, FocusChange};
pub use generation::{Generation, Operation, ServerContext, TraversalQuery};
pub use history::{HistoryCompiler, HistoryEntry, HistoryInstance};
pub use ingestor::{Retrieval, RetrievalProcessor, TraversalOutcome};
pub use payload::{
    EntityResponse, ExpandedEntity, ExpandedRelationship, InstanceDetail, RelationshipResponse,
    SearchSelection, TraversalPayload, TraversalResponse,
};
pub use query::{ExploreFilters, RepositoryQuery, TraversalRequest};
pub use reload::{ReloadPlan, ReloadResolver, ReloadTarget};
pub use session::{RetrievalTicket, Session, SessionState};
pub use store::GenerationStore;
