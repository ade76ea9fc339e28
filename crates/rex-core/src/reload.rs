//! # Reload Resolution
//!
//! Decides how an already-known instance must be fetched again, from the
//! provenance recorded in its digest and the server context of the
//! generation that introduced it.

use crate::query::RepositoryQuery;
use crate::{Guid, InstanceCategory, Provenance, RexError, ServerContext};
use serde::{Deserialize, Serialize};

/// Server, platform and mode to use for a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadTarget {
    pub server_name: String,
    pub platform_name: String,
    pub enterprise_mode: bool,
}

impl ReloadTarget {
    /// The target as a server context for the reload request.
    #[must_use]
    pub fn context(&self) -> ServerContext {
        ServerContext::new(
            self.server_name.clone(),
            self.platform_name.clone(),
            self.enterprise_mode,
        )
    }
}

/// A reload that is ready to be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadPlan {
    pub category: InstanceCategory,
    pub guid: Guid,
    pub target: ReloadTarget,
}

impl ReloadPlan {
    /// The repository query that performs this reload.
    #[must_use]
    pub fn query(&self) -> RepositoryQuery {
        RepositoryQuery::instance(self.category, self.guid.clone(), self.target.enterprise_mode)
    }
}

/// Stateless resolver from provenance to reload target.
pub struct ReloadResolver;

impl ReloadResolver {
    /// Resolve the reload target.
    ///
    /// | provenance | enterprise mode |
    /// |---|---|
    /// | home | false |
    /// | refCopy | as the original retrieval |
    /// | proxy | true |
    /// | ent | true |
    ///
    /// Server and platform always come from `origin`. Any other provenance
    /// fails with `UnrecognizedProvenance`.
    pub fn resolve(
        provenance: &Provenance,
        origin: &ServerContext,
    ) -> Result<ReloadTarget, RexError> {
        let enterprise_mode = match provenance {
            Provenance::Home => false,
            Provenance::RefCopy => origin.enterprise_option,
            Provenance::Proxy | Provenance::Enterprise => true,
            Provenance::Unrecognized(tag) => {
                return Err(RexError::UnrecognizedProvenance(tag.clone()));
            }
        };
        Ok(ReloadTarget {
            server_name: origin.server_name.clone(),
            platform_name: origin.platform_name.clone(),
            enterprise_mode,
        })
    }

    /// Resolve and wrap the target in a plan for the given instance.
    pub fn plan(
        category: InstanceCategory,
        guid: Guid,
        provenance: &Provenance,
        origin: &ServerContext,
    ) -> Result<ReloadPlan, RexError> {
        let target = Self::resolve(provenance, origin)?;
        Ok(ReloadPlan {
            category,
            guid,
            target,
        })
    }
}
