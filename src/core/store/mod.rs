//! Policy storage
//!
//! [`PolicyStore`] is the integration point for policy backends. Any
//! implementation must reject duplicate ids on create, treat delete as
//! idempotent, fail `get` of an absent id with `PolicyNotFound`, and keep an
//! absent pattern list distinct from an empty one.
//!
//! The `find_by_*` queries are a cheap pre-filter that narrows the
//! enforcer's candidate set; they use wildcard matching only and never
//! evaluate subjects' conditions. The enforcer queries through
//! [`PolicyStore::find_candidates`] with its matcher's [`PatternSyntax`], so
//! a pattern the matcher would accept is never filtered out.

mod cache;
mod memory;

pub use cache::CachedPolicyStore;
pub use memory::MemoryPolicyStore;

use crate::core::matcher::{wildcard, PatternSyntax};
use crate::core::policy::Policy;
use crate::core::request::Request;
use crate::error::Result;
use std::sync::Arc;

/// Storage contract for policies
pub trait PolicyStore: Send + Sync {
    /// Store a new policy, failing with `PolicyAlreadyExists` on a taken id
    fn create(&self, policy: Arc<Policy>) -> Result<()>;

    /// Insert or replace a policy
    fn update(&self, policy: Arc<Policy>) -> Result<()>;

    /// Fetch a policy by id, failing with `PolicyNotFound` when absent
    fn get(&self, id: &str) -> Result<Arc<Policy>>;

    /// Remove a policy; unknown ids are not an error
    fn delete(&self, id: &str) -> Result<()>;

    fn all(&self) -> Result<Vec<Arc<Policy>>>;

    /// Candidates whose action, resource and scope lists all admit the request
    ///
    /// Patterns are pre-filtered as the store's own syntax (`<` delimited
    /// unless the store says otherwise).
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if action, resource or scope is empty.
    fn find_by_request(&self, request: &Request) -> Result<Vec<Arc<Policy>>> {
        self.find_candidates(request, PatternSyntax::default())
    }

    /// [`find_by_request`](PolicyStore::find_by_request) for patterns written
    /// in `syntax`
    fn find_candidates(
        &self,
        request: &Request,
        syntax: PatternSyntax,
    ) -> Result<Vec<Arc<Policy>>>;

    fn find_by_resource(&self, resource: &str) -> Result<Vec<Arc<Policy>>>;

    fn find_by_scope(&self, scope: &str) -> Result<Vec<Arc<Policy>>>;

    /// Policies with a subject whose type pattern admits `role_id`
    fn find_by_role(&self, role_id: &str) -> Result<Vec<Arc<Policy>>>;
}

impl<T: PolicyStore + ?Sized> PolicyStore for Arc<T> {
    fn create(&self, policy: Arc<Policy>) -> Result<()> {
        (**self).create(policy)
    }

    fn update(&self, policy: Arc<Policy>) -> Result<()> {
        (**self).update(policy)
    }

    fn get(&self, id: &str) -> Result<Arc<Policy>> {
        (**self).get(id)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }

    fn all(&self) -> Result<Vec<Arc<Policy>>> {
        (**self).all()
    }

    fn find_by_request(&self, request: &Request) -> Result<Vec<Arc<Policy>>> {
        (**self).find_by_request(request)
    }

    fn find_candidates(
        &self,
        request: &Request,
        syntax: PatternSyntax,
    ) -> Result<Vec<Arc<Policy>>> {
        (**self).find_candidates(request, syntax)
    }

    fn find_by_resource(&self, resource: &str) -> Result<Vec<Arc<Policy>>> {
        (**self).find_by_resource(resource)
    }

    fn find_by_scope(&self, scope: &str) -> Result<Vec<Arc<Policy>>> {
        (**self).find_by_scope(scope)
    }

    fn find_by_role(&self, role_id: &str) -> Result<Vec<Arc<Policy>>> {
        (**self).find_by_role(role_id)
    }
}

/// Pre-filter one pattern list against a value
///
/// `None` admits everything and `Some([])` admits nothing. A pattern holding
/// the regex start delimiter is always admitted and left to the matcher, as
/// is every pattern of an opaque syntax.
pub fn prefilter(patterns: Option<&[String]>, value: &str, syntax: PatternSyntax) -> bool {
    let Some(list) = patterns else {
        return true;
    };

    match syntax {
        PatternSyntax::Glob => list.iter().any(|p| wildcard(p, value)),
        PatternSyntax::Delimited { start } => list
            .iter()
            .any(|p| p.contains(start) || wildcard(p, value)),
        PatternSyntax::Opaque => !list.is_empty(),
    }
}

/// [`prefilter`] with the default `<` delimiter
pub fn prefilter_default(patterns: Option<&[String]>, value: &str) -> bool {
    prefilter(patterns, value, PatternSyntax::default())
}
