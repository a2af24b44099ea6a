//! Expiring read-through cache over a policy store
//!
//! [`CachedPolicyStore`] keeps an in-memory mirror in front of a slower
//! backend. Only `get` reads the mirror; the `find_*` queries and `all`
//! always go to the wrapped store. Writes reach both synchronously.
//!
//! The mirror and its expiry live behind one mutex as a generation. A reset
//! swaps in a fresh generation atomically, so a `get` either sees the old
//! mirror or the new one, never a half-reset state. Every write through the
//! cache bumps the generation's write count; a `get` only promotes what it
//! read from the backend if neither the generation nor the write count moved
//! while it was reading.

use super::{MemoryPolicyStore, PolicyStore};
use crate::core::matcher::PatternSyntax;
use crate::core::policy::Policy;
use crate::core::request::Request;
use crate::error::{Result, WardenError};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct Generation {
    mirror: Arc<MemoryPolicyStore>,
    expires_at: Instant,
    number: u64,
    writes: u64,
}

impl Generation {
    fn fresh(ttl: Duration, number: u64) -> Self {
        Generation {
            mirror: Arc::new(MemoryPolicyStore::new()),
            expires_at: Instant::now() + ttl,
            number,
            writes: 0,
        }
    }
}

/// Caching decorator for any [`PolicyStore`]
pub struct CachedPolicyStore<S> {
    inner: S,
    ttl: Duration,
    generation: Mutex<Generation>,
}

impl<S: PolicyStore> CachedPolicyStore<S> {
    /// Wrap `inner`; the mirror is discarded `ttl` after each reset
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedPolicyStore {
            inner,
            ttl,
            generation: Mutex::new(Generation::fresh(ttl, 0)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of resets since construction
    pub fn generation(&self) -> u64 {
        self.generation.lock().number
    }

    /// Policies currently held by the mirror
    pub fn cached_len(&self) -> usize {
        self.generation.lock().mirror.len()
    }

    /// Discard the mirror now
    pub fn reset(&self) {
        let mut gen = self.generation.lock();
        let next = gen.number + 1;
        *gen = Generation::fresh(self.ttl, next);
        debug!(generation = next, "policy cache reset");
    }

    /// Lock the current generation, resetting first if it has expired
    fn current(&self) -> MutexGuard<'_, Generation> {
        let mut gen = self.generation.lock();
        if Instant::now() >= gen.expires_at {
            let next = gen.number + 1;
            *gen = Generation::fresh(self.ttl, next);
            debug!(generation = next, "policy cache expired");
        }
        gen
    }

    /// Apply a write to the mirror and stamp it
    fn record_write<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&MemoryPolicyStore) -> Result<()>,
    {
        let mut gen = self.current();
        gen.writes += 1;
        apply(&gen.mirror)
    }
}

impl<S: PolicyStore> PolicyStore for CachedPolicyStore<S> {
    fn create(&self, policy: Arc<Policy>) -> Result<()> {
        self.inner.create(policy.clone())?;
        self.record_write(|mirror| mirror.update(policy))
    }

    fn update(&self, policy: Arc<Policy>) -> Result<()> {
        self.inner.update(policy.clone())?;
        self.record_write(|mirror| mirror.update(policy))
    }

    fn get(&self, id: &str) -> Result<Arc<Policy>> {
        let (mirror, number, writes) = {
            let gen = self.current();
            (gen.mirror.clone(), gen.number, gen.writes)
        };

        match mirror.get(id) {
            Ok(policy) => Ok(policy),
            Err(WardenError::PolicyNotFound(_)) => {
                let policy = self.inner.get(id)?;

                let gen = self.generation.lock();
                if gen.number == number && gen.writes == writes {
                    gen.mirror.update(policy.clone())?;
                } else {
                    debug!(policy = id, "skipping promotion after concurrent write");
                }
                Ok(policy)
            }
            Err(e) => Err(e),
        }
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id)?;
        self.record_write(|mirror| mirror.delete(id))
    }

    fn all(&self) -> Result<Vec<Arc<Policy>>> {
        self.inner.all()
    }

    fn find_by_request(&self, request: &Request) -> Result<Vec<Arc<Policy>>> {
        self.inner.find_by_request(request)
    }

    fn find_candidates(
        &self,
        request: &Request,
        syntax: PatternSyntax,
    ) -> Result<Vec<Arc<Policy>>> {
        self.inner.find_candidates(request, syntax)
    }

    fn find_by_resource(&self, resource: &str) -> Result<Vec<Arc<Policy>>> {
        self.inner.find_by_resource(resource)
    }

    fn find_by_scope(&self, scope: &str) -> Result<Vec<Arc<Policy>>> {
        self.inner.find_by_scope(scope)
    }

    fn find_by_role(&self, role_id: &str) -> Result<Vec<Arc<Policy>>> {
        self.inner.find_by_role(role_id)
    }
}
