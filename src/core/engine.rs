//! Authorization engine
//!
//! [`Engine`] binds an [`Enforcer`], its policy store, a condition registry
//! and a role manager behind one handle: grant and revoke policies, verify
//! requests, and build requests on behalf of stored roles.

use crate::core::audit::{Auditor, ConsoleAuditor};
use crate::core::condition::{Condition, ConditionRegistry};
use crate::core::config::EngineConfig;
use crate::core::enforcer::{Decision, Enforcer};
use crate::core::matcher::{default_matcher, Matcher};
use crate::core::policy::{Effect, Policy, PolicyDocument, Subject, SubjectBuilder};
use crate::core::request::{Request, RequestBuilder};
use crate::core::role::{MemoryRoleManager, RoleManager};
use crate::core::store::{CachedPolicyStore, MemoryPolicyStore, PolicyStore};
use crate::error::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Authorization engine
///
/// # Examples
///
/// ```
/// use warden_rs::core::engine::Engine;
/// use warden_rs::core::policy::{Policy, Subject};
/// use warden_rs::core::request::Request;
///
/// let engine = Engine::in_memory();
/// engine.grant(
///     Policy::builder("readers")
///         .actions(["read"])
///         .resources(["docs:*"])
///         .subject(Subject::new("user:*"))
///         .allow()
///         .build()
///         .unwrap(),
/// ).unwrap();
///
/// let req = Request::builder()
///     .action("read")
///     .resource("docs:handbook")
///     .scope("default")
///     .subject("user:ada")
///     .build();
/// assert!(engine.verify(&req).is_ok());
///
/// let write = Request::builder()
///     .action("write")
///     .resource("docs:handbook")
///     .scope("default")
///     .subject("user:ada")
///     .build();
/// assert!(engine.verify(&write).unwrap_err().is_denial());
/// ```
pub struct Engine {
    enforcer: Enforcer,
    registry: RwLock<ConditionRegistry>,
    roles: Arc<dyn RoleManager>,
}

impl Engine {
    /// Engine over `store` with default matcher, auditing and effect
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self::builder(store).build()
    }

    /// Engine over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPolicyStore::new()))
    }

    pub fn builder(store: Arc<dyn PolicyStore>) -> EngineBuilder {
        EngineBuilder {
            store,
            matcher: None,
            auditor: None,
            default_effect: Effect::Deny,
            registry: None,
            roles: None,
            cache_ttl: None,
        }
    }

    /// Build an engine from validated configuration
    pub fn from_config(store: Arc<dyn PolicyStore>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::builder(store)
            .matcher(config.build_matcher())
            .auditor(config.build_auditor())
            .default_effect(config.default_effect);
        if let Some(ttl) = config.cache_ttl() {
            builder = builder.cache_ttl(ttl);
        }

        info!(
            matcher = ?config.matcher,
            default_effect = config.default_effect.as_str(),
            cache_ttl_secs = ?config.cache_ttl_secs,
            "authorization engine configured"
        );
        Ok(builder.build())
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        self.enforcer.store()
    }

    pub fn roles(&self) -> &Arc<dyn RoleManager> {
        &self.roles
    }

    /// Succeed if `request` is allowed; denials are `WardenError::Denied`
    pub fn verify(&self, request: &Request) -> Result<()> {
        self.enforcer.enforce(request)
    }

    pub fn decide(&self, request: &Request) -> Result<Decision> {
        self.enforcer.decide(request)
    }

    /// Store a new policy
    pub fn grant(&self, policy: Policy) -> Result<()> {
        debug!(policy = policy.id(), effect = policy.effect().as_str(), "granting policy");
        self.store().create(Arc::new(policy))
    }

    /// Build a policy from its serialized form and store it
    pub fn grant_document(&self, doc: PolicyDocument) -> Result<()> {
        let policy = Policy::from_document(doc, &self.registry.read())?;
        self.grant(policy)
    }

    /// Parse a JSON policy using this engine's condition types
    pub fn policy_from_json(&self, json: &str) -> Result<Policy> {
        Policy::from_json(json, &self.registry.read())
    }

    /// Replace or insert a policy
    pub fn update(&self, policy: Policy) -> Result<()> {
        debug!(policy = policy.id(), "updating policy");
        self.store().update(Arc::new(policy))
    }

    /// Remove a policy; unknown ids succeed
    pub fn revoke(&self, id: &str) -> Result<()> {
        debug!(policy = id, "revoking policy");
        self.store().delete(id)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Policy>> {
        self.store().get(id)
    }

    pub fn list(&self) -> Result<Vec<Arc<Policy>>> {
        self.store().all()
    }

    /// Add a custom condition type; existing keys are never replaced
    pub fn register_condition<F>(&self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Condition> + Send + Sync + 'static,
    {
        self.registry.write().register(name, factory)
    }

    /// Snapshot of the registered condition types
    pub fn condition_registry(&self) -> ConditionRegistry {
        self.registry.read().clone()
    }

    /// Subject builder resolving conditions through this engine's registry
    pub fn subject(&self, kind: impl Into<String>) -> SubjectBuilder {
        Subject::builder(kind).registry(self.condition_registry())
    }

    /// Request builder pre-filled with the effective roles of a stored role
    pub fn request_as(&self, role_id: &str) -> Result<RequestBuilder> {
        let role = self.roles.get(role_id)?;
        Ok(Request::builder().role(&role))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("enforcer", &self.enforcer)
            .field("registry", &*self.registry.read())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Engine`]
pub struct EngineBuilder {
    store: Arc<dyn PolicyStore>,
    matcher: Option<Arc<dyn Matcher>>,
    auditor: Option<Arc<dyn Auditor>>,
    default_effect: Effect,
    registry: Option<ConditionRegistry>,
    roles: Option<Arc<dyn RoleManager>>,
    cache_ttl: Option<Duration>,
}

impl EngineBuilder {
    pub fn matcher(mut self, matcher: Arc<dyn Matcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn auditor(mut self, auditor: Arc<dyn Auditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    pub fn default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = effect;
        self
    }

    pub fn registry(mut self, registry: ConditionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn roles(mut self, roles: Arc<dyn RoleManager>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Put an expiring read cache in front of the store
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn build(self) -> Engine {
        let store: Arc<dyn PolicyStore> = match self.cache_ttl {
            Some(ttl) => Arc::new(CachedPolicyStore::new(self.store, ttl)),
            None => self.store,
        };

        let enforcer = Enforcer::new(store)
            .with_matcher(self.matcher.unwrap_or_else(default_matcher))
            .with_auditor(
                self.auditor
                    .unwrap_or_else(|| Arc::new(ConsoleAuditor::new())),
            )
            .with_default_effect(self.default_effect);

        Engine {
            enforcer,
            registry: RwLock::new(self.registry.unwrap_or_default()),
            roles: self
                .roles
                .unwrap_or_else(|| Arc::new(MemoryRoleManager::new())),
        }
    }
}
