//! Policy enforcement with deny precedence
//!
//! Evaluates the stored policies against one request:
//! - Candidates come from the store's indexed pre-filter
//! - A policy votes only when its action, resource and scope lists match and
//!   one of its subjects matches the caller with every condition met
//! - The first Deny vote ends evaluation immediately
//! - With no votes at all, the configured default effect decides

use crate::core::audit::{Auditor, ConsoleAuditor};
use crate::core::matcher::{default_matcher, Matcher};
use crate::core::policy::{Effect, Policy};
use crate::core::request::Request;
use crate::core::store::PolicyStore;
use crate::error::{Denial, Result, WardenError};
use std::sync::Arc;
use tracing::debug;

/// Terminal outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// At least one Allow vote and no Deny vote, or default effect Allow
    Allowed,
    /// A matching policy voted Deny
    DeniedExplicit { policy_id: String },
    /// No policy voted and the default effect is Deny
    DeniedImplicit,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Map to `Ok(())` or the matching `Denied` error
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::DeniedExplicit { policy_id } => {
                Err(WardenError::Denied(Denial::Explicit { policy_id }))
            }
            Decision::DeniedImplicit => Err(WardenError::Denied(Denial::Implicit)),
        }
    }
}

/// Stateless decision maker over a policy store
#[derive(Clone)]
pub struct Enforcer {
    store: Arc<dyn PolicyStore>,
    matcher: Arc<dyn Matcher>,
    auditor: Arc<dyn Auditor>,
    default_effect: Effect,
}

impl Enforcer {
    /// Create an enforcer with the regex matcher, console auditing and
    /// default effect Deny
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Enforcer {
            store,
            matcher: default_matcher(),
            auditor: Arc::new(ConsoleAuditor::new()),
            default_effect: Effect::Deny,
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn Matcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_auditor(mut self, auditor: Arc<dyn Auditor>) -> Self {
        self.auditor = auditor;
        self
    }

    /// Effect applied when no policy votes
    pub fn with_default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = effect;
        self
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    pub fn matcher(&self) -> &Arc<dyn Matcher> {
        &self.matcher
    }

    pub fn default_effect(&self) -> Effect {
        self.default_effect
    }

    /// Succeed if the request is allowed
    ///
    /// # Errors
    ///
    /// - `Denied(Denial::Explicit)` when a matching policy denies
    /// - `Denied(Denial::Implicit)` when nothing matched and the default is Deny
    /// - any store, pattern or deadline error raised during evaluation
    pub fn enforce(&self, request: &Request) -> Result<()> {
        self.decide(request)?.into_result()
    }

    /// Evaluate the request and return its decision
    pub fn decide(&self, request: &Request) -> Result<Decision> {
        self.auditor.log_request(request);

        if request.is_expired() {
            return Err(WardenError::DeadlineExceeded);
        }

        let candidates = self
            .store
            .find_candidates(request, self.matcher.syntax())?;

        if request.is_expired() {
            return Err(WardenError::DeadlineExceeded);
        }

        let mut allowed_by: Option<&str> = None;
        for policy in &candidates {
            match self.vote(policy, request)? {
                Some(Effect::Deny) => {
                    debug!(
                        action = request.action(),
                        resource = request.resource(),
                        scope = request.scope(),
                        policy = policy.id(),
                        "request denied by policy"
                    );
                    self.auditor.log_policy_effect(request, Effect::Deny);
                    return Ok(Decision::DeniedExplicit {
                        policy_id: policy.id().to_string(),
                    });
                }
                Some(Effect::Allow) => {
                    if allowed_by.is_none() {
                        allowed_by = Some(policy.id());
                    }
                }
                None => {}
            }
        }

        if let Some(policy) = allowed_by {
            debug!(
                action = request.action(),
                resource = request.resource(),
                scope = request.scope(),
                policy,
                "request allowed"
            );
            self.auditor.log_policy_effect(request, Effect::Allow);
            return Ok(Decision::Allowed);
        }

        debug!(
            action = request.action(),
            resource = request.resource(),
            scope = request.scope(),
            candidates = candidates.len(),
            default_effect = self.default_effect.as_str(),
            "no policy matched"
        );
        self.auditor.log_policy_effect(request, self.default_effect);
        Ok(match self.default_effect {
            Effect::Allow => Decision::Allowed,
            Effect::Deny => Decision::DeniedImplicit,
        })
    }

    /// The effect `policy` votes for `request`, or `None` if it does not apply
    pub fn vote(&self, policy: &Policy, request: &Request) -> Result<Option<Effect>> {
        if !self.matcher.matches(policy.actions(), request.action())?
            || !self.matcher.matches(policy.resources(), request.resource())?
            || !self.matcher.matches(policy.scopes(), request.scope())?
        {
            return Ok(None);
        }

        for subject in policy.subjects() {
            if subject.is_satisfied_by(self.matcher.as_ref(), request)? {
                return Ok(Some(policy.effect()));
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enforcer")
            .field("matcher", &self.matcher)
            .field("default_effect", &self.default_effect)
            .finish_non_exhaustive()
    }
}
