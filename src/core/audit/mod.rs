//! Audit trail for authorization decisions
//!
//! The enforcer reports every request it receives and every effect it
//! settles on through an [`Auditor`]. Auditing is a side channel:
//! - Calls never fail and never block the decision
//! - Events carry action, resource, scope and subjects, never context values
//! - [`ConsoleAuditor`] is the default; it writes `tracing` events under the
//!   `warden::audit` target
//! - [`ChannelAuditor`] pushes [`AuditEvent`]s into a bounded crossbeam
//!   channel and counts what it has to drop

use crate::core::policy::Effect;
use crate::core::request::Request;
use chrono::{DateTime, Utc};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Target used by [`ConsoleAuditor`]
pub const AUDIT_TARGET: &str = "warden::audit";

/// Sink for audit events
pub trait Auditor: Send + Sync {
    /// A request entered the enforcer
    fn log_request(&self, request: &Request);

    /// The enforcer settled on `effect` for `request`
    fn log_policy_effect(&self, request: &Request, effect: Effect);
}

/// Which audit events reach the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditFilter {
    /// Requests and decisions
    #[default]
    All,
    /// Decisions only
    Decisions,
    /// Deny decisions only
    Denials,
    /// Nothing
    None,
}

impl AuditFilter {
    pub fn admits(&self, kind: AuditKind, effect: Option<Effect>) -> bool {
        match self {
            AuditFilter::All => true,
            AuditFilter::Decisions => kind == AuditKind::Decision,
            AuditFilter::Denials => effect == Some(Effect::Deny),
            AuditFilter::None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Request,
    Decision,
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub action: String,
    pub resource: String,
    pub scope: String,
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

impl AuditEvent {
    /// Snapshot the auditable parts of `request`
    pub fn new(kind: AuditKind, request: &Request, effect: Option<Effect>) -> Self {
        AuditEvent {
            timestamp: Utc::now(),
            kind,
            action: request.action().to_string(),
            resource: request.resource().to_string(),
            scope: request.scope().to_string(),
            subjects: request.subjects().iter().cloned().collect(),
            effect,
        }
    }
}

/// Auditor that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditor;

impl Auditor for NoopAuditor {
    fn log_request(&self, _request: &Request) {}

    fn log_policy_effect(&self, _request: &Request, _effect: Effect) {}
}

/// Auditor writing structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleAuditor {
    filter: AuditFilter,
}

impl ConsoleAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: AuditFilter) -> Self {
        ConsoleAuditor { filter }
    }

    pub fn filter(&self) -> AuditFilter {
        self.filter
    }
}

impl Auditor for ConsoleAuditor {
    fn log_request(&self, request: &Request) {
        if !self.filter.admits(AuditKind::Request, None) {
            return;
        }
        info!(
            target: AUDIT_TARGET,
            action = request.action(),
            resource = request.resource(),
            scope = request.scope(),
            subjects = ?request.subjects(),
            "request received"
        );
    }

    fn log_policy_effect(&self, request: &Request, effect: Effect) {
        if !self.filter.admits(AuditKind::Decision, Some(effect)) {
            return;
        }
        info!(
            target: AUDIT_TARGET,
            action = request.action(),
            resource = request.resource(),
            scope = request.scope(),
            subjects = ?request.subjects(),
            effect = effect.as_str(),
            "policy effect"
        );
    }
}

/// Auditor forwarding events to a bounded channel
///
/// Sending uses `try_send`: when the buffer is full or the receiver is gone
/// the event is dropped and counted.
#[derive(Debug)]
pub struct ChannelAuditor {
    sender: Sender<AuditEvent>,
    filter: AuditFilter,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl ChannelAuditor {
    /// Create an auditor with room for `capacity` pending events
    pub fn bounded(capacity: usize) -> (Self, Receiver<AuditEvent>) {
        Self::with_filter(capacity, AuditFilter::All)
    }

    pub fn with_filter(capacity: usize, filter: AuditFilter) -> (Self, Receiver<AuditEvent>) {
        let (sender, receiver) = bounded(capacity);
        let auditor = ChannelAuditor {
            sender,
            filter,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        };
        (auditor, receiver)
    }

    /// Events handed to the channel
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Events lost to a full buffer or a closed receiver
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn emit(&self, event: AuditEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Auditor for ChannelAuditor {
    fn log_request(&self, request: &Request) {
        if self.filter.admits(AuditKind::Request, None) {
            self.emit(AuditEvent::new(AuditKind::Request, request, None));
        }
    }

    fn log_policy_effect(&self, request: &Request, effect: Effect) {
        if self.filter.admits(AuditKind::Decision, Some(effect)) {
            self.emit(AuditEvent::new(AuditKind::Decision, request, Some(effect)));
        }
    }
}
