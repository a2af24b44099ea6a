//! # Warden - Embeddable Authorization Decision Engine
//!
//! `warden-rs` decides whether a request (an actor, an action, a resource, a
//! scope and contextual metadata) is allowed by a set of stored policies.
//! It is the access-control kernel a host application calls on every
//! privileged operation:
//!
//! - **Deny overrides**: one matching Deny vetoes any number of Allows
//! - **Safe default**: no matching policy means Deny unless configured otherwise
//! - **Pluggable conditions**: typed predicates over request context, built
//!   from declarative `{name, type, options}` triples
//! - **Two matchers**: wildcard globbing, or delimited regex fragments with a
//!   compile cache
//! - **Role graphs**: sub-role closure feeding request subjects
//! - **Cached stores**: an expiring read-through mirror over any backend
//!
//! ## Quick Start
//!
//! ```rust
//! use warden_rs::{ConditionOptions, Engine, Policy, Request, Result};
//!
//! # fn main() -> Result<()> {
//! let engine = Engine::in_memory();
//!
//! let subject = engine
//!     .subject("svc-a")
//!     .condition(ConditionOptions::new("mfa", "bool").option("value", true))
//!     .build()?;
//!
//! engine.grant(
//!     Policy::builder("db-read")
//!         .resources(["db"])
//!         .actions(["read"])
//!         .scopes(["*"])
//!         .subject(subject)
//!         .allow()
//!         .build()?,
//! )?;
//!
//! let request = Request::builder()
//!     .action("read")
//!     .resource("db")
//!     .scope("prod")
//!     .subject("svc-a")
//!     .context("mfa", true)
//!     .build();
//!
//! engine.verify(&request)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Telling denials from failures
//!
//! ```rust
//! use warden_rs::{Denial, Engine, Request};
//!
//! let engine = Engine::in_memory();
//! let request = Request::builder()
//!     .action("read")
//!     .resource("db")
//!     .scope("prod")
//!     .subject("svc-a")
//!     .build();
//!
//! match engine.verify(&request) {
//!     Ok(()) => unreachable!("nothing grants access"),
//!     Err(e) if e.is_denial() => assert_eq!(e.denial(), Some(&Denial::Implicit)),
//!     Err(e) => panic!("engine failure: {e}"),
//! }
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    audit::{AuditEvent, AuditFilter, Auditor, ChannelAuditor, ConsoleAuditor, NoopAuditor},
    condition::{Condition, ConditionOptions, ConditionRegistry, Conditions},
    config::{EngineConfig, MatcherKind},
    enforcer::{Decision, Enforcer},
    engine::{Engine, EngineBuilder},
    matcher::{Matcher, PatternSyntax, RegexMatcher, WildcardMatcher},
    policy::{Effect, Policy, PolicyBuilder, PolicyDocument, Subject, SubjectDocument},
    request::{Request, RequestBuilder},
    role::{MemoryRoleManager, Role, RoleManager},
    store::{CachedPolicyStore, MemoryPolicyStore, PolicyStore},
};
pub use crate::error::{Denial, Result, WardenError};
