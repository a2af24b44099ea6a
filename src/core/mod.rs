//! Authorization core
//!
//! Components, leaves first:
//!
//! - [`matcher`] - Pattern-set matching (wildcard, delimited regex)
//! - [`condition`] - Condition registry and built-in condition types
//! - [`role`] - Hierarchical roles and the role manager
//! - [`request`] - Per-call access requests
//! - [`policy`] - Policies, subjects and their serialized form
//! - [`store`] - Policy storage and the expiring cache decorator
//! - [`audit`] - Audit sinks
//! - [`enforcer`] - The deny-overrides decision algorithm
//! - [`config`] - Engine configuration
//! - [`engine`] - Facade tying the above together
//!
//! ## Architecture
//!
//! ```text
//! Request ──> Engine::verify ──> Enforcer::decide
//!                                   │
//!                                   ├─> PolicyStore::find_candidates   (pre-filter)
//!                                   ├─> Matcher: action/resource/scope
//!                                   ├─> Subject type + Conditions::meets
//!                                   └─> deny overrides / default effect
//! ```

pub mod audit;
pub mod condition;
pub mod config;
pub mod enforcer;
pub mod engine;
pub mod matcher;
pub mod policy;
pub mod request;
pub mod role;
pub mod store;
