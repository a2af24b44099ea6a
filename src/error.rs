use thiserror::Error;

/// Outcome of an enforcement pass that refused the request.
///
/// Denials are a normal business result, not an engine fault. They carry just
/// enough to audit the decision and nothing from the policy's condition options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("request denied explicitly by policy {policy_id}")]
    Explicit { policy_id: String },

    #[error("request denied: no policy allowed access")]
    Implicit,
}

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("unknown condition type {0}, is it registered?")]
    UnknownConditionType(String),

    #[error("condition type already registered: {0}")]
    ConditionAlreadyRegistered(String),

    #[error("duplicate condition name in subject: {0}")]
    DuplicateConditionName(String),

    #[error("invalid options for condition {name}: {reason}")]
    InvalidConditionOptions { name: String, reason: String },

    #[error("invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0} must not be empty")]
    InvalidRequest(&'static str),

    #[error("policy {0} already registered")]
    PolicyAlreadyExists(String),

    #[error("policy {0} does not exist")]
    PolicyNotFound(String),

    #[error("role {0} already registered")]
    RoleAlreadyExists(String),

    #[error("role {0} does not exist")]
    RoleNotFound(String),

    #[error("role {0} cannot contain itself")]
    SelfReference(String),

    #[error("role {parent} already contains subrole {child}")]
    DuplicateSubrole { parent: String, child: String },

    #[error("adding subrole {child} to {parent} would create a cycle")]
    RoleCycle { parent: String, child: String },

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Denied(#[from] Denial),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WardenError {
    /// True when the error is an access decision rather than a malfunction.
    pub fn is_denial(&self) -> bool {
        matches!(self, WardenError::Denied(_))
    }

    /// The denial carried by this error, if any.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            WardenError::Denied(denial) => Some(denial),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;
