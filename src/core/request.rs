//! Authorization requests
//!
//! A request is built per call and never stored: the action being attempted,
//! the resource and scope it targets, the identifiers describing the caller,
//! and free-form context metadata consulted by conditions.

use super::role::Role;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// A single access request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    action: String,
    resource: String,
    scope: String,
    subjects: BTreeSet<String>,
    context: Map<String, Value>,
    deadline: Option<Instant>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Identifiers describing the caller (role ids, principal claims)
    pub fn subjects(&self) -> &BTreeSet<String> {
        &self.subjects
    }

    pub fn has_subject(&self, id: &str) -> bool {
        self.subjects.contains(id)
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Context value under `key`, `Value::Null` when absent
    pub fn context_value(&self, key: &str) -> &Value {
        self.context.get(key).unwrap_or(&Value::Null)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the request deadline, if any, has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.request.action = action.into();
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.request.resource = resource.into();
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.request.scope = scope.into();
        self
    }

    /// Add one subject identifier
    pub fn subject(mut self, id: impl Into<String>) -> Self {
        self.request.subjects.insert(id.into());
        self
    }

    pub fn subjects<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.subjects.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Add every effective role id of `role` as a subject identifier
    pub fn role(mut self, role: &Role) -> Self {
        self.request.subjects.extend(role.effective_role_ids());
        self
    }

    /// Set one context entry
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.context.insert(key.into(), value.into());
        self
    }

    /// Replace the whole context map
    pub fn context_map(mut self, context: Map<String, Value>) -> Self {
        self.request.context = context;
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.request.deadline = Some(deadline);
        self
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_builder_fields() {
        let req = Request::builder()
            .action("read")
            .resource("db")
            .scope("prod")
            .subject("svc-a")
            .subject("svc-a")
            .context("mfa", true)
            .context("source_ip", "10.0.0.4")
            .build();

        assert_eq!(req.action(), "read");
        assert_eq!(req.resource(), "db");
        assert_eq!(req.scope(), "prod");
        assert_eq!(req.subjects().len(), 1);
        assert!(req.has_subject("svc-a"));
        assert_eq!(req.context_value("mfa"), &json!(true));
        assert_eq!(req.context_value("source_ip"), &json!("10.0.0.4"));
    }

    #[test]
    fn test_missing_context_is_null() {
        let req = Request::builder().action("read").build();
        assert_eq!(req.context_value("nope"), &Value::Null);
    }

    #[test]
    fn test_role_expands_to_subjects() {
        let reader = Arc::new(Role::new("reader"));
        let mut editor = Role::new("editor");
        editor.add_role(reader).unwrap();

        let req = Request::builder().role(&editor).build();

        assert!(req.has_subject("editor"));
        assert!(req.has_subject("reader"));
    }

    #[test]
    fn test_deadline() {
        let req = Request::builder().build();
        assert!(!req.is_expired());

        let req = Request::builder().deadline(Instant::now()).build();
        assert!(req.is_expired());

        let req = Request::builder().timeout(Duration::from_secs(60)).build();
        assert!(!req.is_expired());
    }
}
