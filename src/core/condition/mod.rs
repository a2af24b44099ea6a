//! Pluggable conditions evaluated against request context
//!
//! Conditions allow fine-grained control based on request metadata:
//! - A [`ConditionRegistry`] maps a type key to a factory producing a fresh,
//!   default-configured [`Condition`]
//! - [`ConditionOptions`] (`{name, type, options}`) describe one condition
//!   declaratively; [`Conditions::from_options`] builds the named set
//! - [`Conditions::meets`] is the conjunction of every condition, each fed the
//!   context value stored under its own name
//!
//! Built-in types: `bool`, `string_equals_condition`, `cidr_condition`,
//! `subject_equals`.

mod builtin;

pub use builtin::{BoolCondition, CidrCondition, StringEqualsCondition, SubjectEqualsCondition};

use super::request::Request;
use crate::error::{Result, WardenError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A typed predicate over one context value
pub trait Condition: Send + Sync + fmt::Debug {
    /// Registry type key of this condition
    fn name(&self) -> &str;

    /// Evaluate the condition against `value` (`Null` when absent from context)
    fn meets(&self, value: &Value, request: &Request) -> bool;

    /// Apply declarative options to a freshly constructed instance
    ///
    /// Conditions that take options override this; unknown keys are ignored
    /// and incompatible value types are an error. The default accepts only
    /// an empty map.
    fn configure(&mut self, options: &Map<String, Value>) -> Result<()> {
        if options.is_empty() {
            return Ok(());
        }
        Err(WardenError::InvalidConditionOptions {
            name: self.name().to_string(),
            reason: "condition takes no options".to_string(),
        })
    }

    /// Current configuration in the same shape `configure` accepts
    fn options(&self) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }
}

/// Decode an options map into a condition's configuration struct
pub fn decode_options<T: DeserializeOwned>(name: &str, options: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        WardenError::InvalidConditionOptions {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Encode a condition's configuration struct as an options map
pub fn encode_options<T: Serialize>(config: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(config)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Ok(Map::from_iter([("value".to_string(), other)])),
    }
}

/// Factory producing a default-configured condition
pub type ConditionFactory = Arc<dyn Fn() -> Box<dyn Condition> + Send + Sync>;

/// Named condition factories
#[derive(Clone)]
pub struct ConditionRegistry {
    factories: HashMap<String, ConditionFactory>,
}

impl ConditionRegistry {
    /// Create a registry seeded with the built-in condition types
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.seed::<BoolCondition>(BoolCondition::NAME);
        registry.seed::<StringEqualsCondition>(StringEqualsCondition::NAME);
        registry.seed::<CidrCondition>(CidrCondition::NAME);
        registry.seed::<SubjectEqualsCondition>(SubjectEqualsCondition::NAME);
        registry
    }

    /// Create a registry with no condition types
    pub fn empty() -> Self {
        ConditionRegistry {
            factories: HashMap::new(),
        }
    }

    fn seed<C: Condition + Default + 'static>(&mut self, name: &str) {
        self.factories.insert(
            name.to_string(),
            Arc::new(|| Box::new(C::default()) as Box<dyn Condition>),
        );
    }

    /// Register a factory under `name`
    ///
    /// # Errors
    ///
    /// Returns `ConditionAlreadyRegistered` if the key is taken; existing
    /// entries are never overwritten.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Condition> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(WardenError::ConditionAlreadyRegistered(name));
        }

        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Register a `Default`-constructible condition type under `name`
    pub fn register_default<C: Condition + Default + 'static>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<()> {
        self.register(name, || Box::new(C::default()) as Box<dyn Condition>)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered type keys, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate and configure a condition from its declarative form
    pub fn build(&self, options: &ConditionOptions) -> Result<Box<dyn Condition>> {
        let factory = self
            .factories
            .get(&options.kind)
            .ok_or_else(|| WardenError::UnknownConditionType(options.kind.clone()))?;

        let mut condition = factory();
        if !options.options.is_empty() {
            condition.configure(&options.options)?;
        }

        Ok(condition)
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("types", &self.names())
            .finish()
    }
}

/// Declarative description of one named condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionOptions {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl ConditionOptions {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        ConditionOptions {
            name: name.into(),
            kind: kind.into(),
            options: Map::new(),
        }
    }

    /// Set one option value
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Named set of conditions, all of which must hold
#[derive(Debug, Default)]
pub struct Conditions {
    entries: BTreeMap<String, Box<dyn Condition>>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a condition set from declarative options
    ///
    /// # Errors
    ///
    /// - `UnknownConditionType` if a type key is not registered
    /// - `InvalidConditionOptions` if options fail to decode
    /// - `DuplicateConditionName` if two entries share a name
    pub fn from_options(options: &[ConditionOptions], registry: &ConditionRegistry) -> Result<Self> {
        let mut conditions = Conditions::new();
        for opts in options {
            conditions.insert(opts.name.clone(), registry.build(opts)?)?;
        }
        Ok(conditions)
    }

    /// Add a named condition
    pub fn insert(&mut self, name: impl Into<String>, condition: Box<dyn Condition>) -> Result<()> {
        match self.entries.entry(name.into()) {
            btree_map::Entry::Occupied(entry) => {
                Err(WardenError::DuplicateConditionName(entry.key().clone()))
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(condition);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Condition> {
        self.entries.get(name).map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Condition)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// True when every condition holds for `request`; vacuously true when empty
    pub fn meets(&self, request: &Request) -> bool {
        self.entries
            .iter()
            .all(|(name, condition)| condition.meets(request.context_value(name), request))
    }

    /// Declarative form of this set, in name order
    pub fn to_options(&self) -> Result<Vec<ConditionOptions>> {
        self.entries
            .iter()
            .map(|(name, condition)| -> Result<ConditionOptions> {
                Ok(ConditionOptions {
                    name: name.clone(),
                    kind: condition.name().to_string(),
                    options: condition.options()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Always(bool);

    impl Condition for Always {
        fn name(&self) -> &str {
            "always"
        }

        fn meets(&self, _value: &Value, _request: &Request) -> bool {
            self.0
        }
    }

    fn request_with(key: &str, value: Value) -> Request {
        Request::builder().context(key, value).build()
    }

    #[test]
    fn test_default_registry_types() {
        let registry = ConditionRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["bool", "cidr_condition", "string_equals_condition", "subject_equals"]
        );
    }

    #[test]
    fn test_register_never_overwrites() {
        let mut registry = ConditionRegistry::new();
        let err = registry
            .register("bool", || Box::new(Always(true)) as Box<dyn Condition>)
            .unwrap_err();
        assert!(matches!(err, WardenError::ConditionAlreadyRegistered(ref n) if n == "bool"));

        registry
            .register("always", || Box::new(Always(true)) as Box<dyn Condition>)
            .unwrap();
        assert!(registry.contains("always"));
    }

    #[test]
    fn test_unknown_type() {
        let registry = ConditionRegistry::new();
        let err = Conditions::from_options(&[ConditionOptions::new("x", "geo")], &registry)
            .unwrap_err();
        assert!(matches!(err, WardenError::UnknownConditionType(ref t) if t == "geo"));
    }

    #[test]
    fn test_options_type_mismatch_is_error() {
        let registry = ConditionRegistry::new();
        let opts = ConditionOptions::new("mfa", "bool").option("value", "yes");
        let err = Conditions::from_options(&[opts], &registry).unwrap_err();
        assert!(matches!(err, WardenError::InvalidConditionOptions { .. }));
    }

    #[test]
    fn test_unknown_option_keys_ignored() {
        let registry = ConditionRegistry::new();
        let opts = ConditionOptions::new("mfa", "bool")
            .option("value", true)
            .option("comment", "ignored");
        let conds = Conditions::from_options(&[opts], &registry).unwrap();
        assert!(conds.meets(&request_with("mfa", json!(true))));
    }

    #[test]
    fn test_options_rejected_without_configure() {
        let mut registry = ConditionRegistry::new();
        registry
            .register("always", || Box::new(Always(true)) as Box<dyn Condition>)
            .unwrap();

        let bare = ConditionOptions::new("gate", "always");
        assert!(Conditions::from_options(&[bare], &registry).is_ok());

        let opts = ConditionOptions::new("gate", "always").option("value", false);
        let err = Conditions::from_options(&[opts], &registry).unwrap_err();
        assert!(matches!(
            err,
            WardenError::InvalidConditionOptions { ref name, .. } if name == "always"
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let registry = ConditionRegistry::new();
        let opts = vec![
            ConditionOptions::new("mfa", "bool").option("value", true),
            ConditionOptions::new("mfa", "bool").option("value", false),
        ];
        let err = Conditions::from_options(&opts, &registry).unwrap_err();
        assert!(matches!(err, WardenError::DuplicateConditionName(ref n) if n == "mfa"));
    }

    #[test]
    fn test_empty_set_is_vacuously_true() {
        assert!(Conditions::new().meets(&Request::default()));
    }

    #[test]
    fn test_conjunction() {
        let mut conds = Conditions::new();
        conds.insert("a", Box::new(Always(true))).unwrap();
        conds.insert("b", Box::new(Always(false))).unwrap();
        assert!(!conds.meets(&Request::default()));

        let mut conds = Conditions::new();
        conds.insert("b", Box::new(Always(false))).unwrap();
        conds.insert("a", Box::new(Always(true))).unwrap();
        assert!(!conds.meets(&Request::default()));
    }

    #[test]
    fn test_context_lookup_by_condition_name() {
        let registry = ConditionRegistry::new();
        let opts = vec![
            ConditionOptions::new("mfa", "bool").option("value", true),
            ConditionOptions::new("tier", "string_equals_condition").option("equals", "gold"),
        ];
        let conds = Conditions::from_options(&opts, &registry).unwrap();

        let ok = Request::builder()
            .context("mfa", true)
            .context("tier", "gold")
            .build();
        assert!(conds.meets(&ok));

        let missing = Request::builder().context("mfa", true).build();
        assert!(!conds.meets(&missing));
    }

    #[test]
    fn test_to_options_roundtrip() {
        let registry = ConditionRegistry::new();
        let opts = vec![
            ConditionOptions::new("mfa", "bool").option("value", true),
            ConditionOptions::new("net", "cidr_condition").option("cidr", "10.0.0.0/8"),
        ];
        let conds = Conditions::from_options(&opts, &registry).unwrap();
        let back = conds.to_options().unwrap();

        assert_eq!(back[0].name, "mfa");
        assert_eq!(back[0].options.get("value"), Some(&json!(true)));
        assert_eq!(back[1].kind, "cidr_condition");
        assert_eq!(back[1].options.get("cidr"), Some(&json!("10.0.0.0/8")));
    }
}
