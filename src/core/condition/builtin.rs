//! Built-in condition types

use super::{decode_options, encode_options, Condition};
use crate::core::request::Request;
use crate::error::Result;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;

/// Context value must be exactly the configured boolean
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoolCondition {
    pub value: bool,
}

impl BoolCondition {
    pub const NAME: &'static str = "bool";

    pub fn new(value: bool) -> Self {
        BoolCondition { value }
    }
}

impl Condition for BoolCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meets(&self, value: &Value, _request: &Request) -> bool {
        value.as_bool() == Some(self.value)
    }

    fn configure(&mut self, options: &Map<String, Value>) -> Result<()> {
        *self = decode_options(Self::NAME, options)?;
        Ok(())
    }

    fn options(&self) -> Result<Map<String, Value>> {
        encode_options(self)
    }
}

/// Context value must be a string exactly equal to the configured one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringEqualsCondition {
    pub equals: String,
}

impl StringEqualsCondition {
    pub const NAME: &'static str = "string_equals_condition";

    pub fn new(equals: impl Into<String>) -> Self {
        StringEqualsCondition {
            equals: equals.into(),
        }
    }
}

impl Condition for StringEqualsCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meets(&self, value: &Value, _request: &Request) -> bool {
        value.as_str() == Some(self.equals.as_str())
    }

    fn configure(&mut self, options: &Map<String, Value>) -> Result<()> {
        *self = decode_options(Self::NAME, options)?;
        Ok(())
    }

    fn options(&self) -> Result<Map<String, Value>> {
        encode_options(self)
    }
}

/// Context value must be an IP address inside the configured CIDR block
///
/// A block or address that fails to parse is a non-match, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CidrCondition {
    pub cidr: String,
}

impl CidrCondition {
    pub const NAME: &'static str = "cidr_condition";

    pub fn new(cidr: impl Into<String>) -> Self {
        CidrCondition { cidr: cidr.into() }
    }
}

impl Condition for CidrCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meets(&self, value: &Value, _request: &Request) -> bool {
        let Some(addr) = value.as_str() else {
            return false;
        };

        match (self.cidr.parse::<IpNet>(), addr.parse::<IpAddr>()) {
            (Ok(net), Ok(ip)) => net.contains(&ip),
            _ => false,
        }
    }

    fn configure(&mut self, options: &Map<String, Value>) -> Result<()> {
        *self = decode_options(Self::NAME, options)?;
        Ok(())
    }

    fn options(&self) -> Result<Map<String, Value>> {
        encode_options(self)
    }
}

/// Context value must list claims the requester presents
///
/// The value must be an array of strings, each of which appears in the
/// request's subject identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectEqualsCondition;

impl SubjectEqualsCondition {
    pub const NAME: &'static str = "subject_equals";
}

impl Condition for SubjectEqualsCondition {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meets(&self, value: &Value, request: &Request) -> bool {
        let Some(required) = value.as_array() else {
            return false;
        };

        required
            .iter()
            .all(|claim| claim.as_str().is_some_and(|c| request.has_subject(c)))
    }
}
