use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Attributes of the evaluated subject.
pub type Attributes = HashMap<String, AttributeValue>;

/// Value of a single context attribute.
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A number. Integers are stored as `f64`.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An explicitly unset value.
    Null,
}
impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl AttributeValue {
    /// Render the value the way Flipt expects context values: as a string.
    ///
    /// Returns `None` for [`AttributeValue::Null`].
    fn to_context_value(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            AttributeValue::Number(n) => Some(n.to_string()),
            AttributeValue::Boolean(b) => Some(b.to_string()),
            AttributeValue::Null => None,
        }
    }
}

/// Per-request evaluation context: an optional targeting key identifying the subject plus
/// arbitrary attributes used by targeting rules.
///
/// ```
/// # use openfeature_flipt::EvaluationContext;
/// let context = EvaluationContext::new()
///     .with_targeting_key("user-1")
///     .with_attribute("plan", "enterprise")
///     .with_attribute("seats", 20_i64);
/// assert_eq!(context.targeting_key(), Some("user-1"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    #[serde(default)]
    targeting_key: Option<String>,
    #[serde(default)]
    attributes: Attributes,
}

impl EvaluationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key of the subject the flag is evaluated for.
    pub fn with_targeting_key(mut self, targeting_key: impl Into<String>) -> Self {
        self.targeting_key = Some(targeting_key.into());
        self
    }

    /// Add an attribute, replacing any previous value for `key`.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Key of the subject the flag is evaluated for, if set.
    pub fn targeting_key(&self) -> Option<&str> {
        self.targeting_key.as_deref()
    }

    /// All attributes, including `Null` ones.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attributes as the plain string mapping sent to Flipt. `Null` attributes are dropped.
    pub fn context_map(&self) -> HashMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), value.to_context_value()?)))
            .collect()
    }
}
