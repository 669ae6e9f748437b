//! Provider-side contract of the OpenFeature evaluation API.
use serde::{Deserialize, Serialize};

use crate::{EvaluationContext, Result};

/// Type of value the caller expects a flag to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagValueType {
    /// `bool`.
    Boolean,
    /// `String`.
    String,
    /// `i64`.
    Integer,
    /// `f64`.
    Float,
    /// Structured JSON value.
    Object,
}

/// OpenFeature error codes attached to a resolution that fell back to the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    /// The provider has not been initialized yet.
    ProviderNotReady,
    /// The flag could not be found.
    FlagNotFound,
    /// The flag value could not be parsed.
    ParseError,
    /// The flag value does not match the expected type.
    TypeMismatch,
    /// The provider requires a targeting key which was not supplied.
    TargetingKeyMissing,
    /// The evaluation context does not meet provider requirements.
    InvalidContext,
    /// Any other error.
    General,
}

/// Why a value was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Reason {
    /// The value was the result of a targeting rule match.
    TargetingMatch,
    /// The value was the flag's configured default.
    Default,
    /// The caller's default value was returned because of an error.
    Error,
}

/// Structured error attached to a [`ResolutionDetails`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionError {
    /// Error category.
    pub code: ErrorCode,
    /// Human readable description. For Flipt this is the raw evaluation reason.
    pub message: String,
}

impl ResolutionError {
    /// Create an error with `code` and `message`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of resolving a single flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionDetails<T> {
    /// Resolved value, or the caller's default when `error` is set.
    pub value: T,
    /// Key of the variant the value came from, if any.
    pub variant: Option<String>,
    /// Why the value was returned.
    pub reason: Option<Reason>,
    /// Set when the value is the caller's default.
    pub error: Option<ResolutionError>,
}

impl<T> ResolutionDetails<T> {
    /// A successful resolution carrying `value`.
    pub fn from_success(value: T) -> Self {
        Self {
            value,
            variant: None,
            reason: None,
            error: None,
        }
    }

    /// A resolution that fell back to `default_value` because of `error`.
    pub fn from_error(default_value: T, error: ResolutionError) -> Self {
        Self {
            value: default_value,
            variant: None,
            reason: Some(Reason::Error),
            error: Some(error),
        }
    }

    /// Record the variant the value came from.
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Record why the value was returned.
    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Return `true` if the value is the caller's default because of an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Descriptive information about a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    /// Provider name.
    pub name: &'static str,
}

/// A feature flag provider: resolves typed flag values for an [`EvaluationContext`].
///
/// A flag the backend did not resolve is reported as `Ok` with [`ResolutionDetails::error`]
/// set and the default value returned. `Err` is reserved for failures the caller must handle
/// (network errors, malformed values).
pub trait FeatureProvider {
    /// Information about the provider.
    fn metadata(&self) -> &ProviderMetadata;

    /// Resolve a boolean flag.
    fn resolve_boolean_value(
        &self,
        flag_key: &str,
        default_value: bool,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<bool>>;

    /// Resolve a string flag.
    fn resolve_string_value(
        &self,
        flag_key: &str,
        default_value: String,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<String>>;

    /// Resolve an integer flag.
    fn resolve_integer_value(
        &self,
        flag_key: &str,
        default_value: i64,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<i64>>;

    /// Resolve a floating point flag.
    fn resolve_float_value(
        &self,
        flag_key: &str,
        default_value: f64,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<f64>>;

    /// Resolve a structured (JSON) flag.
    fn resolve_object_value(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<serde_json::Value>>;
}
