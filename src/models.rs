//! Wire types of Flipt's REST evaluation API.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Flipt resolved the flag by matching a rule or rollout.
pub const MATCH_EVALUATION_REASON: &str = "MATCH_EVALUATION_REASON";
/// Flipt resolved the flag to its configured default.
pub const DEFAULT_EVALUATION_REASON: &str = "DEFAULT_EVALUATION_REASON";

/// Body of `POST /evaluate/v1/{boolean,variant}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EvaluationRequest<'a> {
    pub namespace_key: &'a str,
    pub flag_key: &'a str,
    pub entity_id: &'a str,
    pub context: &'a HashMap<String, String>,
}

/// Result of a boolean flag evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanEvaluationResponse {
    /// Whether the flag is on for the entity. A missing value reads as `false`.
    #[serde(default, deserialize_with = "deserialize_permissive_bool")]
    pub enabled: bool,
    /// Key of the evaluated flag.
    #[serde(default)]
    pub flag_key: String,
    /// Evaluation reason, e.g. [`MATCH_EVALUATION_REASON`].
    pub reason: String,
    /// Server-assigned request identifier.
    #[serde(default)]
    pub request_id: String,
    /// Server-side evaluation time.
    #[serde(default)]
    pub request_duration_millis: f64,
    /// When the server evaluated the flag.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Result of a variant flag evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantEvaluationResponse {
    /// Whether a segment matched the entity.
    #[serde(rename = "match", default)]
    pub is_match: bool,
    /// Segments that matched the entity.
    #[serde(default)]
    pub segment_keys: Vec<String>,
    /// Evaluation reason, e.g. [`MATCH_EVALUATION_REASON`].
    pub reason: String,
    /// Key of the evaluated flag.
    #[serde(default)]
    pub flag_key: String,
    /// Key of the variant the entity resolved to.
    #[serde(default)]
    pub variant_key: String,
    /// JSON document attached to the variant. Empty when the variant has no attachment.
    #[serde(default)]
    pub variant_attachment: String,
    /// Server-assigned request identifier.
    #[serde(default)]
    pub request_id: String,
    /// Server-side evaluation time.
    #[serde(default)]
    pub request_duration_millis: f64,
    /// When the server evaluated the flag.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Error body returned by Flipt for non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}

/// Return `true` if `reason` means Flipt produced a value for the flag.
pub fn is_resolved(reason: &str) -> bool {
    reason == MATCH_EVALUATION_REASON || reason == DEFAULT_EVALUATION_REASON
}

/// Parse common truthy/falsy spellings: `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn deserialize_permissive_bool<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Number(i64),
        String(String),
    }

    match BoolLike::deserialize(deserializer)? {
        BoolLike::Bool(b) => Ok(b),
        BoolLike::Number(0) => Ok(false),
        BoolLike::Number(1) => Ok(true),
        BoolLike::Number(n) => Err(de::Error::custom(format!("invalid boolean value: {n}"))),
        BoolLike::String(s) => parse_bool(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid boolean value: {s:?}"))),
    }
}
