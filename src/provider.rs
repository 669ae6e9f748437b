use std::collections::HashMap;

use crate::{
    models::{is_resolved, BooleanEvaluationResponse, VariantEvaluationResponse},
    models::DEFAULT_EVALUATION_REASON,
    ClientConfig, Error, ErrorCode, EvaluationContext, Evaluator, FeatureProvider, FlagValueType,
    FliptClient, ProviderMetadata, Reason, ResolutionDetails, ResolutionError, Result,
};

/// An OpenFeature provider that resolves flags with Flipt.
///
/// # Examples
/// ```
/// # use openfeature_flipt::{EvaluationContext, FeatureProvider, FliptProvider};
/// let provider = FliptProvider::new("http://localhost:8080", "", "default").unwrap();
/// assert_eq!(provider.metadata().name, "FliptProvider");
/// ```
pub struct FliptProvider<E = FliptClient> {
    client: E,
    metadata: ProviderMetadata,
}

impl FliptProvider<FliptClient> {
    /// Create a provider talking to the Flipt server at `host`.
    ///
    /// An empty `api_token` disables authentication.
    pub fn new(
        host: impl Into<String>,
        api_token: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let mut config = ClientConfig::new(host);
        config.api_token(api_token).namespace(namespace);
        Self::from_config(config)
    }

    /// Create a provider from a prepared [`ClientConfig`].
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_client(FliptClient::new(config)?))
    }
}

impl<E: Evaluator> FliptProvider<E> {
    /// Name reported in [`ProviderMetadata`].
    pub const NAME: &'static str = "FliptProvider";

    /// Create a provider around an already constructed client.
    pub fn with_client(client: E) -> Self {
        FliptProvider {
            client,
            metadata: ProviderMetadata { name: Self::NAME },
        }
    }

    /// The client flags are evaluated with.
    pub fn client(&self) -> &E {
        &self.client
    }

    fn resolve_value<T: FlagValue>(
        &self,
        flag_key: &str,
        default_value: T,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<T>> {
        let attributes = context.context_map();
        let entity_id = context.targeting_key().unwrap_or_default();

        let response = T::evaluate(&self.client, flag_key, &attributes, entity_id)?;

        log::trace!(target: "flipt",
                    flag_key,
                    entity_id,
                    value_type:serde = T::VALUE_TYPE,
                    reason = response.reason(),
                    variant_key = response.variant_key();
                    "evaluated a flag");

        if !is_resolved(response.reason()) {
            log::debug!(target: "flipt",
                        flag_key,
                        entity_id,
                        reason = response.reason();
                        "flag not resolved, returning default value");
            // Every unresolved reason maps to General, carrying Flipt's reason as the message.
            return Ok(ResolutionDetails::from_error(
                default_value,
                ResolutionError::new(ErrorCode::General, response.reason()),
            ));
        }

        let reason = if response.reason() == DEFAULT_EVALUATION_REASON {
            Reason::Default
        } else {
            Reason::TargetingMatch
        };
        let value = T::from_response(flag_key, &response)?;
        let mut details = ResolutionDetails::from_success(value).with_reason(reason);
        if let Some(variant_key) = response.variant_key() {
            details = details.with_variant(variant_key);
        }
        Ok(details)
    }
}

impl<E: Evaluator> FeatureProvider for FliptProvider<E> {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn resolve_boolean_value(
        &self,
        flag_key: &str,
        default_value: bool,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<bool>> {
        self.resolve_value(flag_key, default_value, context)
    }

    fn resolve_string_value(
        &self,
        flag_key: &str,
        default_value: String,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<String>> {
        self.resolve_value(flag_key, default_value, context)
    }

    fn resolve_integer_value(
        &self,
        flag_key: &str,
        default_value: i64,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<i64>> {
        self.resolve_value(flag_key, default_value, context)
    }

    fn resolve_float_value(
        &self,
        flag_key: &str,
        default_value: f64,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<f64>> {
        self.resolve_value(flag_key, default_value, context)
    }

    fn resolve_object_value(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
        context: &EvaluationContext,
    ) -> Result<ResolutionDetails<serde_json::Value>> {
        self.resolve_value(flag_key, default_value, context)
    }
}

/// What the provider reads from either Flipt evaluation response.
trait EvaluationResponse {
    fn reason(&self) -> &str;

    /// Variant the value came from. Boolean evaluations have none.
    fn variant_key(&self) -> Option<&str>;
}

impl EvaluationResponse for BooleanEvaluationResponse {
    fn reason(&self) -> &str {
        &self.reason
    }

    fn variant_key(&self) -> Option<&str> {
        None
    }
}

impl EvaluationResponse for VariantEvaluationResponse {
    fn reason(&self) -> &str {
        &self.reason
    }

    fn variant_key(&self) -> Option<&str> {
        Some(&self.variant_key)
    }
}

/// A type a flag can resolve to: which Flipt endpoint evaluates it and how the value is read
/// from the response.
trait FlagValue: Sized {
    const VALUE_TYPE: FlagValueType;

    type Response: EvaluationResponse;

    fn evaluate(
        client: &impl Evaluator,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<Self::Response>;

    fn from_response(flag_key: &str, response: &Self::Response) -> Result<Self>;
}

// Booleans have a dedicated endpoint, everything else is a variant.
impl FlagValue for bool {
    const VALUE_TYPE: FlagValueType = FlagValueType::Boolean;

    type Response = BooleanEvaluationResponse;

    fn evaluate(
        client: &impl Evaluator,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<Self::Response> {
        client.boolean(flag_key, context, entity_id)
    }

    fn from_response(_flag_key: &str, response: &Self::Response) -> Result<Self> {
        Ok(response.enabled)
    }
}

impl FlagValue for String {
    const VALUE_TYPE: FlagValueType = FlagValueType::String;

    type Response = VariantEvaluationResponse;

    fn evaluate(
        client: &impl Evaluator,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<Self::Response> {
        client.variant(flag_key, context, entity_id)
    }

    fn from_response(_flag_key: &str, response: &Self::Response) -> Result<Self> {
        Ok(response.variant_key.clone())
    }
}

impl FlagValue for i64 {
    const VALUE_TYPE: FlagValueType = FlagValueType::Integer;

    type Response = VariantEvaluationResponse;

    fn evaluate(
        client: &impl Evaluator,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<Self::Response> {
        client.variant(flag_key, context, entity_id)
    }

    fn from_response(flag_key: &str, response: &Self::Response) -> Result<Self> {
        response
            .variant_key
            .trim()
            .parse()
            .map_err(|_| invalid_variant_key(flag_key, response, Self::VALUE_TYPE))
    }
}

impl FlagValue for f64 {
    const VALUE_TYPE: FlagValueType = FlagValueType::Float;

    type Response = VariantEvaluationResponse;

    fn evaluate(
        client: &impl Evaluator,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<Self::Response> {
        client.variant(flag_key, context, entity_id)
    }

    fn from_response(flag_key: &str, response: &Self::Response) -> Result<Self> {
        response
            .variant_key
            .trim()
            .parse()
            .map_err(|_| invalid_variant_key(flag_key, response, Self::VALUE_TYPE))
    }
}

impl FlagValue for serde_json::Value {
    const VALUE_TYPE: FlagValueType = FlagValueType::Object;

    type Response = VariantEvaluationResponse;

    fn evaluate(
        client: &impl Evaluator,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<Self::Response> {
        client.variant(flag_key, context, entity_id)
    }

    fn from_response(flag_key: &str, response: &Self::Response) -> Result<Self> {
        let attachment = &response.variant_attachment;
        if attachment.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(attachment).map_err(|err| Error::InvalidAttachment {
            flag_key: flag_key.to_owned(),
            source: err.into(),
        })
    }
}

fn invalid_variant_key(
    flag_key: &str,
    response: &VariantEvaluationResponse,
    expected: FlagValueType,
) -> Error {
    Error::InvalidVariantKey {
        flag_key: flag_key.to_owned(),
        variant_key: response.variant_key.clone(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use serde_json::json;

    use crate::{
        client::MockEvaluator,
        models::{BooleanEvaluationResponse, VariantEvaluationResponse},
        Error, ErrorCode, EvaluationContext, FeatureProvider, FlagValueType, FliptProvider, Reason,
        ResolutionError,
    };

    fn demo_context() -> EvaluationContext {
        EvaluationContext::new()
            .with_targeting_key("id")
            .with_attribute("context", "demo")
    }

    fn boolean_response(enabled: bool, reason: &str) -> BooleanEvaluationResponse {
        BooleanEvaluationResponse {
            enabled,
            flag_key: "flag".to_owned(),
            reason: reason.to_owned(),
            request_id: "rid".to_owned(),
            request_duration_millis: 0.1,
            timestamp: None,
        }
    }

    fn variant_response(
        variant_key: &str,
        attachment: &str,
        reason: &str,
    ) -> VariantEvaluationResponse {
        VariantEvaluationResponse {
            is_match: reason == "MATCH_EVALUATION_REASON",
            segment_keys: vec![],
            reason: reason.to_owned(),
            flag_key: "flag".to_owned(),
            variant_key: variant_key.to_owned(),
            variant_attachment: attachment.to_owned(),
            request_id: "rid".to_owned(),
            request_duration_millis: 0.1,
            timestamp: None,
        }
    }

    /// A mock expecting exactly one `variant` call with the demo context and no `boolean` call.
    fn variant_mock(response: VariantEvaluationResponse) -> MockEvaluator {
        let mut mock = MockEvaluator::new();
        mock.expect_boolean().never();
        mock.expect_variant()
            .withf(|flag_key, context, entity_id| {
                flag_key == "flag"
                    && *context
                        == HashMap::from([("context".to_owned(), "demo".to_owned())])
                    && entity_id == "id"
            })
            .times(1)
            .return_once(move |_, _, _| Ok(response));
        mock
    }

    #[test]
    fn boolean() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut mock = MockEvaluator::new();
        mock.expect_variant().never();
        mock.expect_boolean()
            .withf(|flag_key, context, entity_id| {
                flag_key == "flag"
                    && *context
                        == HashMap::from([("context".to_owned(), "demo".to_owned())])
                    && entity_id == "id"
            })
            .times(1)
            .return_once(|_, _, _| Ok(boolean_response(true, "MATCH_EVALUATION_REASON")));
        let provider = FliptProvider::with_client(mock);

        let result = provider
            .resolve_boolean_value("flag", false, &demo_context())
            .unwrap();

        assert!(result.value);
        assert_eq!(result.error, None);
        assert_eq!(result.reason, Some(Reason::TargetingMatch));
        assert_eq!(result.variant, None);
    }

    #[test]
    fn boolean_disabled_by_default_reason() {
        let mut mock = MockEvaluator::new();
        mock.expect_boolean()
            .return_once(|_, _, _| Ok(boolean_response(false, "DEFAULT_EVALUATION_REASON")));
        let provider = FliptProvider::with_client(mock);

        let result = provider
            .resolve_boolean_value("flag", true, &demo_context())
            .unwrap();

        assert!(!result.value);
        assert_eq!(result.reason, Some(Reason::Default));
    }

    #[test]
    fn integer() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "20",
            r#"{"json":1}"#,
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_integer_value("flag", 10, &demo_context())
            .unwrap();

        assert_eq!(result.value, 20);
        assert_eq!(result.variant.as_deref(), Some("20"));
        assert!(!result.is_error());
    }

    #[test]
    fn float() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "0.2345",
            r#"{"json":1}"#,
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_float_value("flag", 0.1111, &demo_context())
            .unwrap();

        assert_eq!(result.value, 0.2345);
    }

    #[test]
    fn string() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "My string",
            r#"{"json":1}"#,
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_string_value("flag", "base".to_owned(), &demo_context())
            .unwrap();

        assert_eq!(result.value, "My string");
    }

    #[test]
    fn object() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "My string",
            r#"{"json":1}"#,
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_object_value("flag", json!({}), &demo_context())
            .unwrap();

        assert_eq!(result.value, json!({"json": 1}));
    }

    #[test]
    fn object_without_attachment_is_null() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "on",
            "",
            "DEFAULT_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_object_value("flag", json!({"fallback": true}), &demo_context())
            .unwrap();

        assert_eq!(result.value, serde_json::Value::Null);
        assert_eq!(result.reason, Some(Reason::Default));
    }

    #[test]
    fn unresolved_reason_returns_default_with_general_error() {
        let _ = env_logger::builder().is_test(true).try_init();

        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "20",
            "",
            "FLAG_DISABLED",
        )));

        let result = provider
            .resolve_integer_value("flag", 10, &demo_context())
            .unwrap();

        assert_eq!(result.value, 10);
        assert_eq!(
            result.error,
            Some(ResolutionError::new(ErrorCode::General, "FLAG_DISABLED"))
        );
        assert_eq!(result.reason, Some(Reason::Error));
        assert_eq!(result.variant, None);
    }

    #[test]
    fn string_unresolved_reason_returns_default() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "My string",
            "",
            "FLAG_DISABLED_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_string_value("flag", "base".to_owned(), &demo_context())
            .unwrap();

        assert_eq!(result.value, "base");
        assert_eq!(
            result.error,
            Some(ResolutionError::new(
                ErrorCode::General,
                "FLAG_DISABLED_EVALUATION_REASON"
            ))
        );
    }

    #[test]
    fn float_unresolved_reason_returns_default() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "0.2345",
            "",
            "UNKNOWN_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_float_value("flag", 0.1111, &demo_context())
            .unwrap();

        assert_eq!(result.value, 0.1111);
        assert_eq!(
            result.error,
            Some(ResolutionError::new(
                ErrorCode::General,
                "UNKNOWN_EVALUATION_REASON"
            ))
        );
        assert_eq!(result.reason, Some(Reason::Error));
    }

    #[test]
    fn unresolved_reason_never_converts_payload() {
        // Unparsable payload must not matter when Flipt did not resolve the flag.
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "",
            "{not json",
            "UNKNOWN_EVALUATION_REASON",
        )));

        let result = provider
            .resolve_object_value("flag", json!(["default"]), &demo_context())
            .unwrap();

        assert_eq!(result.value, json!(["default"]));
        assert_eq!(
            result.error.map(|err| err.message),
            Some("UNKNOWN_EVALUATION_REASON".to_owned())
        );
    }

    #[test]
    fn boolean_unresolved_reason_returns_default() {
        let mut mock = MockEvaluator::new();
        mock.expect_boolean().return_once(|_, _, _| {
            Ok(boolean_response(false, "FLAG_DISABLED_EVALUATION_REASON"))
        });
        let provider = FliptProvider::with_client(mock);

        let result = provider
            .resolve_boolean_value("flag", true, &demo_context())
            .unwrap();

        assert!(result.value);
        assert_eq!(
            result.error,
            Some(ResolutionError::new(
                ErrorCode::General,
                "FLAG_DISABLED_EVALUATION_REASON"
            ))
        );
    }

    #[test]
    fn non_numeric_variant_key_fails() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "twenty",
            "",
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider.resolve_integer_value("flag", 10, &demo_context());

        match result {
            Err(Error::InvalidVariantKey {
                flag_key,
                variant_key,
                expected,
            }) => {
                assert_eq!(flag_key, "flag");
                assert_eq!(variant_key, "twenty");
                assert_eq!(expected, FlagValueType::Integer);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_float_variant_key_fails() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "fast",
            "",
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider.resolve_float_value("flag", 1.0, &demo_context());

        assert!(matches!(result, Err(Error::InvalidVariantKey { .. })));
    }

    #[test]
    fn malformed_attachment_fails() {
        let provider = FliptProvider::with_client(variant_mock(variant_response(
            "on",
            "{not json",
            "MATCH_EVALUATION_REASON",
        )));

        let result = provider.resolve_object_value("flag", json!({}), &demo_context());

        assert!(matches!(result, Err(Error::InvalidAttachment { .. })));
    }

    #[test]
    fn backend_errors_propagate() {
        let mut mock = MockEvaluator::new();
        mock.expect_variant()
            .return_once(|_, _, _| Err(Error::Unauthorized));
        let provider = FliptProvider::with_client(mock);

        let result = provider.resolve_string_value("flag", "base".to_owned(), &demo_context());

        assert!(matches!(result, Err(Error::Unauthorized)));
    }

    #[test]
    fn missing_targeting_key_is_sent_as_empty_entity_id() {
        let mut mock = MockEvaluator::new();
        mock.expect_variant()
            .withf(|_, context, entity_id| context.is_empty() && entity_id.is_empty())
            .times(1)
            .return_once(|_, _, _| {
                Ok(variant_response("blue", "", "DEFAULT_EVALUATION_REASON"))
            });
        let provider = FliptProvider::with_client(mock);

        let result = provider
            .resolve_string_value("flag", "red".to_owned(), &EvaluationContext::new())
            .unwrap();

        assert_eq!(result.value, "blue");
    }

    #[test]
    fn shared_client() {
        let mut mock = MockEvaluator::new();
        mock.expect_variant()
            .times(2)
            .returning(|_, _, _| Ok(variant_response("7", "", "MATCH_EVALUATION_REASON")));
        let client = Arc::new(mock);
        let first = FliptProvider::with_client(client.clone());
        let second = FliptProvider::with_client(client);

        assert_eq!(
            first
                .resolve_integer_value("flag", 0, &demo_context())
                .unwrap()
                .value,
            7
        );
        assert_eq!(
            second
                .resolve_integer_value("flag", 0, &demo_context())
                .unwrap()
                .value,
            7
        );
    }

    #[test]
    fn metadata_name() {
        let provider = FliptProvider::with_client(MockEvaluator::new());

        assert_eq!(provider.metadata().name, "FliptProvider");
    }
}
