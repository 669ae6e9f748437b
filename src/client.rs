//! An HTTP client for Flipt's evaluation API.
use std::{collections::HashMap, sync::Arc};

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    models::{
        BooleanEvaluationResponse, ErrorResponse, EvaluationRequest, VariantEvaluationResponse,
    },
    ClientConfig, Error, Result,
};

const BOOLEAN_ENDPOINT: &str = "evaluate/v1/boolean";
const VARIANT_ENDPOINT: &str = "evaluate/v1/variant";

/// Evaluates flags against a Flipt backend.
///
/// [`FliptClient`] implements it over HTTP. Other implementations can be passed to
/// [`FliptProvider::with_client`](crate::FliptProvider::with_client).
#[cfg_attr(test, mockall::automock)]
pub trait Evaluator {
    /// Evaluate a boolean flag for `entity_id`.
    fn boolean(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<BooleanEvaluationResponse>;

    /// Evaluate a variant flag for `entity_id`.
    fn variant(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<VariantEvaluationResponse>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn boolean(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<BooleanEvaluationResponse> {
        (**self).boolean(flag_key, context, entity_id)
    }

    fn variant(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<VariantEvaluationResponse> {
        (**self).variant(flag_key, context, entity_id)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn boolean(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<BooleanEvaluationResponse> {
        (**self).boolean(flag_key, context, entity_id)
    }

    fn variant(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<VariantEvaluationResponse> {
        (**self).variant(flag_key, context, entity_id)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Arc<E> {
    fn boolean(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<BooleanEvaluationResponse> {
        (**self).boolean(flag_key, context, entity_id)
    }

    fn variant(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<VariantEvaluationResponse> {
        (**self).variant(flag_key, context, entity_id)
    }
}

/// A blocking client for the Flipt REST evaluation API.
///
/// Create it with [`ClientConfig::to_client`].
pub struct FliptClient {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    /// Always ends with `/` so endpoint paths are joined under it.
    base_url: Url,
    api_token: String,
    namespace: String,
}

impl FliptClient {
    /// Create a client from `config`. Fails if the host is not a valid URL.
    pub fn new(config: ClientConfig) -> Result<FliptClient> {
        let ClientConfig {
            mut host,
            api_token,
            namespace,
        } = config;
        if !host.ends_with('/') {
            host.push('/');
        }
        let base_url = Url::parse(&host).map_err(Error::InvalidHost)?;
        // "localhost:8080" parses with scheme "localhost" and an opaque path.
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidHost(url::ParseError::RelativeUrlWithoutBase));
        }

        Ok(FliptClient {
            client: reqwest::blocking::Client::new(),
            base_url,
            api_token,
            namespace,
        })
    }

    /// Namespace flags are evaluated in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn evaluate<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<T> {
        let url = self.base_url.join(endpoint).map_err(Error::InvalidHost)?;

        log::debug!(target: "flipt",
                    flag_key,
                    entity_id,
                    namespace:display = self.namespace;
                    "sending evaluation request to {}", endpoint);

        let mut request = self.client.post(url).json(&EvaluationRequest {
            namespace_key: &self.namespace,
            flag_key,
            entity_id,
            context,
        });
        if !self.api_token.is_empty() {
            request = request.bearer_auth(&self.api_token);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        match status {
            StatusCode::OK => Ok(serde_json::from_str(&body)?),
            StatusCode::UNAUTHORIZED => {
                log::warn!(target: "flipt", "client is not authorized. Check your API token");
                Err(Error::Unauthorized)
            }
            status => {
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .map(|err| err.message)
                    .unwrap_or(body);
                log::debug!(target: "flipt",
                            flag_key,
                            status:display = status;
                            "evaluation request failed: {}", message);
                Err(Error::UnexpectedStatus { status, message })
            }
        }
    }
}

impl Evaluator for FliptClient {
    fn boolean(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<BooleanEvaluationResponse> {
        self.evaluate(BOOLEAN_ENDPOINT, flag_key, context, entity_id)
    }

    fn variant(
        &self,
        flag_key: &str,
        context: &HashMap<String, String>,
        entity_id: &str,
    ) -> Result<VariantEvaluationResponse> {
        self.evaluate(VARIANT_ENDPOINT, flag_key, context, entity_id)
    }
}
