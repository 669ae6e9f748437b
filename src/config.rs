use crate::{FliptClient, Result};

/// Configuration for [`FliptClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) host: String,
    pub(crate) api_token: String,
    pub(crate) namespace: String,
}

impl ClientConfig {
    /// Namespace used when none is configured.
    pub const DEFAULT_NAMESPACE: &'static str = "default";

    /// Create a configuration for the Flipt server at `host`.
    ///
    /// ```
    /// # use openfeature_flipt::ClientConfig;
    /// ClientConfig::new("http://localhost:8080");
    /// ```
    pub fn new(host: impl Into<String>) -> Self {
        ClientConfig {
            host: host.into(),
            api_token: String::new(),
            namespace: ClientConfig::DEFAULT_NAMESPACE.to_owned(),
        }
    }

    /// Set the token sent as `Authorization: Bearer <token>`. Leave unset for servers without
    /// authentication.
    pub fn api_token(&mut self, api_token: impl Into<String>) -> &mut Self {
        self.api_token = api_token.into();
        self
    }

    /// Set the namespace flags are evaluated in.
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = namespace.into();
        self
    }

    /// Create a new [`FliptClient`] using the specified configuration.
    ///
    /// ```
    /// # use openfeature_flipt::{ClientConfig, FliptClient};
    /// let client: FliptClient = ClientConfig::new("http://localhost:8080")
    ///     .namespace("production")
    ///     .to_client()
    ///     .unwrap();
    /// ```
    pub fn to_client(&self) -> Result<FliptClient> {
        FliptClient::new(self.clone())
    }
}
