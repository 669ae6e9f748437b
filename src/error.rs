use std::sync::Arc;

use reqwest::StatusCode;

use crate::FlagValueType;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to Flipt or converting its answer.
///
/// A flag that Flipt did not resolve (disabled, unknown, ...) is *not* an error: it is reported
/// through [`ResolutionDetails::error`](crate::ResolutionDetails::error) together with the
/// default value.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The configured host is not a valid absolute URL.
    #[error("invalid host configuration")]
    InvalidHost(#[source] url::ParseError),

    /// Flipt rejected the request, the API token is likely invalid.
    #[error("unauthorized, api_token is likely invalid")]
    Unauthorized,

    /// Flipt answered with a non-success status.
    #[error("unexpected response status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Error message reported by the server.
        message: String,
    },

    /// Network error.
    #[error(transparent)]
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    Network(Arc<reqwest::Error>),

    /// Response body could not be decoded.
    #[error("error parsing evaluation response")]
    InvalidResponse(#[source] Arc<serde_json::Error>),

    /// Variant key cannot be converted to the requested type.
    #[error("variant key {variant_key:?} of flag {flag_key:?} is not a valid {expected:?} value")]
    InvalidVariantKey {
        /// Key of the evaluated flag.
        flag_key: String,
        /// Variant key returned by Flipt.
        variant_key: String,
        /// Type requested by the caller.
        expected: FlagValueType,
    },

    /// Variant attachment is not valid JSON.
    #[error("variant attachment of flag {flag_key:?} is not valid JSON")]
    InvalidAttachment {
        /// Key of the evaluated flag.
        flag_key: String,
        /// Decoding error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::InvalidResponse(Arc::new(value))
    }
}
