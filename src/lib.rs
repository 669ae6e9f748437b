//! An [OpenFeature](https://openfeature.dev) provider backed by [Flipt](https://www.flipt.io).
//!
//! # Overview
//!
//! [`FliptProvider`] implements [`FeatureProvider`]: it resolves boolean, string, integer,
//! float and object flags for an [`EvaluationContext`] by asking a Flipt server. Boolean flags
//! are evaluated with Flipt's boolean endpoint, every other type with the variant endpoint
//! (the variant key carries string and numeric values, the variant attachment carries object
//! values).
//!
//! ```no_run
//! # use openfeature_flipt::{EvaluationContext, FeatureProvider, FliptProvider};
//! let provider = FliptProvider::new("http://localhost:8080", "api-token", "default")?;
//! let context = EvaluationContext::new().with_targeting_key("user-1");
//! let details = provider.resolve_boolean_value("new-checkout", false, &context)?;
//! println!("new-checkout: {}", details.value);
//! # Ok::<(), openfeature_flipt::Error>(())
//! ```
//!
//! # Error Handling
//!
//! When Flipt does not resolve a flag (disabled, unknown, ...), the default value is returned in
//! an `Ok` result with [`ResolutionDetails::error`] describing the reason. Failures that need the
//! developer's attention (network errors, invalid credentials, variant keys that do not parse as
//! the requested type) are returned as [`Error`].
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with the `flipt` target.
//! Consider integrating a `log`-compatible logger implementation for better visibility into
//! flag evaluation.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;
mod context;
mod error;
pub mod models;
mod provider;
mod resolution;

pub use client::{Evaluator, FliptClient};
pub use config::ClientConfig;
pub use context::{AttributeValue, Attributes, EvaluationContext};
pub use error::{Error, Result};
pub use provider::FliptProvider;
pub use resolution::{
    ErrorCode, FeatureProvider, FlagValueType, ProviderMetadata, Reason, ResolutionDetails,
    ResolutionError,
};
