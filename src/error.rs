//! Client-level error types shared across credentials, stores, and request execution.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token-store failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem; fatal to the client instance.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout); retryable at the caller's discretion.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Bearer token was rejected or the token exchange failed.
	#[error("Authentication failed: {reason}.")]
	Auth {
		/// HTTP status code, when one was received.
		status: Option<u16>,
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// The API throttled the request; retry after backing off.
	#[error("Rate limited by the API.")]
	RateLimited {
		/// HTTP status code that signaled the throttle.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The API declared the request invalid; not retryable.
	#[error("The API rejected the request: {reason}.")]
	Validation {
		/// HTTP status code, when one was received.
		status: Option<u16>,
		/// Provider-supplied error description.
		reason: String,
	},
	/// Any other non-success HTTP outcome.
	#[error("The API returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code returned by the API.
		status: u16,
		/// Truncated body preview for diagnostics.
		message: String,
	},
	/// A response body could not be decoded into the expected shape.
	#[error("Failed to decode the response body.")]
	Decode {
		/// Structured parsing failure including the failing JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response being decoded.
		status: Option<u16>,
	},
}
impl Error {
	/// Returns the HTTP status associated with this failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Auth { status, .. } | Self::Validation { status, .. } | Self::Decode { status, .. } =>
				*status,
			Self::RateLimited { status, .. } | Self::Api { status, .. } => Some(*status),
			Self::Store(_) | Self::Config(_) | Self::Transport(_) => None,
		}
	}
}

/// Configuration and validation failures raised at construction or first use.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required builder field was not supplied.
	#[error("Missing required configuration field `{field}`.")]
	MissingField {
		/// Name of the absent field.
		field: &'static str,
	},
	/// The private key could not be parsed as an elliptic-curve key.
	#[error("Private key is not a valid EC key.")]
	InvalidPrivateKey {
		/// Underlying parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// The client identifier prefix maps to no known organization scope.
	#[error("Unknown client id prefix `{prefix}`.")]
	UnknownClientIdPrefix {
		/// The unrecognized prefix (substring before the first `.`).
		prefix: String,
	},
	/// Signing the client assertion failed.
	#[error("Failed to sign the client assertion.")]
	AssertionSign {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// A configured or derived URL could not be parsed.
	#[error("Invalid URL in client configuration.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request timed out before the API responded.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}
