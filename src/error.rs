//! Client-level error types shared across flows, the request gate, and stores.
//!
//! Every variant is cloneable so a single refresh failure can be handed to each request that was
//! queued behind it.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token is missing a field required to use it.
	#[error("Token appears corrupt: {reason}.")]
	TokenCorrupt {
		/// Which field is missing or unusable.
		reason: String,
	},
	/// Provider answered with a non-success status.
	#[error("Provider rejected the request to {url} with status {status}.")]
	ProviderRejected {
		/// URL that was called.
		url: String,
		/// HTTP status code returned by the provider.
		status: u16,
		/// Raw response body, kept for diagnostics.
		body: String,
	},
	/// Provider answered with a body that could not be parsed.
	#[error("Provider returned a malformed response from {url}.")]
	MalformedResponse {
		/// URL that was called.
		url: String,
		/// HTTP status code returned by the provider.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// The in-flight token refresh was dropped before it completed.
	#[error("Token refresh was abandoned before completing.")]
	RefreshAbandoned,
}
impl Error {
	/// HTTP status carried by the error, when the provider produced one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::ProviderRejected { status, .. } | Self::MalformedResponse { status, .. } =>
				Some(*status),
			_ => None,
		}
	}

	pub(crate) fn token_corrupt(reason: impl Into<String>) -> Self {
		Self::TokenCorrupt { reason: reason.into() }
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Config file could not be read or parsed.
	#[error("Failed to load configuration from {path}: {message}.")]
	Load {
		/// Source path of the configuration.
		path: String,
		/// Human-readable error payload.
		message: String,
	},
	/// A required credential is empty.
	#[error("Client credential `{field}` is required.")]
	MissingCredential {
		/// Credential field name.
		field: &'static str,
	},
	/// A configured endpoint cannot be parsed.
	#[error("Configured {field} is not a valid URL.")]
	InvalidUrl {
		/// Config field that failed validation.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Expiry factor is not a usable fraction or percentage.
	#[error("Token expiry factor {value} must be within (0, 1] or (1, 100].")]
	InvalidExpiryFactor {
		/// Rejected raw value.
		value: f64,
	},
	/// Request timeout must be positive.
	#[error("Request timeout must be greater than zero.")]
	InvalidTimeout,
	/// Neither a custom token store nor `tokenFilePath` was supplied.
	#[error("A token store or tokenFilePath is required.")]
	MissingTokenStore,

	/// Token omitted `expires_in`.
	#[error("Token is missing expires_in.")]
	MissingExpiresIn,
	/// Token carried an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token carried a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,

	/// Request descriptor carries neither `url` nor `uri`.
	#[error("Request is missing a url.")]
	MissingRequestUrl,
	/// Request method is not a valid HTTP method.
	#[error("Request method `{method}` is invalid.")]
	InvalidMethod {
		/// Rejected method string.
		method: String,
	},
	/// Request header name or value is invalid.
	#[error("Request header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}

/// Transport-level failures (network, timeout).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// URL that was called.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// The request exceeded its timeout.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// URL that was called.
		url: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { url: url.into(), source: Arc::new(src) }
	}

	/// Classifies a reqwest failure for the given URL.
	pub fn from_reqwest(url: impl Into<String>, err: ReqwestError) -> Self {
		let url = url.into();

		if err.is_timeout() { Self::Timeout { url } } else { Self::network(url, err) }
	}
}
