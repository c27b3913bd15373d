//! Client configuration matching the provider library's option names.
//!
//! A config is usually loaded from JSON:
//!
//! ```json
//! {
//!   "timeout": 10000,
//!   "creds": { "clientID": "ABC", "clientSecret": "s3cr3t" },
//!   "tokenFilePath": "/var/lib/fitbit/token.json",
//!   "uris": {
//!     "authorizationUri": "https://www.fitbit.com",
//!     "authorizationPath": "/oauth2/authorize",
//!     "tokenUri": "https://api.fitbit.com",
//!     "tokenPath": "/oauth2/token"
//!   },
//!   "authorization_uri": {
//!     "redirect_uri": "https://app.example.com/callback",
//!     "response_type": "code",
//!     "scope": "activity profile weight",
//!     "state": "3(#0/!~"
//!   }
//! }
//! ```

// std
use std::fs;
// self
use crate::{_prelude::*, error::ConfigError, expiry::ExpiryFactor};

const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_EXPIRES_FACTOR_PERCENTAGE: f64 = 80.0;

/// OAuth client credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// OAuth 2.0 client identifier.
	#[serde(rename = "clientID")]
	pub client_id: String,
	/// OAuth 2.0 client secret.
	#[serde(rename = "clientSecret")]
	pub client_secret: String,
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}

/// Provider endpoints, split into host and path like the provider library expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
	/// Host serving the consent screen.
	pub authorization_uri: String,
	/// Path of the consent screen.
	pub authorization_path: String,
	/// Host serving the token endpoint.
	pub token_uri: String,
	/// Path of the token endpoint.
	pub token_path: String,
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			authorization_uri: "https://www.fitbit.com".into(),
			authorization_path: "/oauth2/authorize".into(),
			token_uri: "https://api.fitbit.com".into(),
			token_path: "/oauth2/token".into(),
		}
	}
}

/// Query parameters for the consent-screen redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationParams {
	/// Redirect URI registered with the provider.
	pub redirect_uri: String,
	/// OAuth response type; `code` for the authorization-code grant.
	#[serde(default = "default_response_type")]
	pub response_type: String,
	/// Space-delimited scopes to request.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Opaque state echoed back on the redirect.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
}

/// Full client configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Client credentials.
	pub creds: Credentials,
	/// Provider endpoints.
	#[serde(default)]
	pub uris: Endpoints,
	/// Consent-screen parameters.
	#[serde(rename = "authorization_uri")]
	pub authorization: AuthorizationParams,
	/// Default request timeout in milliseconds.
	#[serde(default = "default_timeout_ms")]
	pub timeout: u64,
	/// Share of the token lifetime to trust, as a fraction or percentage.
	#[serde(rename = "tokenExpiresFactorProcentage", default = "default_expires_factor")]
	pub token_expires_factor: f64,
	/// Token file used when no custom store is supplied.
	#[serde(rename = "tokenFilePath", default, skip_serializing_if = "Option::is_none")]
	pub token_file_path: Option<PathBuf>,
}
impl ClientConfig {
	/// Creates a config with default endpoints for the given credentials and redirect URI.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			creds: Credentials { client_id: client_id.into(), client_secret: client_secret.into() },
			uris: Endpoints::default(),
			authorization: AuthorizationParams {
				redirect_uri: redirect_uri.into(),
				response_type: default_response_type(),
				scope: None,
				state: None,
			},
			timeout: DEFAULT_TIMEOUT_MS,
			token_expires_factor: DEFAULT_EXPIRES_FACTOR_PERCENTAGE,
			token_file_path: None,
		}
	}

	/// Parses and validates a JSON config document.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Load {
			path: "<inline>".into(),
			message: e.to_string(),
		})?;

		config.validate()?;

		Ok(config)
	}

	/// Reads, parses, and validates a JSON config file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path).map_err(|e| ConfigError::Load {
			path: path.display().to_string(),
			message: e.to_string(),
		})?;
		let config: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Load {
			path: path.display().to_string(),
			message: e.to_string(),
		})?;

		config.validate()?;

		Ok(config)
	}

	/// Overrides the token endpoint host and path.
	pub fn with_token_endpoint(mut self, uri: impl Into<String>, path: impl Into<String>) -> Self {
		self.uris.token_uri = uri.into();
		self.uris.token_path = path.into();

		self
	}

	/// Overrides the consent-screen host and path.
	pub fn with_authorization_endpoint(
		mut self,
		uri: impl Into<String>,
		path: impl Into<String>,
	) -> Self {
		self.uris.authorization_uri = uri.into();
		self.uris.authorization_path = path.into();

		self
	}

	/// Sets the requested scopes.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.authorization.scope = Some(scope.into());

		self
	}

	/// Sets the opaque state parameter.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.authorization.state = Some(state.into());

		self
	}

	/// Sets the default request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

		self
	}

	/// Sets the expiry factor (fraction or percentage).
	pub fn with_expires_factor(mut self, factor: f64) -> Self {
		self.token_expires_factor = factor;

		self
	}

	/// Sets the token file used by the default store.
	pub fn with_token_file_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.token_file_path = Some(path.into());

		self
	}

	/// Checks every option the client relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.creds.client_id.trim().is_empty() {
			return Err(ConfigError::MissingCredential { field: "clientID" });
		}
		if self.creds.client_secret.trim().is_empty() {
			return Err(ConfigError::MissingCredential { field: "clientSecret" });
		}
		if self.timeout == 0 {
			return Err(ConfigError::InvalidTimeout);
		}

		self.expiry_factor()?;
		self.token_endpoint()?;
		self.authorization_endpoint()?;
		Url::parse(&self.authorization.redirect_uri)
			.map_err(|source| ConfigError::InvalidUrl { field: "redirect_uri", source })?;

		Ok(())
	}

	/// Token endpoint: `tokenUri` joined with `tokenPath`.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		join_endpoint(&self.uris.token_uri, &self.uris.token_path)
			.map_err(|source| ConfigError::InvalidUrl { field: "token endpoint", source })
	}

	/// Consent screen: `authorizationUri` joined with `authorizationPath`.
	pub fn authorization_endpoint(&self) -> Result<Url, ConfigError> {
		join_endpoint(&self.uris.authorization_uri, &self.uris.authorization_path)
			.map_err(|source| ConfigError::InvalidUrl { field: "authorization endpoint", source })
	}

	/// Default request timeout.
	pub fn timeout(&self) -> StdDuration {
		StdDuration::from_millis(self.timeout)
	}

	/// Normalized expiry factor.
	pub fn expiry_factor(&self) -> Result<ExpiryFactor, ConfigError> {
		ExpiryFactor::new(self.token_expires_factor)
	}
}

fn join_endpoint(base: &str, path: &str) -> Result<Url, url::ParseError> {
	Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))
}

fn default_response_type() -> String {
	"code".into()
}

fn default_timeout_ms() -> u64 {
	DEFAULT_TIMEOUT_MS
}

fn default_expires_factor() -> f64 {
	DEFAULT_EXPIRES_FACTOR_PERCENTAGE
}
