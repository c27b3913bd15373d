//! [`FitbitClient`] and the flows it runs: authorization, refresh, and authenticated requests.

pub mod authorization;
pub mod refresh;
pub mod request;

mod common;

pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::Token,
	config::ClientConfig,
	error::ConfigError,
	expiry::ExpiryFactor,
	gate::{GatePhase, RequestGate},
	obs::{LogLevel, Logger, NoopLogger},
	rate_limit::RateLimitSnapshot,
	store::{FileStore, TokenStore},
};

/// OAuth client bound to one provider account.
///
/// The client owns the token record: it loads it from the [`TokenStore`] on first use, refreshes
/// it through a single-flight [`RequestGate`] when it expires, and writes every new token back to
/// the store. Clones share the gate, store, and telemetry, so a clone handed to another task never
/// triggers a second refresh.
#[derive(Clone)]
pub struct FitbitClient {
	config: Arc<ClientConfig>,
	expiry_factor: ExpiryFactor,
	token_endpoint: Url,
	http_client: ReqwestClient,
	store: Arc<dyn TokenStore>,
	gate: Arc<RequestGate>,
	logger: Arc<dyn Logger>,
	rate_limits: Arc<RwLock<Option<RateLimitSnapshot>>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl FitbitClient {
	/// Creates a client persisting its token to `tokenFilePath`.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let path = config.token_file_path.clone().ok_or(ConfigError::MissingTokenStore)?;

		Self::with_store(config, Arc::new(FileStore::new(path)))
	}

	/// Creates a client backed by a caller-supplied store.
	pub fn with_store(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ConfigError> {
		config.validate()?;

		// Token endpoints answer directly; a redirect would leak the Basic credentials.
		let http_client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self {
			expiry_factor: config.expiry_factor()?,
			token_endpoint: config.token_endpoint()?,
			config: Arc::new(config),
			http_client,
			store,
			gate: Default::default(),
			logger: Arc::new(NoopLogger),
			rate_limits: Default::default(),
			refresh_metrics: Default::default(),
		})
	}

	/// Replaces the logger (a [`NoopLogger`] by default).
	pub fn with_logger(mut self, logger: impl 'static + Logger) -> Self {
		self.logger = Arc::new(logger);

		self
	}

	/// Replaces the reqwest client used for every provider call.
	pub fn with_http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = client;

		self
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Store backing this client.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Refresh counters shared by all clones.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Current token, if one has been established.
	pub fn token(&self) -> Option<Token> {
		self.gate.token().map(|token| Token::clone(&token))
	}

	/// Last rate-limit telemetry reported by the provider.
	pub fn rate_limits(&self) -> Option<RateLimitSnapshot> {
		*self.rate_limits.read()
	}

	/// Phase of the request gate.
	pub fn phase(&self) -> GatePhase {
		self.gate.phase()
	}

	/// Callers waiting on an in-flight token load or refresh.
	pub fn queued(&self) -> usize {
		self.gate.queued()
	}

	pub(crate) fn log(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>) {
		self.logger.log(level, message, data.as_ref());
	}
}
impl Debug for FitbitClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FitbitClient")
			.field("client_id", &self.config.creds.client_id)
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("phase", &self.gate.phase())
			.field("queued", &self.gate.queued())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn construction_validates_config_and_store() {
		let config = ClientConfig::new("ABC123", "s3cr3t", "https://app.example.com/callback");

		assert!(matches!(FitbitClient::new(config.clone()), Err(ConfigError::MissingTokenStore)));
		assert!(matches!(
			FitbitClient::with_store(
				ClientConfig::new("", "s3cr3t", "https://app.example.com/callback"),
				Arc::new(MemoryStore::default()),
			),
			Err(ConfigError::MissingCredential { field: "clientID" })
		));

		let client = FitbitClient::with_store(config, Arc::new(MemoryStore::default()))
			.expect("Valid config should build a client.");

		assert_eq!(client.phase(), GatePhase::Uninitialized);
		assert!(client.token().is_none());
		assert!(client.rate_limits().is_none());
		assert!(!format!("{client:?}").contains("s3cr3t"));
	}
}
