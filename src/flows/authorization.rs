//! Authorization-code grant: consent-screen URL and code exchange.

// self
use crate::{
	_prelude::*,
	auth::Token,
	expiry::ExpiryFactor,
	flows::{FitbitClient, common},
	gate::AcquireMode,
	obs::{self, FlowKind, LogLevel},
};

impl FitbitClient {
	/// Consent-screen URL carrying `response_type`, `client_id`, `redirect_uri`, and the optional
	/// `scope` and `state`.
	pub fn authorize_url(&self) -> Result<Url> {
		let params = &self.config.authorization;
		let mut url = self.config.authorization_endpoint()?;

		{
			let mut query = url.query_pairs_mut();

			query
				.append_pair("response_type", &params.response_type)
				.append_pair("client_id", &self.config.creds.client_id)
				.append_pair("redirect_uri", &params.redirect_uri);

			if let Some(scope) = params.scope.as_deref().filter(|s| !s.trim().is_empty()) {
				query.append_pair("scope", scope);
			}
			if let Some(state) = params.state.as_deref().filter(|s| !s.is_empty()) {
				query.append_pair("state", state);
			}
		}

		Ok(url)
	}

	/// Exchanges a one-time authorization `code` for a token, persists it, and makes it current.
	///
	/// The token keeps its full lifetime, measured from when the exchange started.
	pub async fn exchange_code(&self, code: &str) -> Result<Token> {
		let token = self
			.gate
			.acquire(AcquireMode::Force, |_| {
				obs::observe(FlowKind::AuthorizationCode, "exchange_code", self.exchange(code))
			})
			.await?;

		Ok(Token::clone(&token))
	}

	async fn exchange(&self, code: &str) -> Result<Token> {
		let started_at = OffsetDateTime::now_utc();
		let creds = &self.config.creds;
		let issued = common::request_token(self, &[
			("code", code),
			("redirect_uri", &self.config.authorization.redirect_uri),
			("grant_type", "authorization_code"),
			("client_id", &creds.client_id),
			("client_secret", &creds.client_secret),
		])
		.await
		.inspect_err(|e| {
			self.log(
				LogLevel::Error,
				"Authorization code exchange failed.",
				Some(serde_json::json!({ "error": e.to_string(), "status": e.status() })),
			)
		})?;
		let token = common::stamp_issued(&issued, started_at, ExpiryFactor::FULL)?;
		let token = self.store.write(token).await?;

		self.log(LogLevel::Info, "Authorization code exchanged.", Some(token.redacted_summary()));

		Ok(token)
	}
}
