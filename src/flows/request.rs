//! Authenticated request execution.
//!
//! Every request first passes the gate: with a fresh token it runs immediately, otherwise it
//! waits for (or itself drives) the load/refresh and then runs with the resulting token. The
//! executor injects `Authorization: Bearer …` unless the caller already set one, applies the
//! default timeout, and records rate-limit headers from every response, including failures.

// crates.io
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	expiry,
	flows::{FitbitClient, common},
	gate::AcquireMode,
	http::{ApiRequest, ApiResponse, RequestBody, RequestOptions},
	obs::{self, FlowKind, LogLevel},
	rate_limit::RateLimitSnapshot,
};

impl FitbitClient {
	/// Executes `request` with a valid bearer token, loading or refreshing it first if needed.
	///
	/// Non-2xx answers surface as [`Error::ProviderRejected`]; the response headers still update
	/// [`FitbitClient::rate_limits`].
	///
	/// Requests queued behind a token load are released in submission order. Each caller then
	/// sends its own request, so on a multi-threaded runtime those sends may overlap or reach the
	/// provider in a different order. Await requests one after another when the provider must see
	/// them in sequence.
	pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(FlowKind::Request, "request", async move {
			let token =
				self.gate.acquire(AcquireMode::Fresh, |current| self.establish(current)).await?;

			self.execute(&token, request).await
		})
		.await
	}

	/// Converts loose [`RequestOptions`] (legacy `uri` included) and runs them like
	/// [`FitbitClient::request`].
	pub async fn request_with(&self, options: RequestOptions) -> Result<ApiResponse> {
		self.request(ApiRequest::try_from(options.normalize())?).await
	}

	/// Installs a caller-supplied token without persisting it.
	///
	/// Waits for any in-flight load to land. A token carrying `expires_in` but no expiry instant
	/// is stamped from now with the configured factor.
	pub async fn set_token(&self, token: Token) -> Result<()> {
		let token = self.stamp_unstamped(token);

		self.gate.acquire(AcquireMode::Force, |_| async move { Ok::<_, Error>(token) }).await?;

		Ok(())
	}

	async fn establish(&self, current: Option<Arc<Token>>) -> Result<Token> {
		if let Some(current) = current {
			ensure_bearer(&current)?;

			return self.refresh_token(&current).await;
		}

		let stored = self.load_stored().await?;

		// Corruption is fatal; an expired token without an access token is never refreshed.
		ensure_bearer(&stored)?;

		if !expiry::is_expired(&stored) {
			return Ok(stored);
		}

		self.gate.mark_refreshing();
		self.refresh_token(&stored).await
	}

	/// Reads the stored token, stamping legacy records that only carry `expires_in`.
	pub(crate) async fn load_stored(&self) -> Result<Token> {
		obs::observe(FlowKind::Load, "load_stored", async move {
			let stored = self.stamp_unstamped(self.store.read().await?);

			self.log(LogLevel::Debug, "Token loaded from store.", Some(stored.redacted_summary()));

			Ok(stored)
		})
		.await
	}

	fn stamp_unstamped(&self, token: Token) -> Token {
		if token.has_expiry() || token.expires_in.is_none() {
			return token;
		}

		// Unusable lifetimes leave the token unstamped, which makes it expired.
		expiry::compute_expiry(&token, OffsetDateTime::now_utc(), self.expiry_factor)
			.unwrap_or(token)
	}

	async fn execute(&self, token: &Token, request: ApiRequest) -> Result<ApiResponse> {
		let bearer = ensure_bearer(token)?;
		let ApiRequest { method, url, mut headers, timeout, body } = request;

		if !headers.contains_key(AUTHORIZATION) {
			let mut value = HeaderValue::from_str(&format!("Bearer {}", bearer.expose()))
				.map_err(|_| Error::token_corrupt("access_token is not a valid header value"))?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}
		if matches!(body, Some(RequestBody::Json(_))) && !headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		}

		let mut builder = self
			.http_client
			.request(method.clone(), url.clone())
			.headers(headers)
			.timeout(timeout.unwrap_or_else(|| self.config.timeout()));

		builder = match body {
			Some(RequestBody::Json(value)) => builder.body(value.to_string()),
			Some(RequestBody::Form(pairs)) => builder.form(&pairs),
			Some(RequestBody::Text(text)) => builder.body(text),
			None => builder,
		};

		let response = common::send(builder, &url).await?;

		if let Some(snapshot) = RateLimitSnapshot::from_headers(&response.headers) {
			*self.rate_limits.write() = Some(snapshot);
		}

		self.log(
			LogLevel::Debug,
			"Provider request completed.",
			Some(serde_json::json!({
				"method": method.as_str(),
				"url": url.as_str(),
				"status": response.status,
			})),
		);

		common::ensure_success(response)
	}
}

fn ensure_bearer(token: &Token) -> Result<&TokenSecret> {
	token.bearer().ok_or_else(|| Error::token_corrupt("access_token is missing"))
}
