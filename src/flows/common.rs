//! Shared helpers for token-endpoint exchanges and response handling.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{
	RequestBuilder,
	header::{ACCEPT, AUTHORIZATION},
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	config::Credentials,
	error::TransportError,
	expiry::{self, ExpiryFactor},
	flows::FitbitClient,
	http::ApiResponse,
};

/// Builds the `Authorization: Basic` value from the client credentials.
pub(crate) fn basic_authorization(creds: &Credentials) -> String {
	let raw = format!("{}:{}", creds.client_id, creds.client_secret);

	format!("Basic {}", STANDARD.encode(raw))
}

/// Sends a prepared request and buffers the whole response.
pub(crate) async fn send(builder: RequestBuilder, url: &Url) -> Result<ApiResponse> {
	let response =
		builder.send().await.map_err(|e| TransportError::from_reqwest(url.as_str(), e))?;
	let status = response.status().as_u16();
	let headers = response.headers().to_owned();
	let body = response
		.bytes()
		.await
		.map_err(|e| TransportError::from_reqwest(url.as_str(), e))?
		.to_vec();

	Ok(ApiResponse { url: url.to_string(), status, headers, body })
}

/// Turns non-2xx responses into [`Error::ProviderRejected`].
pub(crate) fn ensure_success(response: ApiResponse) -> Result<ApiResponse> {
	if response.is_success() {
		return Ok(response);
	}

	Err(Error::ProviderRejected {
		url: response.url.clone(),
		status: response.status,
		body: response.text(),
	})
}

/// Posts a grant to the token endpoint and returns the parsed, unstamped token.
pub(crate) async fn request_token(
	client: &FitbitClient,
	params: &[(&str, &str)],
) -> Result<Token> {
	let url = &client.token_endpoint;
	let builder = client
		.http_client
		.post(url.clone())
		.header(AUTHORIZATION, basic_authorization(&client.config.creds))
		.header(ACCEPT, "application/json")
		.timeout(client.config.timeout())
		.form(params);
	let response = ensure_success(send(builder, url).await?)?;
	let token = response.json::<Token>()?;

	if token.bearer().is_none() {
		return Err(Error::token_corrupt("token response carries no access_token"));
	}

	Ok(token)
}

/// Stamps expiry metadata on a token freshly issued by the provider.
pub(crate) fn stamp_issued(
	token: &Token,
	issued_at: OffsetDateTime,
	factor: ExpiryFactor,
) -> Result<Token> {
	expiry::compute_expiry(token, issued_at, factor).map_err(|e| Error::token_corrupt(e.to_string()))
}
