#![allow(dead_code)]

pub use std::sync::Arc;

pub use fitbit_oauth::{
	FitbitClient,
	auth::Token,
	config::ClientConfig,
	error::Error,
	expiry::{self, ExpiryFactor},
	store::MemoryStore,
};
pub use httpmock::prelude::*;
pub use time::{Duration, OffsetDateTime};

pub const CLIENT_ID: &str = "ABC123";
pub const CLIENT_SECRET: &str = "s3cr3t";
pub const BASIC_AUTHORIZATION: &str = "Basic QUJDMTIzOnMzY3IzdA==";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";
pub const TOKEN_PATH: &str = "/oauth2/token";
pub const PROFILE_PATH: &str = "/1/user/-/profile.json";

pub fn config(server: &MockServer) -> ClientConfig {
	ClientConfig::new(CLIENT_ID, CLIENT_SECRET, REDIRECT_URI)
		.with_token_endpoint(server.base_url(), TOKEN_PATH)
		.with_scope("activity profile weight")
}

pub fn client(server: &MockServer, store: &MemoryStore) -> FitbitClient {
	FitbitClient::with_store(config(server), Arc::new(store.clone()))
		.expect("Mock provider config should build a client.")
}

pub fn profile_url(server: &MockServer) -> url::Url {
	url::Url::parse(&server.url(PROFILE_PATH)).expect("Mock profile URL should parse.")
}

/// Token issued `age` ago with an eight-hour lifetime.
pub fn issued_token(access: &str, refresh: &str, age: Duration) -> Token {
	let token = Token::new(access, 28_800).with_refresh_token(refresh);

	expiry::compute_expiry(&token, OffsetDateTime::now_utc() - age, ExpiryFactor::FULL)
		.expect("Token fixture should compute an expiry.")
}

pub fn fresh_token(access: &str, refresh: &str) -> Token {
	issued_token(access, refresh, Duration::ZERO)
}

pub fn expired_token(access: &str, refresh: &str) -> Token {
	issued_token(access, refresh, Duration::hours(9))
}

pub fn token_body(access: &str, refresh: Option<&str>, expires_in: i64) -> String {
	let mut body = serde_json::json!({
		"access_token": access,
		"expires_in": expires_in,
		"scope": "activity profile weight",
		"token_type": "Bearer",
		"user_id": "ABC123",
	});

	if let Some(refresh) = refresh {
		body["refresh_token"] = refresh.into();
	}

	body.to_string()
}

pub fn bearer(token: &Token) -> Option<&str> {
	token.bearer().map(|secret| secret.expose())
}
