mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use futures::future;
// self
use common::*;
use fitbit_oauth::{
	error::TransportError,
	gate::GatePhase,
	http::{ApiRequest, RequestOptions},
	store::{StoreError, StoreFuture, TokenStore},
};

/// Serves a fixed token but fails every write.
struct FailingWrites(Token);
impl TokenStore for FailingWrites {
	fn read(&self) -> StoreFuture<'_, Token> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}

	fn write(&self, _: Token) -> StoreFuture<'_, Token> {
		Box::pin(async { Err(StoreError::Backend { message: "disk full".into() }) })
	}
}

#[tokio::test]
async fn concurrent_requests_share_a_single_refresh() {
	const CALLERS: usize = 5;

	let server = MockServer::start_async().await;
	let store = MemoryStore::with_token(expired_token("access-old", "refresh-old"));
	let client = client(&server, &store);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("authorization", BASIC_AUTHORIZATION)
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-new", Some("refresh-new"), 28_800));
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer access-new");
			then.status(200)
				.header("content-type", "application/json")
				.header("fitbit-rate-limit-limit", "150")
				.header("fitbit-rate-limit-remaining", "140")
				.header("fitbit-rate-limit-reset", "1200")
				.body(r#"{"user":{"encodedId":"ABC123"}}"#);
		})
		.await;
	let responses = future::join_all(
		(0..CALLERS).map(|_| client.request(ApiRequest::get(profile_url(&server)))),
	)
	.await;

	token_mock.assert_calls_async(1).await;
	profile_mock.assert_calls_async(CALLERS).await;

	for response in responses {
		let response = response.expect("Every queued request should succeed after the refresh.");

		assert_eq!(response.status, 200);
	}

	let stored = store.snapshot().expect("Refreshed token should be persisted.");

	assert_eq!(store.writes(), 1);
	assert_eq!(bearer(&stored), Some("access-new"));
	assert_eq!(stored.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-new"));
	assert!(!expiry::is_expired(&stored));
	assert_eq!(client.phase(), GatePhase::Ready);
	assert_eq!(client.queued(), 0);
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().successes(), 1);

	let limits = client.rate_limits().expect("Rate-limit headers should be recorded.");

	assert_eq!((limits.limit, limits.remaining, limits.reset), (Some(150), Some(140), Some(1200)));
}

#[tokio::test]
async fn fresh_stored_token_is_loaded_once_and_reused() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::with_token(fresh_token("access-current", "refresh-current"));
	let client = client(&server, &store);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(500);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer access-current");
			then.status(200).body("{}");
		})
		.await;

	for _ in 0..2 {
		client
			.request(ApiRequest::get(profile_url(&server)))
			.await
			.expect("Fresh token should authorize the request.");
	}

	token_mock.assert_calls_async(0).await;
	profile_mock.assert_calls_async(2).await;

	assert_eq!(store.reads(), 1);
	assert_eq!(store.writes(), 0);
	assert_eq!(client.token().as_ref().and_then(bearer), Some("access-current"));
}

#[tokio::test]
async fn corrupt_token_fails_without_network_calls() {
	let server = MockServer::start_async().await;
	let corrupt = Token { access_token: None, ..fresh_token("unused", "refresh") };
	let store = MemoryStore::with_token(corrupt);
	let client = client(&server, &store);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body(token_body("access-new", None, 28_800));
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(200).body("{}");
		})
		.await;
	let err = client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect_err("Token without an access token must be rejected.");

	assert!(matches!(err, Error::TokenCorrupt { .. }));

	token_mock.assert_calls_async(0).await;
	profile_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_corrupt_token_fails_without_refreshing() {
	let server = MockServer::start_async().await;
	let corrupt = Token { access_token: None, ..expired_token("unused", "refresh") };
	let store = MemoryStore::with_token(corrupt);
	let client = client(&server, &store);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-new", Some("refresh-new"), 28_800));
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(200).body("{}");
		})
		.await;
	let err = client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect_err("Expired token without an access token must be rejected.");

	assert!(matches!(err, Error::TokenCorrupt { .. }));

	token_mock.assert_calls_async(0).await;
	profile_mock.assert_calls_async(0).await;

	assert_eq!(store.writes(), 0);
	assert_eq!(client.refresh_metrics().attempts(), 0);
	assert_eq!(client.phase(), GatePhase::Uninitialized);
}

#[tokio::test]
async fn store_write_failure_rejects_waiters_and_keeps_previous_token() {
	const CALLERS: usize = 3;

	let server = MockServer::start_async().await;
	let store = FailingWrites(expired_token("access-stored", "refresh-stored"));
	let client = FitbitClient::with_store(config(&server), Arc::new(store))
		.expect("Mock provider config should build a client.");

	client
		.set_token(expired_token("access-held", "refresh-held"))
		.await
		.expect("Installing a token should succeed.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-new", Some("refresh-new"), 28_800));
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(200).body("{}");
		})
		.await;
	let outcomes = future::join_all(
		(0..CALLERS).map(|_| client.request(ApiRequest::get(profile_url(&server)))),
	)
	.await;

	for outcome in outcomes {
		match outcome {
			Err(Error::Storage(StoreError::Backend { message })) => assert_eq!(message, "disk full"),
			other => panic!("Unexpected outcome: {other:?}"),
		}
	}

	token_mock.assert_calls_async(1).await;
	profile_mock.assert_calls_async(0).await;

	assert_eq!(client.phase(), GatePhase::Ready);
	assert_eq!(client.queued(), 0);
	assert_eq!(client.token().as_ref().and_then(bearer), Some("access-held"));
	assert_eq!(client.refresh_metrics().failures(), 1);
}

#[tokio::test]
async fn slow_provider_surfaces_as_transport_timeout() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::with_token(fresh_token("access-current", "refresh-current"));
	let client = client(&server, &store);

	server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(200).delay(StdDuration::from_millis(500)).body("{}");
		})
		.await;

	let err = client
		.request(ApiRequest::get(profile_url(&server)).with_timeout(StdDuration::from_millis(50)))
		.await
		.expect_err("A request outliving its timeout must fail.");

	match err {
		Error::Transport(TransportError::Timeout { url }) => assert!(url.ends_with(PROFILE_PATH)),
		other => panic!("Unexpected outcome: {other:?}"),
	}

	assert_eq!(client.phase(), GatePhase::Ready);
	assert!(client.rate_limits().is_none());
}

#[tokio::test]
async fn rejected_refresh_rejects_waiters_and_keeps_previous_token() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::with_token(expired_token("access-old", "refresh-old"));
	let client = client(&server, &store);

	client
		.set_token(expired_token("access-held", "refresh-held"))
		.await
		.expect("Installing a token should succeed.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"errors":[{"errorType":"invalid_grant"}],"success":false}"#);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(200).body("{}");
		})
		.await;
	let (first, second) = tokio::join!(
		client.request(ApiRequest::get(profile_url(&server))),
		client.request(ApiRequest::get(profile_url(&server))),
	);

	for outcome in [first, second] {
		match outcome {
			Err(Error::ProviderRejected { status, body, .. }) => {
				assert_eq!(status, 400);
				assert!(body.contains("invalid_grant"));
			},
			other => panic!("Unexpected outcome: {other:?}"),
		}
	}

	token_mock.assert_calls_async(1).await;
	profile_mock.assert_calls_async(0).await;

	assert_eq!(store.writes(), 0);
	assert_eq!(client.phase(), GatePhase::Ready);
	assert_eq!(client.queued(), 0);
	assert_eq!(client.token().as_ref().and_then(bearer), Some("access-held"));
	assert_eq!(client.refresh_metrics().failures(), 1);
}

#[tokio::test]
async fn failed_first_load_releases_gate_for_retry() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::default();
	let client = client(&server, &store);
	let err = client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect_err("An empty store cannot authorize requests.");

	assert!(matches!(err, Error::Storage(_)));
	assert_eq!(client.phase(), GatePhase::Uninitialized);

	store
		.write(fresh_token("access-late", "refresh-late"))
		.await
		.expect("Memory store write should succeed.");

	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer access-late");
			then.status(200).body("{}");
		})
		.await;

	client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect("Next request should load the token again.");

	profile_mock.assert_async().await;
}

#[tokio::test]
async fn stored_token_without_expiry_metadata() {
	let server = MockServer::start_async().await;
	let legacy = Token::new("access-legacy", 28_800).with_refresh_token("refresh-legacy");
	let store = MemoryStore::with_token(legacy);
	let legacy_client = client(&server, &store);
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer access-legacy");
			then.status(200).body("{}");
		})
		.await;

	legacy_client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect("A token with expires_in should be stamped and used.");

	profile_mock.assert_async().await;

	let server = MockServer::start_async().await;
	let bare = Token { expires_in: None, ..Token::new("access-bare", 1) }
		.with_refresh_token("refresh-bare");
	let store = MemoryStore::with_token(bare);
	let bare_client = client(&server, &store);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-verified", None, 28_800));
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer access-verified");
			then.status(200).body("{}");
		})
		.await;

	bare_client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect("A token without any expiry information should be refreshed first.");

	token_mock.assert_async().await;
	profile_mock.assert_async().await;

	let stored = store.snapshot().expect("Refreshed token should be persisted.");

	assert_eq!(bearer(&stored), Some("access-verified"));
	assert_eq!(stored.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-bare"));
}

#[tokio::test]
async fn legacy_options_and_caller_headers_are_honored() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::with_token(fresh_token("access-current", "refresh-current"));
	let client = client(&server, &store);
	let override_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/1/user/-/body/log/fat.json").header(
				"authorization",
				"Bearer caller-supplied",
			);
			then.status(201).body(r#"{"fatLog":{"fat":21.5}}"#);
		})
		.await;
	let options: RequestOptions = serde_json::from_value(serde_json::json!({
		"uri": server.url("/1/user/-/body/log/fat.json"),
		"method": "POST",
		"headers": { "Authorization": "Bearer caller-supplied" },
		"form": { "fat": "21.5", "date": "2021-01-26" }
	}))
	.expect("Legacy request options should parse.");
	let response = client.request_with(options).await.expect("Legacy request should succeed.");

	override_mock.assert_async().await;

	assert_eq!(response.status, 201);
	assert_eq!(
		response.json::<serde_json::Value>().expect("Response should be JSON.")["fatLog"]["fat"],
		serde_json::json!(21.5)
	);
}

#[tokio::test]
async fn rate_limits_are_recorded_on_rejected_requests() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::with_token(fresh_token("access-current", "refresh-current"));
	let client = client(&server, &store);

	server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(429)
				.header("fitbit-rate-limit-limit", "150")
				.header("fitbit-rate-limit-remaining", "0")
				.header("fitbit-rate-limit-reset", "600")
				.header("retry-after", "600")
				.body("Too Many Requests");
		})
		.await;

	let err = client
		.request(ApiRequest::get(profile_url(&server)))
		.await
		.expect_err("Rate-limited requests surface as provider rejections.");

	assert_eq!(err.status(), Some(429));

	let limits = client.rate_limits().expect("Rate limits should be recorded on failures too.");

	assert_eq!(limits.remaining, Some(0));
	assert_eq!(limits.reset, Some(600));
}
