//! Refresh-token exchange.
//!
//! Refreshes always run as the gate's loader, so at most one exchange is in flight per client.
//! The new token is stamped with the configured expiry factor from the moment the request
//! started and is persisted before any caller sees it. A provider that omits `refresh_token`
//! keeps the previous one valid, so it is carried over.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::Token,
	flows::{FitbitClient, common},
	gate::AcquireMode,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, LogLevel},
};

impl FitbitClient {
	/// Forces a refresh-token exchange, waiting for any in-flight load to land first.
	///
	/// Without a held token the stored one is loaded and refreshed.
	pub async fn refresh(&self) -> Result<Token> {
		let token = self
			.gate
			.acquire(AcquireMode::Force, |current| async move {
				match current {
					Some(current) => self.refresh_token(&current).await,
					None => {
						let stored = self.load_stored().await?;

						self.gate.mark_refreshing();
						self.refresh_token(&stored).await
					},
				}
			})
			.await?;

		Ok(Token::clone(&token))
	}

	/// Exchanges `current`'s refresh credential for a new token and persists it.
	pub(crate) async fn refresh_token(&self, current: &Token) -> Result<Token> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let refresh = current
					.refresh_secret()
					.ok_or_else(|| Error::token_corrupt("refresh_token is missing"))?;
				let started_at = OffsetDateTime::now_utc();
				let issued = common::request_token(self, &[
					("grant_type", "refresh_token"),
					("refresh_token", refresh.expose()),
				])
				.await?;
				let mut token = common::stamp_issued(&issued, started_at, self.expiry_factor)?;

				if token.refresh_secret().is_none() {
					token.refresh_token = current.refresh_token.clone();
				}

				Ok::<_, Error>(self.store.write(token).await?)
			})
			.await;

		match &result {
			Ok(token) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.refresh_metrics.record_success();
				self.log(LogLevel::Info, "Access token refreshed.", Some(token.redacted_summary()));
			},
			Err(e) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.refresh_metrics.record_failure();
				self.log(
					LogLevel::Error,
					"Access token refresh failed.",
					Some(serde_json::json!({ "error": e.to_string(), "status": e.status() })),
				);
			},
		}

		result
	}
}
