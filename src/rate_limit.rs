//! Advisory rate-limit telemetry reported by the provider on API responses.

// crates.io
use reqwest::header::HeaderMap;
// self
use crate::_prelude::*;

/// Header carrying the hourly request quota.
pub const LIMIT_HEADER: &str = "fitbit-rate-limit-limit";
/// Header carrying the remaining requests in the current window.
pub const REMAINING_HEADER: &str = "fitbit-rate-limit-remaining";
/// Header carrying the seconds until the window resets.
pub const RESET_HEADER: &str = "fitbit-rate-limit-reset";

/// Last observed `{limit, remaining, reset}` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
	/// Requests allowed per window.
	pub limit: Option<u64>,
	/// Requests left in the current window.
	pub remaining: Option<u64>,
	/// Seconds until the window resets.
	pub reset: Option<u64>,
	/// When the snapshot was taken.
	#[serde(with = "time::serde::rfc3339")]
	pub observed_at: OffsetDateTime,
}
impl RateLimitSnapshot {
	/// Reads the rate-limit headers; returns `None` if the response carries none of them.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let limit = header_u64(headers, LIMIT_HEADER);
		let remaining = header_u64(headers, REMAINING_HEADER);
		let reset = header_u64(headers, RESET_HEADER);

		if limit.is_none() && remaining.is_none() && reset.is_none() {
			return None;
		}

		Some(Self { limit, remaining, reset, observed_at: OffsetDateTime::now_utc() })
	}

	/// Instant at which the current window resets, when the provider reported one.
	pub fn resets_at(&self) -> Option<OffsetDateTime> {
		let reset = i64::try_from(self.reset?).ok()?;

		self.observed_at.checked_add(Duration::seconds(reset))
	}
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
	headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
