//! Expiry policy: stamping tokens with a safety-margined expiry and deciding staleness.
//!
//! Tokens are treated as expiring after a configurable fraction of their nominal lifetime so
//! clock skew and network latency never push a request past the provider's real cutoff. The
//! epoch-millis `expires_at_timestamp` field is canonical; the RFC 3339 `expires_at` string is
//! kept for humans and as a fallback for records written without the timestamp.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, auth::Token, error::ConfigError};

/// Fraction of a token's lifetime after which it is treated as expired.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExpiryFactor(f64);
impl ExpiryFactor {
	/// Uses the full nominal lifetime.
	pub const FULL: Self = Self(1.0);

	/// Builds a factor from a fraction (`0.8`) or a percentage (`80`).
	///
	/// Values above `1` are read as percentages and divided by 100.
	pub fn new(raw: f64) -> Result<Self, ConfigError> {
		if !raw.is_finite() || raw <= 0.0 {
			return Err(ConfigError::InvalidExpiryFactor { value: raw });
		}

		let fraction = if raw > 1.0 { raw / 100.0 } else { raw };

		if fraction > 1.0 {
			return Err(ConfigError::InvalidExpiryFactor { value: raw });
		}

		Ok(Self(fraction))
	}

	/// Normalized fraction in `(0, 1]`.
	pub fn fraction(self) -> f64 {
		self.0
	}

	/// Scales a lifetime in seconds, rounding to the nearest second.
	pub fn scale(self, seconds: i64) -> i64 {
		(seconds as f64 * self.0).round() as i64
	}
}
impl Default for ExpiryFactor {
	fn default() -> Self {
		Self(0.8)
	}
}
impl TryFrom<f64> for ExpiryFactor {
	type Error = ConfigError;

	fn try_from(value: f64) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ExpiryFactor> for f64 {
	fn from(value: ExpiryFactor) -> Self {
		value.0
	}
}

/// Returns a copy of `token` whose expiry fields read `issued_at + round(expires_in × factor)`.
pub fn compute_expiry(
	token: &Token,
	issued_at: OffsetDateTime,
	factor: ExpiryFactor,
) -> Result<Token, ConfigError> {
	let expires_in = token.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn);
	}

	let lifetime = Duration::seconds(factor.scale(expires_in));
	let expires_at =
		issued_at.checked_add(lifetime).ok_or(ConfigError::ExpiresInOutOfRange)?;
	let millis = i64::try_from(expires_at.unix_timestamp_nanos() / 1_000_000)
		.map_err(|_| ConfigError::ExpiresInOutOfRange)?;
	let formatted = expires_at.format(&Rfc3339).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	Ok(Token {
		expires_at: Some(formatted),
		expires_at_timestamp: Some(millis),
		..token.clone()
	})
}

/// Expiry instant recorded on the token, preferring the epoch-millis field.
///
/// Returns `None` when neither field is present or the stored value cannot be interpreted.
pub fn expiry_instant(token: &Token) -> Option<OffsetDateTime> {
	if let Some(millis) = token.expires_at_timestamp {
		return OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok();
	}

	token.expires_at.as_deref().and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
}

/// Returns `true` if the token must not be used at `now`.
///
/// Tokens without usable expiry information are always expired so they get verified first.
pub fn is_expired_at(token: &Token, now: OffsetDateTime) -> bool {
	match expiry_instant(token) {
		Some(expires_at) => now >= expires_at,
		None => true,
	}
}

/// [`is_expired_at`] against the current UTC clock.
pub fn is_expired(token: &Token) -> bool {
	is_expired_at(token, OffsetDateTime::now_utc())
}
