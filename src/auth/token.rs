//! Provider token record as issued by the token endpoint and persisted by stores.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// OAuth token held by a client.
///
/// Field names follow the provider's JSON so records written by other tooling load unchanged.
/// Unknown provider fields are kept in [`Token::extra`] and written back untouched.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
	/// Bearer credential; a token without one is corrupt.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Credential used to mint the next access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime in seconds at issuance.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// RFC 3339 expiry instant, for human inspection.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<String>,
	/// Expiry instant as Unix epoch milliseconds; preferred for comparisons.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at_timestamp: Option<i64>,
	/// Space-delimited scopes granted by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Token type reported by the provider (usually `Bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Provider user identifier the token belongs to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	/// Any other provider fields, passed through unmodified.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl Token {
	/// Creates a token carrying only an access credential and lifetime.
	pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
		Self {
			access_token: Some(TokenSecret::new(access_token)),
			expires_in: Some(expires_in),
			..Default::default()
		}
	}

	/// Sets the refresh credential.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Returns the access credential if it is present and non-blank.
	pub fn bearer(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref().filter(|secret| !secret.is_blank())
	}

	/// Returns the refresh credential if it is present and non-blank.
	pub fn refresh_secret(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_blank())
	}

	/// Returns `true` if either expiry field is populated.
	pub fn has_expiry(&self) -> bool {
		self.expires_at_timestamp.is_some() || self.expires_at.is_some()
	}

	/// Summary that is safe to hand to a logger.
	pub fn redacted_summary(&self) -> serde_json::Value {
		serde_json::json!({
			"user_id": self.user_id,
			"scope": self.scope,
			"expires_in": self.expires_in,
			"expires_at": self.expires_at,
			"has_refresh_token": self.refresh_token.is_some(),
		})
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("expires_at", &self.expires_at)
			.field("expires_at_timestamp", &self.expires_at_timestamp)
			.field("scope", &self.scope)
			.field("token_type", &self.token_type)
			.field("user_id", &self.user_id)
			.finish_non_exhaustive()
	}
}
