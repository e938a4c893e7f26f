//! Access-token model and the redacted secret wrapper.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Short-lived bearer credential persisted across process invocations.
///
/// The absolute expiry is computed once at acquisition (`now + expires_in`) so
/// cached copies can be judged without re-contacting the token endpoint. All
/// instants are UTC.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Token type reported by the endpoint (`Bearer`).
	pub token_type: String,
	/// Absolute expiry instant derived from the acquisition time.
	pub expires_at: OffsetDateTime,
	/// Scope string granted by the endpoint, when reported.
	pub scope: Option<String>,
}
impl AccessToken {
	/// Builds a token from an exchange response received at `now`.
	///
	/// A non-positive `expires_in` yields `expires_at == now`, i.e. a token that is
	/// already expired and will never be served from cache.
	pub fn from_exchange(
		value: impl Into<String>,
		token_type: impl Into<String>,
		expires_in: i64,
		scope: Option<String>,
		now: OffsetDateTime,
	) -> Self {
		let expires_at = if expires_in <= 0 { now } else { now + Duration::seconds(expires_in) };

		Self { token: TokenSecret::new(value), token_type: token_type.into(), expires_at, scope }
	}

	/// Returns `true` while `instant` is strictly before the expiry.
	pub fn is_usable_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}

	/// Convenience helper judging usability against the current UTC clock.
	pub fn is_usable(&self) -> bool {
		self.is_usable_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn expiry_boundary_is_exclusive() {
		let now = datetime!(2026-01-01 00:00:00 UTC);
		let token = AccessToken::from_exchange("tok", "Bearer", 3_600, None, now);

		assert_eq!(token.expires_at, now + Duration::hours(1));
		assert!(token.is_usable_at(token.expires_at - Duration::seconds(1)));
		assert!(!token.is_usable_at(token.expires_at));
		assert!(!token.is_usable_at(token.expires_at + Duration::seconds(1)));
	}

	#[test]
	fn non_positive_expires_in_is_immediately_expired() {
		let now = datetime!(2026-01-01 00:00:00 UTC);

		for expires_in in [0, -5] {
			let token = AccessToken::from_exchange("tok", "Bearer", expires_in, None, now);

			assert_eq!(token.expires_at, now);
			assert!(!token.is_usable_at(now));
		}
	}

	#[test]
	fn cached_form_round_trips() {
		let now = datetime!(2026-01-01 00:00:00 UTC);
		let token =
			AccessToken::from_exchange("tok1", "Bearer", 600, Some("business.api".into()), now);
		let serialized =
			serde_json::to_string(&token).expect("Access token should serialize to JSON.");
		let restored: AccessToken =
			serde_json::from_str(&serialized).expect("Serialized token should deserialize.");

		assert_eq!(restored.token.expose(), "tok1");
		assert_eq!(restored.expires_at, token.expires_at);
		assert_eq!(restored.scope.as_deref(), Some("business.api"));
	}
}
