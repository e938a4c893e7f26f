//! Token-manager state machine: cached fast path, single-flight client-credentials
//! exchange, and the memoized client assertion.
//!
//! The manager moves through `NoToken → Cached(valid) | Cached(expired) →
//! Refreshing → Cached(valid)`. The cached fast path must be the common case: a
//! usable stored token is returned without any network traffic. Only an absent,
//! expired, or corrupt cache entry (or a forced refresh after a rejected bearer)
//! triggers the exchange.

// self
use crate::{
	_prelude::*,
	auth::{
		assertion::{ASSERTION_TYPE, ClientAssertion},
		token::AccessToken,
	},
	client::Client,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

#[derive(Deserialize)]
struct TokenExchangeResponse {
	access_token: String,
	token_type: String,
	expires_in: i64,
	#[serde(default)]
	scope: Option<String>,
}

impl Client {
	/// Returns a currently valid access token, refreshing only when needed.
	///
	/// Reads the cache first and returns a stored token while `now < expires_at`.
	/// Otherwise the client signs (or reuses) its assertion, performs the
	/// client-credentials exchange, persists the fresh token, and returns it. A
	/// corrupt cache entry counts as a miss; UTC instants throughout.
	pub async fn access_token(&self) -> Result<AccessToken> {
		const KIND: CallKind = CallKind::TokenExchange;

		let span = CallSpan::new(KIND, "access_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.access_token_inner(false)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Bypasses the cache read for the executor's one-shot 401 recovery.
	pub(crate) async fn fresh_access_token(&self) -> Result<AccessToken> {
		self.access_token_inner(true).await
	}

	async fn access_token_inner(&self, force: bool) -> Result<AccessToken> {
		// Concurrent callers piggy-back on one in-flight exchange instead of
		// stampeding the token endpoint.
		let _singleflight = self.refresh_guard.lock().await;
		let now = OffsetDateTime::now_utc();

		if !force {
			match self.store.load(&self.slot).await {
				Ok(Some(cached)) if cached.is_usable_at(now) => return Ok(cached),
				Ok(_) => {},
				Err(e) if e.is_corrupt() =>
					obs::debug_event("cached token entry is corrupt; treating as a miss"),
				Err(e) => return Err(e.into()),
			}
		}

		let token = self.exchange_client_credentials(now).await?;

		self.store.store(&self.slot, &token).await?;

		Ok(token)
	}

	async fn exchange_client_credentials(&self, now: OffsetDateTime) -> Result<AccessToken> {
		let assertion = self.client_assertion(now)?;
		let params = [
			("grant_type", "client_credentials"),
			("client_id", self.credential.client_id()),
			("client_assertion_type", ASSERTION_TYPE),
			("client_assertion", assertion.token()),
			("scope", self.credential.scope().token_scope()),
		];
		let (body, status) = self.post_form(self.token_endpoint.clone(), &params).await?;

		if status != 200 {
			return Err(Error::Auth {
				status: Some(status),
				reason: exchange_failure_reason(&body),
			});
		}

		let acquired_at = OffsetDateTime::now_utc();
		let parsed: TokenExchangeResponse = serde_path_to_error::deserialize(body)
			.map_err(|e| Error::Decode { source: e, status: Some(status) })?;

		Ok(AccessToken::from_exchange(
			parsed.access_token,
			parsed.token_type,
			parsed.expires_in,
			parsed.scope,
			acquired_at,
		))
	}

	/// Returns the memoized assertion, signing one on first use.
	///
	/// Assertions live 180 days, so one signature per client instance suffices;
	/// an expired memo is re-signed in place.
	fn client_assertion(&self, now: OffsetDateTime) -> Result<ClientAssertion> {
		let mut memo = self.assertion.lock();

		if let Some(existing) = memo.as_ref().filter(|a| !a.is_expired_at(now)) {
			return Ok(existing.clone());
		}

		let signed = ClientAssertion::sign(&self.credential, now)?;

		*memo = Some(signed.clone());

		Ok(signed)
	}
}

fn exchange_failure_reason(body: &serde_json::Value) -> String {
	body.get("error")
		.and_then(serde_json::Value::as_str)
		.map(str::to_owned)
		.unwrap_or_else(|| "token endpoint returned a non-success response".into())
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros::datetime;
	// self
	use super::*;
	use crate::auth::credential::tests::TEST_KEY_PEM;

	fn client() -> Client {
		Client::builder()
			.private_key_pem(TEST_KEY_PEM)
			.client_id("BUSINESSAPI.abc123")
			.key_id("KEY1")
			.build()
			.expect("Session test client should build.")
	}

	#[test]
	fn assertion_is_memoized_per_client() {
		let client = client();
		let now = datetime!(2026-03-01 00:00:00 UTC);
		let first =
			client.client_assertion(now).expect("First assertion request should succeed.");
		let second = client
			.client_assertion(now + Duration::days(10))
			.expect("Second assertion request should succeed.");

		assert_eq!(first.token(), second.token());
	}

	#[test]
	fn expired_assertion_memo_is_resigned() {
		let client = client();
		let now = datetime!(2026-03-01 00:00:00 UTC);
		let first =
			client.client_assertion(now).expect("First assertion request should succeed.");
		let second = client
			.client_assertion(now + Duration::days(181))
			.expect("Post-expiry assertion request should succeed.");

		assert_ne!(first.token(), second.token());
		assert_eq!(second.expires_at, now + Duration::days(181) + Duration::days(180));
	}

	#[test]
	fn exchange_failure_reason_prefers_the_error_field() {
		assert_eq!(
			exchange_failure_reason(&json!({ "error": "invalid_client" })),
			"invalid_client",
		);
		assert_eq!(
			exchange_failure_reason(&json!({ "detail": "?" })),
			"token endpoint returned a non-success response",
		);
	}
}
