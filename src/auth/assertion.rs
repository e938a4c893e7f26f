//! Signed JWT client assertions for the RFC 7523 client-credentials exchange.

// crates.io
use jsonwebtoken::{Algorithm, Header};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::{credential::Credential, token::TokenSecret},
	error::ConfigError,
};

/// Fixed OAuth 2.0 token endpoint; also the `aud` claim of every assertion.
pub const TOKEN_ENDPOINT: &str = "https://account.apple.com/auth/oauth2/token";
/// Value of the `client_assertion_type` exchange parameter.
pub const ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const ASSERTION_VALIDITY: Duration = Duration::days(180);

#[derive(Serialize)]
struct AssertionClaims {
	iss: String,
	sub: String,
	aud: String,
	iat: i64,
	exp: i64,
	jti: String,
}

/// A signed client assertion proving the caller's identity to the token endpoint.
///
/// Assertions are valid for 180 days from signing and are only ever sent to the
/// token endpoint, never to resource endpoints. The client memoizes one per
/// instance; signing is a pure function of credential + clock + randomness, so a
/// duplicated first computation is benign.
#[derive(Clone, Debug)]
pub struct ClientAssertion {
	token: TokenSecret,
	/// Instant the assertion was signed.
	pub issued_at: OffsetDateTime,
	/// Instant the assertion stops being accepted.
	pub expires_at: OffsetDateTime,
}
impl ClientAssertion {
	/// Signs a fresh assertion for `credential` at `now`.
	///
	/// The payload carries `iss = sub = client_id`, `aud =` [`TOKEN_ENDPOINT`], the
	/// validity instants, and a random `jti`; the header carries `alg = ES256` and
	/// the credential's key identifier.
	pub fn sign(credential: &Credential, now: OffsetDateTime) -> Result<Self, ConfigError> {
		let issued_at = now;
		let expires_at = issued_at + ASSERTION_VALIDITY;
		let claims = AssertionClaims {
			iss: credential.client_id().to_owned(),
			sub: credential.client_id().to_owned(),
			aud: TOKEN_ENDPOINT.to_owned(),
			iat: issued_at.unix_timestamp(),
			exp: expires_at.unix_timestamp(),
			jti: Uuid::new_v4().to_string(),
		};
		let mut header = Header::new(Algorithm::ES256);

		header.kid = Some(credential.key_id().to_owned());

		let token = jsonwebtoken::encode(&header, &claims, credential.signing_key())
			.map_err(|e| ConfigError::AssertionSign { source: e })?;

		Ok(Self { token: TokenSecret::new(token), issued_at, expires_at })
	}

	/// Returns the signed compact JWT for the `client_assertion` parameter.
	pub fn token(&self) -> &str {
		self.token.expose()
	}

	/// Returns `true` once `instant` reaches the assertion expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
