//! The AxM API client: authenticated request pipeline plus resource operations.

pub mod activities;
pub mod request;

mod devices;
mod servers;
mod session;

pub use activities::*;
pub use request::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{
		assertion::{ClientAssertion, TOKEN_ENDPOINT},
		credential::{Credential, OrgScope},
	},
	error::ConfigError,
	store::{MemoryStore, TokenStore},
};

const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Authenticated client for one Apple Business Manager or Apple School Manager
/// enrollment.
///
/// The client owns the HTTP transport, the credential material, the memoized
/// client assertion, and a handle to the token store, so resource operations can
/// focus on paths and payloads. Construct one via [`Client::builder`].
pub struct Client {
	pub(crate) credential: Credential,
	pub(crate) http: ReqwestClient,
	pub(crate) api_origin: Url,
	pub(crate) token_endpoint: Url,
	pub(crate) store: Arc<dyn TokenStore>,
	pub(crate) slot: String,
	pub(crate) assertion: Mutex<Option<ClientAssertion>>,
	pub(crate) refresh_guard: AsyncMutex<()>,
}
impl Client {
	/// Starts a builder with no fields set.
	pub fn builder() -> ClientBuilder {
		ClientBuilder::default()
	}

	/// The organization scope derived from the client identifier.
	pub fn scope(&self) -> OrgScope {
		self.credential.scope()
	}

	/// The resource API origin requests are issued against.
	pub fn api_origin(&self) -> &Url {
		&self.api_origin
	}

	/// The store slot this client caches its access token under.
	pub fn cache_slot(&self) -> &str {
		&self.slot
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("credential", &self.credential)
			.field("api_origin", &self.api_origin.as_str())
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("slot", &self.slot)
			.finish()
	}
}

/// Validated builder for [`Client`].
///
/// `private_key_pem`, `client_id`, and `key_id` are required; everything else has
/// a scope-derived or conventional default. Validation happens once in
/// [`build`](Self::build), which fails with [`ConfigError`] on missing or
/// malformed material.
#[derive(Default)]
pub struct ClientBuilder {
	private_key_pem: Option<String>,
	client_id: Option<String>,
	key_id: Option<String>,
	api_origin: Option<Url>,
	token_endpoint: Option<Url>,
	store: Option<Arc<dyn TokenStore>>,
	cache_slot: Option<String>,
	timeout: Option<StdDuration>,
	http_client: Option<ReqwestClient>,
}
impl ClientBuilder {
	/// Sets the PEM-encoded EC private key registered with Apple.
	pub fn private_key_pem(mut self, pem: impl Into<String>) -> Self {
		self.private_key_pem = Some(pem.into());

		self
	}

	/// Sets the OAuth 2.0 client identifier (`BUSINESSAPI.…` or `SCHOOLAPI.…`).
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the identifier of the registered key pair.
	pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
		self.key_id = Some(key_id.into());

		self
	}

	/// Overrides the scope-derived API origin (scheme + host only).
	///
	/// The override never alters the `scope` parameter sent during the token
	/// exchange; that always follows the client identifier prefix.
	pub fn api_origin(mut self, origin: Url) -> Self {
		self.api_origin = Some(origin);

		self
	}

	/// Overrides the fixed OAuth 2.0 token endpoint (primarily for tests).
	pub fn token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	/// Sets the token store; defaults to an in-process [`MemoryStore`].
	pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Overrides the cache-slot name; defaults to `<scope>_access_token`.
	pub fn cache_slot(mut self, slot: impl Into<String>) -> Self {
		self.cache_slot = Some(slot.into());

		self
	}

	/// Sets the request timeout for the owned HTTP client (defaults to 30 s).
	///
	/// Ignored when [`http_client`](Self::http_client) supplies a transport;
	/// configure a comparable timeout on that client instead.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Supplies a pre-built transport instead of the owned default.
	pub fn http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = Some(client);

		self
	}

	/// Validates the configuration and constructs the client.
	pub fn build(self) -> Result<Client> {
		let credential = Credential::new(
			self.private_key_pem.ok_or(ConfigError::MissingField { field: "private_key_pem" })?,
			self.client_id.ok_or(ConfigError::MissingField { field: "client_id" })?,
			self.key_id.ok_or(ConfigError::MissingField { field: "key_id" })?,
		)?;
		let api_origin = match self.api_origin {
			Some(origin) => origin,
			None => Url::parse(credential.scope().api_origin())
				.map_err(|e| ConfigError::InvalidUrl { source: e })?,
		};
		let token_endpoint = match self.token_endpoint {
			Some(endpoint) => endpoint,
			None =>
				Url::parse(TOKEN_ENDPOINT).map_err(|e| ConfigError::InvalidUrl { source: e })?,
		};
		let http = match self.http_client {
			Some(client) => client,
			None => ReqwestClient::builder()
				.timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
				.build()
				.map_err(ConfigError::from)?,
		};
		let slot = self
			.cache_slot
			.unwrap_or_else(|| format!("{}_access_token", credential.scope()));
		let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::default()));

		Ok(Client {
			credential,
			http,
			api_origin,
			token_endpoint,
			store,
			slot,
			assertion: Mutex::new(None),
			refresh_guard: AsyncMutex::new(()),
		})
	}
}
impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("private_key_pem", &self.private_key_pem.as_ref().map(|_| "<redacted>"))
			.field("client_id", &self.client_id)
			.field("key_id", &self.key_id)
			.field("api_origin", &self.api_origin)
			.field("cache_slot", &self.cache_slot)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::credential::tests::TEST_KEY_PEM;

	#[test]
	fn build_derives_origin_and_slot_from_scope() {
		let client = Client::builder()
			.private_key_pem(TEST_KEY_PEM)
			.client_id("SCHOOLAPI.abc123")
			.key_id("KEY1")
			.build()
			.expect("School client should build.");

		assert_eq!(client.scope(), OrgScope::School);
		assert_eq!(client.api_origin().as_str(), "https://api-school.apple.com/");
		assert_eq!(client.cache_slot(), "school_access_token");
	}

	#[test]
	fn origin_override_keeps_scope_derivation() {
		let origin = Url::parse("https://axm.example.internal").expect("Override should parse.");
		let client = Client::builder()
			.private_key_pem(TEST_KEY_PEM)
			.client_id("BUSINESSAPI.abc123")
			.key_id("KEY1")
			.api_origin(origin.clone())
			.build()
			.expect("Client with origin override should build.");

		assert_eq!(client.api_origin(), &origin);
		assert_eq!(client.scope(), OrgScope::Business);
		assert_eq!(client.scope().token_scope(), "business.api");
	}

	#[test]
	fn build_reports_missing_fields() {
		let err = Client::builder()
			.private_key_pem(TEST_KEY_PEM)
			.key_id("KEY1")
			.build()
			.expect_err("Missing client id should fail the build.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingField { field: "client_id" })
		));
	}

	#[test]
	fn build_rejects_unknown_prefixes() {
		let err = Client::builder()
			.private_key_pem(TEST_KEY_PEM)
			.client_id("VENDORAPI.abc123")
			.key_id("KEY1")
			.build()
			.expect_err("Unknown prefix should fail the build.");

		assert!(matches!(err, Error::Config(ConfigError::UnknownClientIdPrefix { .. })));
	}
}
