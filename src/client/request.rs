//! The request-execution pipeline: URL/query construction, bearer attachment, and
//! response classification.
//!
//! GET and POST have divergent classification needs, so they are separate
//! contracts rather than one request function with flags: GET must surface
//! bearer-token validity (401 stays a distinct, reachable case ahead of the
//! generic non-success arm), while the token-endpoint POST must sniff the body
//! for `invalid_request` because the endpoint embeds error details in-body even
//! under a 2xx transport status.

// crates.io
use reqwest::{
	Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::token::AccessToken,
	client::Client,
	error::{ConfigError, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Query options recognized by GET operations.
///
/// Enumerates the options the API understands (sparse fieldsets, page limits)
/// plus an ordered passthrough bag for any other query key, instead of an
/// untyped key-value dispatch.
#[derive(Clone, Debug, Default)]
pub struct GetOptions {
	fields: Vec<String>,
	fields_key: Option<String>,
	limit: Option<u32>,
	extra: Vec<(String, String)>,
}
impl GetOptions {
	/// Starts an empty option set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests a sparse fieldset, rendered as `fields[<key>]=<comma-joined>`.
	pub fn fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields = fields.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the fieldset resource key; defaults to the last path segment.
	pub fn fields_key(mut self, key: impl Into<String>) -> Self {
		self.fields_key = Some(key.into());

		self
	}

	/// Caps the number of resources returned per page.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Appends an arbitrary passthrough query pair (e.g. a pagination cursor).
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.push((key.into(), value.into()));

		self
	}

	fn is_empty(&self) -> bool {
		self.fields.is_empty() && self.limit.is_none() && self.extra.is_empty()
	}

	pub(crate) fn apply(&self, url: &mut Url, path: &str) {
		if self.is_empty() {
			return;
		}

		let mut pairs = url.query_pairs_mut();

		if !self.fields.is_empty() {
			let key = self.fields_key.clone().unwrap_or_else(|| default_fields_key(path));

			pairs.append_pair(&format!("fields[{key}]"), &self.fields.join(","));
		}
		if let Some(limit) = self.limit {
			pairs.append_pair("limit", &limit.to_string());
		}
		for (key, value) in &self.extra {
			pairs.append_pair(key, value);
		}
	}
}

impl Client {
	/// Issues an authenticated GET against the resource API and decodes the body.
	///
	/// A rejected bearer (HTTP 401) triggers exactly one forced token refresh and
	/// retry; a second consecutive rejection surfaces as [`Error::Auth`].
	pub async fn get<T>(&self, path: &str, options: GetOptions) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::ResourceGet;

		let span = CallSpan::new(KIND, "get");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.get_inner(path, options)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Issues an unauthenticated form-encoded POST, token-endpoint style.
	///
	/// Treats HTTP 429 as [`Error::RateLimited`], parses the JSON body regardless
	/// of status, classifies an in-body `"error": "invalid_request"` as
	/// [`Error::Validation`] even under a 2xx status, and otherwise returns the
	/// body together with the raw status code for the caller to branch on.
	pub async fn post_form(
		&self,
		url: Url,
		params: &[(&str, &str)],
	) -> Result<(Value, u16)> {
		let response =
			self.http.post(url).form(&params).send().await.map_err(TransportError::from)?;
		let (status, retry_after, bytes) = split_response(response).await?;

		if status == StatusCode::TOO_MANY_REQUESTS {
			return Err(Error::RateLimited { status: status.as_u16(), retry_after });
		}

		let body: Value = decode_json(&bytes, status.as_u16())?;

		if body.get("error").and_then(Value::as_str) == Some("invalid_request") {
			return Err(Error::Validation {
				status: Some(status.as_u16()),
				reason: invalid_request_reason(&body),
			});
		}

		Ok((body, status.as_u16()))
	}

	/// Issues an authenticated JSON POST against the resource API.
	///
	/// Classification mirrors [`get`](Self::get), including the one-shot 401
	/// recovery; the raw status code is returned alongside the decoded body so
	/// callers can distinguish e.g. `201 Created` from `200 OK`.
	pub async fn post_json<T>(&self, path: &str, body: &Value) -> Result<(T, u16)>
	where
		T: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::ResourceCreate;

		let span = CallSpan::new(KIND, "post_json");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.post_json_inner(path, body)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn get_inner<T>(&self, path: &str, options: GetOptions) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut url = self.resource_url(path)?;

		options.apply(&mut url, path);

		let token = self.access_token().await?;

		match self.execute_get(&url, &token).await {
			Err(Error::Auth { .. }) => {
				obs::debug_event("bearer token rejected; forcing one refresh");

				let token = self.fresh_access_token().await?;

				self.execute_get(&url, &token).await
			},
			other => other,
		}
	}

	async fn post_json_inner<T>(&self, path: &str, body: &Value) -> Result<(T, u16)>
	where
		T: DeserializeOwned,
	{
		let url = self.resource_url(path)?;
		let token = self.access_token().await?;

		match self.execute_post_json(&url, &token, body).await {
			Err(Error::Auth { .. }) => {
				obs::debug_event("bearer token rejected; forcing one refresh");

				let token = self.fresh_access_token().await?;

				self.execute_post_json(&url, &token, body).await
			},
			other => other,
		}
	}

	async fn execute_get<T>(&self, url: &Url, token: &AccessToken) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self
			.http
			.get(url.clone())
			.header(AUTHORIZATION, bearer(token))
			.send()
			.await
			.map_err(TransportError::from)?;
		let (status, retry_after, bytes) = split_response(response).await?;

		classify_resource_status(status, retry_after, &bytes)?;
		decode_json(&bytes, status.as_u16())
	}

	async fn execute_post_json<T>(
		&self,
		url: &Url,
		token: &AccessToken,
		body: &Value,
	) -> Result<(T, u16)>
	where
		T: DeserializeOwned,
	{
		let response = self
			.http
			.post(url.clone())
			.header(AUTHORIZATION, bearer(token))
			.json(body)
			.send()
			.await
			.map_err(TransportError::from)?;
		let (status, retry_after, bytes) = split_response(response).await?;

		classify_resource_status(status, retry_after, &bytes)?;

		let parsed = decode_json(&bytes, status.as_u16())?;

		Ok((parsed, status.as_u16()))
	}

	fn resource_url(&self, path: &str) -> Result<Url> {
		self.api_origin
			.join(path.trim_start_matches('/'))
			.map_err(|e| ConfigError::InvalidUrl { source: e }.into())
	}
}

fn bearer(token: &AccessToken) -> String {
	format!("Bearer {}", token.token.expose())
}

async fn split_response(response: Response) -> Result<(StatusCode, Option<Duration>, Vec<u8>)> {
	let status = response.status();
	let retry_after = parse_retry_after(response.headers());
	let bytes = response.bytes().await.map_err(TransportError::from)?;

	Ok((status, retry_after, bytes.to_vec()))
}

fn classify_resource_status(
	status: StatusCode,
	retry_after: Option<Duration>,
	body: &[u8],
) -> Result<()> {
	// 401 is checked ahead of the generic non-success arm so the authentication
	// case stays reachable.
	if status == StatusCode::UNAUTHORIZED {
		return Err(Error::Auth { status: Some(status.as_u16()), reason: body_preview(body) });
	}
	if status == StatusCode::TOO_MANY_REQUESTS {
		return Err(Error::RateLimited { status: status.as_u16(), retry_after });
	}
	if !status.is_success() {
		return Err(Error::Api { status: status.as_u16(), message: body_preview(body) });
	}

	Ok(())
}

fn decode_json<T>(bytes: &[u8], status: u16) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| Error::Decode { source: e, status: Some(status) })
}

fn default_fields_key(path: &str) -> String {
	path.trim_matches('/').rsplit('/').next().unwrap_or(path).to_owned()
}

fn invalid_request_reason(body: &Value) -> String {
	body.get("error_description")
		.and_then(Value::as_str)
		.unwrap_or("invalid_request")
		.to_owned()
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return "<empty body>".into();
	}

	let mut preview = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
		preview.push_str("...");
	}

	preview
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(path: &str) -> Url {
		let mut url =
			Url::parse("https://api-business.apple.com").expect("Test origin should parse.");

		url.set_path(path);

		url
	}

	#[test]
	fn fields_rewrite_uses_the_last_path_segment_by_default() {
		let mut target = url("/v1/orgDevices");
		let options = GetOptions::new().fields(["serialNumber", "color"]);

		options.apply(&mut target, "v1/orgDevices");

		assert_eq!(
			target.query(),
			Some("fields%5BorgDevices%5D=serialNumber%2Ccolor"),
		);

		let decoded: Vec<_> = target.query_pairs().collect();

		assert_eq!(decoded[0].0, "fields[orgDevices]");
		assert_eq!(decoded[0].1, "serialNumber,color");
	}

	#[test]
	fn fields_key_override_wins() {
		let mut target = url("/v1/orgDevices/ABC123");
		let options =
			GetOptions::new().fields(["serialNumber"]).fields_key("orgDevices").limit(50);

		options.apply(&mut target, "v1/orgDevices/ABC123");

		let decoded: Vec<_> = target.query_pairs().collect();

		assert_eq!(decoded[0].0, "fields[orgDevices]");
		assert_eq!(decoded[1], ("limit".into(), "50".into()));
	}

	#[test]
	fn passthrough_pairs_keep_their_order() {
		let mut target = url("/v1/orgDevices");
		let options = GetOptions::new().query("cursor", "abc").query("sort", "serialNumber");

		options.apply(&mut target, "v1/orgDevices");

		let decoded: Vec<_> = target.query_pairs().collect();

		assert_eq!(decoded[0], ("cursor".into(), "abc".into()));
		assert_eq!(decoded[1], ("sort".into(), "serialNumber".into()));
	}

	#[test]
	fn empty_options_leave_the_url_untouched() {
		let mut target = url("/v1/orgDevices");

		GetOptions::new().apply(&mut target, "v1/orgDevices");

		assert_eq!(target.query(), None);
	}

	#[test]
	fn default_fields_key_handles_nested_paths() {
		assert_eq!(default_fields_key("v1/orgDevices"), "orgDevices");
		assert_eq!(default_fields_key("/v1/mdmServers/"), "mdmServers");
		assert_eq!(
			default_fields_key("v1/orgDevices/ABC/relationships/assignedServer"),
			"assignedServer",
		);
	}

	#[test]
	fn classification_keeps_unauthorized_distinct() {
		let err = classify_resource_status(StatusCode::UNAUTHORIZED, None, b"expired")
			.expect_err("401 should classify as an error.");

		assert!(matches!(err, Error::Auth { status: Some(401), .. }));

		let err = classify_resource_status(StatusCode::NOT_FOUND, None, b"missing")
			.expect_err("404 should classify as an error.");

		assert!(matches!(err, Error::Api { status: 404, .. }));

		classify_resource_status(StatusCode::OK, None, b"{}")
			.expect("2xx should classify as success.");
	}

	#[test]
	fn rate_limits_carry_the_retry_after_hint() {
		let err = classify_resource_status(
			StatusCode::TOO_MANY_REQUESTS,
			Some(Duration::seconds(12)),
			b"slow down",
		)
		.expect_err("429 should classify as an error.");

		assert!(matches!(
			err,
			Error::RateLimited { status: 429, retry_after: Some(d) } if d == Duration::seconds(12)
		));
	}

	#[test]
	fn retry_after_parses_seconds_and_ignores_junk() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "17".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(17)));

		headers.insert(RETRY_AFTER, "soonish".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn body_previews_are_bounded_and_non_empty() {
		assert_eq!(body_preview(b"  "), "<empty body>");
		assert_eq!(body_preview(b"plain failure"), "plain failure");

		let long = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = body_preview(long.as_bytes());

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 3);
		assert!(preview.ends_with("..."));
	}
}
