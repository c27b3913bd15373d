//! Request and response descriptors for authenticated API calls.
//!
//! [`ApiRequest`] is the typed descriptor executed by [`FitbitClient::request`]; the client fills
//! in the `Authorization` header and default timeout. [`RequestOptions`] is the loose,
//! deserializable shape accepted from configuration files or scripting layers and converts into
//! an [`ApiRequest`]. [`ApiResponse`] carries the raw provider answer back to the caller.
//!
//! [`FitbitClient::request`]: crate::FitbitClient::request

// crates.io
use reqwest::{
	Method,
	header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::ConfigError};

/// Body attached to an [`ApiRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
	/// Serialized as JSON with `Content-Type: application/json`.
	Json(Value),
	/// Serialized as `application/x-www-form-urlencoded` pairs, in order.
	Form(Vec<(String, String)>),
	/// Sent verbatim.
	Text(String),
}

/// Outbound call descriptor.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Caller headers; an `Authorization` header set here is left untouched.
	pub headers: HeaderMap,
	/// Per-request timeout; the configured client timeout applies when `None`.
	pub timeout: Option<StdDuration>,
	/// Optional body.
	pub body: Option<RequestBody>,
}
impl ApiRequest {
	/// Creates a bodiless request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), timeout: None, body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Adds a header, validating both name and value.
	pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let (name, value) = parse_header(name, value)?;

		self.headers.insert(name, value);

		Ok(self)
	}

	/// Overrides the client timeout for this request.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Attaches a JSON body.
	pub fn with_json(mut self, value: Value) -> Self {
		self.body = Some(RequestBody::Json(value));

		self
	}

	/// Attaches a URL-encoded form body.
	pub fn with_form<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.body =
			Some(RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()));

		self
	}

	/// Attaches a raw text body.
	pub fn with_text(mut self, body: impl Into<String>) -> Self {
		self.body = Some(RequestBody::Text(body.into()));

		self
	}
}
impl TryFrom<RequestOptions> for ApiRequest {
	type Error = ConfigError;

	fn try_from(options: RequestOptions) -> Result<Self, Self::Error> {
		let raw_url = options.url.or(options.uri).ok_or(ConfigError::MissingRequestUrl)?;
		let url = Url::parse(&raw_url)
			.map_err(|source| ConfigError::InvalidUrl { field: "request url", source })?;
		let method = match options.method.as_deref().map(str::trim) {
			None | Some("") => Method::GET,
			Some(raw) => Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
				.map_err(|_| ConfigError::InvalidMethod { method: raw.to_owned() })?,
		};
		let mut request = Self::new(method, url);

		for (name, value) in &options.headers {
			let (name, value) = parse_header(name, value)?;

			request.headers.insert(name, value);
		}

		request.timeout = options.timeout.filter(|ms| *ms > 0).map(StdDuration::from_millis);
		request.body = if let Some(data) = options.data {
			Some(RequestBody::Json(data))
		} else if let Some(form) = options.form {
			Some(RequestBody::Form(form.into_iter().collect()))
		} else {
			options.body.map(RequestBody::Text)
		};

		Ok(request)
	}
}

/// Loose request shape, as accepted from JSON.
///
/// `uri` is a legacy alias for `url`; `url` wins when both are present. When several bodies are
/// supplied, `data` wins over `form`, which wins over `body`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
	/// Target URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// Legacy alias of [`RequestOptions::url`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uri: Option<String>,
	/// HTTP method; `GET` when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	/// Extra headers.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub headers: BTreeMap<String, String>,
	/// Timeout in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout: Option<u64>,
	/// JSON body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	/// URL-encoded form body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub form: Option<BTreeMap<String, String>>,
	/// Raw text body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
}
impl RequestOptions {
	/// Moves a legacy `uri` into `url` unless `url` is already set.
	pub fn normalize(mut self) -> Self {
		if self.url.is_none() {
			self.url = self.uri.take();
		} else {
			self.uri = None;
		}

		self
	}
}

/// Raw provider response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// URL that produced the response.
	pub url: String,
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, lossy.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Parses the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			Error::MalformedResponse {
				url: self.url.clone(),
				status: self.status,
				source: Arc::new(source),
			}
		})
	}

	/// `Retry-After` hint as a relative duration, when the provider sent a usable one.
	pub fn retry_after(&self) -> Option<Duration> {
		parse_retry_after(&self.headers)
	}
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
	let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
	let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
	let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

	Ok((header_name, header_value))
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
