//! Transport primitives for API calls.
//!
//! The module exposes [`ApiHttpClient`] alongside the transport-neutral [`ApiRequest`] and
//! [`ApiResponse`] values so callers can plug in their own HTTP stack (or a scripted fake in
//! tests) without touching the collector. [`SignedHttpClient`] layers a
//! [`RequestSigner`](crate::auth::RequestSigner) over any transport, which is how the binary
//! produces the pre-authenticated client the collector expects.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	auth::RequestSigner,
	error::{ConfigError, DecodeError, TransportError},
};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute a single API request.
///
/// Implementations must be `Send + Sync + 'static` so a client can be shared behind an
/// [`Arc`] by the collector and the one-shot API calls. Transport failures (connect, TLS, body
/// read) are reported as [`Error::Transport`]; HTTP status handling is left to the caller via
/// [`ApiResponse::error_for_status`].
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response.
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_>;
}

/// HTTP verbs used by the API surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`.
	Get,
	/// `POST` with a form-encoded body.
	Post,
}
impl HttpMethod {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-neutral outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// Request verb.
	pub method: HttpMethod,
	/// Absolute request URL, query string included.
	pub url: Url,
	/// Extra headers in insertion order.
	pub headers: Vec<(String, String)>,
	/// Form parameters sent as an `application/x-www-form-urlencoded` body.
	pub form: Vec<(String, String)>,
}
impl ApiRequest {
	/// Creates a `GET` request for `url`.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, headers: Vec::new(), form: Vec::new() }
	}

	/// Creates a `POST` request carrying `form` as its body.
	///
	/// None of the block-list endpoints need this. Form parameters take part in the OAuth 1.0a
	/// signature base string, so the signer and its tests rely on requests built this way.
	pub fn post_form<K, V>(url: Url, form: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		let form = form.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		Self { method: HttpMethod::Post, url, headers: Vec::new(), form }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Appends `Accept: application/json`.
	pub fn accept_json(self) -> Self {
		self.with_header("Accept", "application/json")
	}

	/// Looks up the first header named `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}
}

/// Raw response captured by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Converts non-2xx responses into [`TransportError::Status`].
	pub fn error_for_status(self) -> Result<Self, TransportError> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(TransportError::status(self.status, &self.body))
		}
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source })
	}
}

/// Transport wrapper that signs every request before handing it to the inner client.
#[derive(Clone, Debug)]
pub struct SignedHttpClient<C, S> {
	inner: C,
	signer: S,
}
impl<C, S> SignedHttpClient<C, S> {
	/// Pairs a transport with a signer.
	pub fn new(inner: C, signer: S) -> Self {
		Self { inner, signer }
	}

	/// Returns the wrapped transport.
	pub fn inner(&self) -> &C {
		&self.inner
	}
}
impl<C, S> ApiHttpClient for SignedHttpClient<C, S>
where
	C: ApiHttpClient,
	S: 'static + RequestSigner<ApiRequest, Error>,
{
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_> {
		match self.signer.sign(request) {
			Ok(signed) => self.inner.execute(signed),
			Err(e) => Box::pin(async move { Err(e) }),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that identifies itself with `user_agent`.
	pub fn with_user_agent(user_agent: &str) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, form } = request;
			let mut builder = match method {
				HttpMethod::Get => client.get(url),
				HttpMethod::Post => client.post(url).form(&form),
			};

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}
