//! Request signing contracts plus the OAuth 1.0a HMAC-SHA1 signer (RFC 5849).
//!
//! Signing only attaches an `Authorization` header derived from already-issued credentials; no
//! token acquisition happens here.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
use time::OffsetDateTime;
// self
use crate::{_prelude::*, auth::Credentials, error::ConfigError, http::ApiRequest};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal; everything else is percent-encoded.
const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
const NONCE_LEN: usize = 32;
const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Describes how to attach authorization state to an outbound request without constraining the
/// request type.
pub trait RequestSigner<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it with authorization attached.
	fn sign(&self, request: Request) -> Result<Request, Error>;
}

/// OAuth 1.0a signer using HMAC-SHA1 over consumer and access-token secrets.
#[derive(Clone, Debug)]
pub struct Oauth1Signer {
	credentials: Credentials,
}
impl Oauth1Signer {
	/// Creates a signer that owns `credentials`.
	pub fn new(credentials: Credentials) -> Self {
		Self { credentials }
	}

	/// Computes the `Authorization` header value for `request` with a fixed nonce and timestamp.
	pub fn authorization_header(
		&self,
		request: &ApiRequest,
		nonce: &str,
		timestamp: i64,
	) -> Result<String, ConfigError> {
		let mut oauth = self.protocol_params(nonce, timestamp);
		let signature = self.signature(request, &oauth)?;

		oauth.push(("oauth_signature", signature));
		oauth.sort();

		let fields = oauth
			.iter()
			.map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
			.collect::<Vec<_>>()
			.join(", ");

		Ok(format!("OAuth {fields}"))
	}

	fn protocol_params(&self, nonce: &str, timestamp: i64) -> Vec<(&'static str, String)> {
		vec![
			("oauth_consumer_key", self.credentials.consumer_key.expose().to_owned()),
			("oauth_nonce", nonce.to_owned()),
			("oauth_signature_method", SIGNATURE_METHOD.to_owned()),
			("oauth_timestamp", timestamp.to_string()),
			("oauth_token", self.credentials.access_token.expose().to_owned()),
			("oauth_version", OAUTH_VERSION.to_owned()),
		]
	}

	fn signature(
		&self,
		request: &ApiRequest,
		oauth: &[(&'static str, String)],
	) -> Result<String, ConfigError> {
		let base = signature_base_string(request, oauth);
		let key = format!(
			"{}&{}",
			encode(self.credentials.consumer_secret.expose()),
			encode(self.credentials.access_token_secret.expose())
		);
		// HMAC accepts keys of any length; longer keys are hashed first.
		let mut mac = HmacSha1::new_from_slice(key.as_bytes())
			.map_err(|_| ConfigError::InvalidSigningKey)?;

		mac.update(base.as_bytes());

		Ok(STANDARD.encode(mac.finalize().into_bytes()))
	}
}
impl RequestSigner<ApiRequest, Error> for Oauth1Signer {
	fn sign(&self, request: ApiRequest) -> Result<ApiRequest> {
		let nonce = generate_nonce();
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();
		let header = self.authorization_header(&request, &nonce, timestamp)?;

		Ok(request.with_header("Authorization", header))
	}
}

/// Builds the RFC 5849 §3.4.1 signature base string.
fn signature_base_string(request: &ApiRequest, oauth: &[(&'static str, String)]) -> String {
	let mut params = oauth
		.iter()
		.map(|(k, v)| (encode(k), encode(v)))
		.chain(request.url.query_pairs().map(|(k, v)| (encode(&k), encode(&v))))
		.chain(request.form.iter().map(|(k, v)| (encode(k), encode(v))))
		.collect::<Vec<_>>();

	params.sort();

	let normalized = params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

	format!(
		"{}&{}&{}",
		request.method.as_str(),
		encode(&base_string_uri(&request.url)),
		encode(&normalized)
	)
}

/// Scheme, host, non-default port, and path; query and fragment are excluded.
fn base_string_uri(url: &Url) -> String {
	let mut uri = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());

	if let Some(port) = url.port() {
		uri.push(':');
		uri.push_str(&port.to_string());
	}

	uri.push_str(url.path());

	uri
}

fn encode(value: &str) -> String {
	utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

fn generate_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}
