//! Crate-level error types shared across the collector, transport, and orchestrator.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const STATUS_BODY_PREVIEW: usize = 256;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout, or a non-success status).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Random selection was attempted over an empty identifier sequence.
	#[error("No candidates available: the identifier sequence is empty.")]
	NoCandidates,
	/// User lookup returned no record for the requested identifier.
	#[error("User {id} was not returned by the lookup endpoint.")]
	UserNotFound {
		/// Identifier that was looked up.
		id: i64,
	},
	/// The configured page guard was reached before a terminal cursor arrived.
	#[error("Stopped after {pages} pages without reaching a terminal cursor.")]
	PageLimit {
		/// Number of pages fetched before stopping.
		pages: usize,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// API base URL cannot be used to resolve endpoints.
	#[error("API base `{url}` is invalid: {reason}.")]
	InvalidApiBase {
		/// Offending base URL.
		url: String,
		/// Why the base was rejected.
		reason: &'static str,
	},
	/// Endpoint path could not be joined onto the API base.
	#[error("Endpoint `{path}` could not be resolved.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		path: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The HMAC signing key was refused.
	#[error("Signing key was rejected by the HMAC implementation.")]
	InvalidSigningKey,
	/// A required credential was blank.
	#[error("Credential `{name}` must not be empty.")]
	MissingCredential {
		/// Human-readable credential name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures: network, deadline, or HTTP status.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The per-request deadline elapsed before a response arrived.
	#[error("Request timed out after {millis} ms.")]
	Timeout {
		/// Deadline that elapsed, in milliseconds.
		millis: u128,
	},
	/// The API answered with a non-success status code.
	#[error("API responded with HTTP {status}: {body}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Leading portion of the response body.
		body: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a [`TransportError::Status`] with a bounded preview of the body.
	pub fn status(status: u16, body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);
		let body = text.chars().take(STATUS_BODY_PREVIEW).collect();

		Self::Status { status, body }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Body decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The body was not valid JSON for the expected type.
	#[error("Response body is not valid JSON for the expected shape.")]
	Json {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_preview_is_bounded() {
		let body = vec![b'x'; STATUS_BODY_PREVIEW * 2];
		let TransportError::Status { status, body } = TransportError::status(503, &body) else {
			panic!("Status constructor should build the Status variant.");
		};

		assert_eq!(status, 503);
		assert_eq!(body.len(), STATUS_BODY_PREVIEW);
	}

	#[test]
	fn transparent_variants_forward_messages() {
		let err = Error::from(TransportError::Timeout { millis: 1500 });

		assert_eq!(err.to_string(), "Request timed out after 1500 ms.");
		assert_eq!(
			Error::NoCandidates.to_string(),
			"No candidates available: the identifier sequence is empty."
		);
	}
}
