//! Redacted secrets and the four-part OAuth 1.0a credential set.

// self
use crate::{_prelude::*, error::ConfigError};

/// Redacted secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Consumer and access-token pairs issued by the platform for a single account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Application consumer key.
	pub consumer_key: Secret,
	/// Application consumer secret.
	pub consumer_secret: Secret,
	/// User access token.
	pub access_token: Secret,
	/// User access token secret.
	pub access_token_secret: Secret,
}
impl Credentials {
	/// Builds a credential set, rejecting any blank component.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
		access_token: impl Into<String>,
		access_token_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let credentials = Self {
			consumer_key: Secret::new(consumer_key),
			consumer_secret: Secret::new(consumer_secret),
			access_token: Secret::new(access_token),
			access_token_secret: Secret::new(access_token_secret),
		};

		for (name, secret) in [
			("consumer key", &credentials.consumer_key),
			("consumer secret", &credentials.consumer_secret),
			("access token", &credentials.access_token),
			("access token secret", &credentials.access_token_secret),
		] {
			if secret.is_blank() {
				return Err(ConfigError::MissingCredential { name });
			}
		}

		Ok(credentials)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn credentials_reject_blank_components() {
		let err = Credentials::new("ck", "cs", "  ", "as")
			.expect_err("Whitespace-only access token should be rejected.");

		assert!(matches!(err, ConfigError::MissingCredential { name: "access token" }));

		let credentials = Credentials::new("ck", "hunter2-consumer", "at", "as")
			.expect("Complete credentials should build.");

		assert!(!format!("{credentials:?}").contains("hunter2"));
		assert_eq!(credentials.consumer_secret.expose(), "hunter2-consumer");
	}
}
