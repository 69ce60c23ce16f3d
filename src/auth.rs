//! Credential handling and OAuth 1.0a request signing.

pub mod credentials;
pub mod signer;

pub use credentials::*;
pub use signer::*;
