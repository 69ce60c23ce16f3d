//! Drain a cursor-paginated block list behind a signed REST API, then lift one block chosen at
//! random.
//!
//! The crate is organized around [`pagination::Collector`], which exhausts an endpoint that hands
//! back an opaque continuation cursor per page. Everything else (request signing, transport,
//! endpoint layout, orchestration) exists to feed that loop and act on its result.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod app;
pub mod auth;
#[cfg(feature = "cli")] pub mod cli;
pub mod error;
pub mod http;
pub mod obs;
pub mod pagination;
pub mod select;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use color_eyre as _;
#[cfg(test)] use httpmock as _;
