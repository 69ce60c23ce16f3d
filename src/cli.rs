//! Command-line configuration and logging setup for the `block-roulette` binary.
//!
//! Every option can also come from the environment (or a `.env` file in the working directory),
//! and the historical single-dash spellings `-at`, `-as`, `-ck`, and `-cs` are accepted.

// std
use std::{ffi::OsString, num::NonZeroUsize, time::Duration};
// crates.io
use clap::{Parser, ValueEnum};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;
// self
use crate::{
	_prelude::*,
	api::{ApiEndpoints, BlocksClient, DEFAULT_API_BASE},
	auth::{Credentials, Oauth1Signer},
	error::ConfigError,
	http::{ReqwestHttpClient, SignedHttpClient},
	pagination::{Collector, DecodePolicy},
};

/// Transport used by the binary: reqwest with OAuth 1.0a signing.
pub type SignedReqwestClient = SignedHttpClient<ReqwestHttpClient, Oauth1Signer>;

const LEGACY_FLAGS: [&str; 4] = ["at", "as", "ck", "cs"];
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
	/// Human-readable lines.
	#[default]
	Pretty,
	/// One JSON object per event.
	Json,
}

/// Runtime configuration for the `block-roulette` binary.
///
/// The four credentials are required. A missing one is a usage error: clap prints the usage text
/// to standard error and the process exits with status 2.
#[derive(Clone, Debug, Parser)]
#[command(
	name = "block-roulette",
	version,
	about = "Unblock one randomly chosen account from your block list."
)]
pub struct Cli {
	/// Access token.
	#[arg(long = "at", env = "BLOCK_ROULETTE_ACCESS_TOKEN", hide_env_values = true)]
	pub access_token: String,
	/// Access token secret.
	#[arg(long = "as", env = "BLOCK_ROULETTE_ACCESS_TOKEN_SECRET", hide_env_values = true)]
	pub access_token_secret: String,
	/// Consumer key.
	#[arg(long = "ck", env = "BLOCK_ROULETTE_CONSUMER_KEY", hide_env_values = true)]
	pub consumer_key: String,
	/// Consumer secret.
	#[arg(long = "cs", env = "BLOCK_ROULETTE_CONSUMER_SECRET", hide_env_values = true)]
	pub consumer_secret: String,

	/// API base that endpoint paths are resolved against.
	#[arg(long, env = "BLOCK_ROULETTE_API_BASE", default_value = DEFAULT_API_BASE)]
	pub api_base: Url,
	/// Per-request deadline in seconds; `0` disables it.
	#[arg(long, env = "BLOCK_ROULETTE_TIMEOUT_SECS", default_value_t = 30)]
	pub timeout_secs: u64,
	/// Give up after this many block-list pages without a terminal cursor; omit for no limit.
	#[arg(long, env = "BLOCK_ROULETTE_MAX_PAGES")]
	pub max_pages: Option<NonZeroUsize>,
	/// Treat undecodable block-list pages as the end of the list instead of failing.
	#[arg(long)]
	pub lenient_decode: bool,
	/// Pick and report an account without lifting the block.
	#[arg(long)]
	pub dry_run: bool,
	/// Seed for the random choice; omit for an OS-seeded source.
	#[arg(long, env = "BLOCK_ROULETTE_SEED")]
	pub seed: Option<u64>,
	/// Log output format.
	#[arg(long, value_enum, env = "BLOCK_ROULETTE_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
	pub log_format: LogFormat,
}
impl Cli {
	/// Loads `.env` (if present) and parses the process arguments.
	pub fn load() -> Self {
		let _ = dotenvy::dotenv();

		Self::parse_from(normalize_legacy_flags(std::env::args_os()))
	}

	/// Validates the four credentials.
	pub fn credentials(&self) -> Result<Credentials, ConfigError> {
		Credentials::new(
			&self.consumer_key,
			&self.consumer_secret,
			&self.access_token,
			&self.access_token_secret,
		)
	}

	/// Per-request deadline, if enabled.
	pub fn request_timeout(&self) -> Option<Duration> {
		(self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
	}

	/// Decode policy selected by `--lenient-decode`.
	pub fn decode_policy(&self) -> DecodePolicy {
		if self.lenient_decode { DecodePolicy::Lenient } else { DecodePolicy::Strict }
	}

	/// Random source for the selection step.
	pub fn rng(&self) -> StdRng {
		match self.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		}
	}

	/// Builds the signed client and its collector from this configuration.
	pub fn build_client(&self) -> Result<BlocksClient<SignedReqwestClient>> {
		let endpoints = ApiEndpoints::new(self.api_base.clone())?;
		let signer = Oauth1Signer::new(self.credentials()?);
		let transport = ReqwestHttpClient::with_user_agent(USER_AGENT)?;
		let http_client = Arc::new(SignedHttpClient::new(transport, signer));
		let mut collector =
			Collector::new(Arc::clone(&http_client)).with_decode_policy(self.decode_policy());

		if let Some(timeout) = self.request_timeout() {
			collector = collector.with_request_timeout(timeout);
		}
		if let Some(max_pages) = self.max_pages {
			collector = collector.with_max_pages(max_pages);
		}

		Ok(BlocksClient::new(http_client, endpoints).with_collector(collector))
	}
}

/// Rewrites `-at`, `-as`, `-ck`, `-cs` (optionally `=value`) into their `--` forms.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
	I: IntoIterator,
	I::Item: Into<OsString>,
{
	args.into_iter()
		.map(Into::into)
		.map(|arg| {
			let Some(text) = arg.to_str() else {
				return arg;
			};
			let Some(flag) = text.strip_prefix('-').filter(|rest| !rest.starts_with('-')) else {
				return arg;
			};
			let name = flag.split_once('=').map_or(flag, |(name, _)| name);

			if LEGACY_FLAGS.contains(&name) { OsString::from(format!("-{text}")) } else { arg }
		})
		.collect()
}

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(format: LogFormat) -> Result<(), Box<dyn StdError + Send + Sync>> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

	match format {
		LogFormat::Pretty => builder.try_init(),
		LogFormat::Json => builder.json().try_init(),
	}
}
