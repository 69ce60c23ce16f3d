//! End-to-end run: verify identity, drain the block list, pick one account, lift its block.

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, api::{BlocksClient, User}, http::ApiHttpClient, select};

/// Knobs for a single run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
	/// Resolve and report the chosen account without lifting the block.
	pub dry_run: bool,
}

/// What a completed run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
	/// The signed-in account.
	pub me: User,
	/// Number of identifiers the drain returned.
	pub blocked_count: usize,
	/// The randomly chosen blocked account.
	pub chosen: User,
	/// `false` when the run was a dry run.
	pub unblocked: bool,
}

/// Runs the whole sequence once. Every failure is returned to the caller unchanged.
///
/// A drain that fails part-way is fatal; the partial sequence is only reported in logs.
pub async fn run<C, R>(
	client: &BlocksClient<C>,
	options: RunOptions,
	rng: &mut R,
) -> Result<Outcome>
where
	C: ?Sized + ApiHttpClient,
	R: ?Sized + Rng,
{
	let me = client.verify_credentials().await?;

	#[cfg(feature = "tracing")]
	tracing::info!(name = %me.name, handle = %me.screen_name, id = me.id, "Logged in.");

	let blocked = match client.blocked_ids().await {
		Ok(ids) => ids,
		Err(e) => {
			#[cfg(feature = "tracing")]
			tracing::error!(
				collected = e.partial.len(),
				error = %e.source,
				"Block list drain failed."
			);

			return Err(e.into_source());
		},
	};

	#[cfg(feature = "tracing")]
	tracing::info!(count = blocked.len(), "Fetched block list.");

	let chosen_id = select::choose(&blocked, rng)?;
	let chosen = client.lookup_user(chosen_id).await?;

	#[cfg(feature = "tracing")]
	tracing::info!(
		name = %chosen.name,
		handle = %chosen.screen_name,
		id = chosen.id,
		dry_run = options.dry_run,
		"Now unblocking."
	);

	if !options.dry_run {
		client.destroy_block(chosen_id).await?;

		#[cfg(feature = "tracing")]
		tracing::info!(id = chosen_id, "Block lifted.");
	}

	Ok(Outcome { me, blocked_count: blocked.len(), chosen, unblocked: !options.dry_run })
}
