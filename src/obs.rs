//! Optional observability helpers for API operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `block_roulette.api` with the `operation`
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `block_roulette_api_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// API operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiOperation {
	/// Identity verification for the signed-in account.
	VerifyCredentials,
	/// Draining the paginated block list.
	ListBlocks,
	/// Resolving display metadata for one account.
	LookupUser,
	/// Lifting a single block.
	DestroyBlock,
}
impl ApiOperation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiOperation::VerifyCredentials => "verify_credentials",
			ApiOperation::ListBlocks => "list_blocks",
			ApiOperation::LookupUser => "lookup_user",
			ApiOperation::DestroyBlock => "destroy_block",
		}
	}
}
impl Display for ApiOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an API helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto [`OperationOutcome::Success`] or [`OperationOutcome::Failure`].
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure }
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outcome_follows_result() {
		let ok: Result<(), ()> = Ok(());
		let err: Result<(), ()> = Err(());

		assert_eq!(OperationOutcome::of(&ok), OperationOutcome::Success);
		assert_eq!(OperationOutcome::of(&err), OperationOutcome::Failure);
		assert_eq!(ApiOperation::ListBlocks.to_string(), "list_blocks");
	}
}
