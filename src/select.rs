//! Uniform selection over a drained identifier sequence.

// crates.io
use rand::{Rng, seq::IndexedRandom};
// self
use crate::_prelude::*;

/// Picks one identifier uniformly at random using the caller's random source.
///
/// An empty slice is rejected with [`Error::NoCandidates`].
pub fn choose<R>(ids: &[i64], rng: &mut R) -> Result<i64>
where
	R: ?Sized + Rng,
{
	ids.choose(rng).copied().ok_or(Error::NoCandidates)
}
