use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

use crate::error::{MarkovError, Result};

/// Supplier of the sampling decisions made during a walk.
///
/// Each call returns an index in `[0, bound)`. Implementations may keep
/// state (a replay position, an RNG), so a source drives one walk at a time.
pub trait IndexSource {
	/// Returns the next index strictly below `bound`.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `bound` is zero.
	fn next_index(&mut self, bound: usize) -> Result<usize>;
}

impl<S: IndexSource + ?Sized> IndexSource for &mut S {
	fn next_index(&mut self, bound: usize) -> Result<usize> {
		(**self).next_index(bound)
	}
}

fn check_bound(bound: usize) -> Result<()> {
	if bound == 0 {
		return Err(MarkovError::InvalidArgument("bound must be > 0".to_owned()));
	}
	Ok(())
}

/// Uniformly random indices.
///
/// Defaults to the thread-local RNG; `seeded` gives reproducible runs.
#[derive(Debug, Clone)]
pub struct RandomSource<R = ThreadRng> {
	rng: R,
}

impl RandomSource<ThreadRng> {
	pub fn new() -> Self {
		Self { rng: rand::rng() }
	}
}

impl Default for RandomSource<ThreadRng> {
	fn default() -> Self {
		Self::new()
	}
}

impl RandomSource<StdRng> {
	/// Creates a source whose sequence is fully determined by `seed`.
	pub fn seeded(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}
}

impl<R: Rng> RandomSource<R> {
	pub fn from_rng(rng: R) -> Self {
		Self { rng }
	}
}

impl<R: Rng> IndexSource for RandomSource<R> {
	fn next_index(&mut self, bound: usize) -> Result<usize> {
		check_bound(bound)?;
		Ok(self.rng.random_range(0..bound))
	}
}

/// Deterministic source replaying a fixed list of raw integers.
///
/// The list is reused cyclically: after the last value the position wraps
/// back to the first one, so a short script can drive an arbitrarily long
/// walk. Raw values are normalized against each requested bound:
/// - negative values become `0`
/// - other values are taken modulo `bound`
///
/// ## Invariants
/// - `values` is never empty
/// - `position < values.len()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySource {
	values: Vec<i64>,
	position: usize,
}

impl ReplaySource {
	/// Creates a replay source over `values`.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `values` is empty.
	pub fn new<I: IntoIterator<Item = i64>>(values: I) -> Result<Self> {
		let values: Vec<i64> = values.into_iter().collect();
		if values.is_empty() {
			return Err(MarkovError::InvalidArgument(
				"replay source needs at least one value".to_owned(),
			));
		}
		Ok(Self { values, position: 0 })
	}

	/// Builds a source from indices such as those returned by
	/// `BigramChain::find_walk_choices`.
	pub fn from_indices(indices: &[usize]) -> Result<Self> {
		Self::new(indices.iter().map(|&i| i64::try_from(i).unwrap_or(i64::MAX)))
	}

	/// Position of the value the next call will consume.
	pub fn position(&self) -> usize {
		self.position
	}
}

impl IndexSource for ReplaySource {
	fn next_index(&mut self, bound: usize) -> Result<usize> {
		check_bound(bound)?;

		let raw = self.values[self.position];
		self.position = (self.position + 1) % self.values.len();

		if raw < 0 {
			return Ok(0);
		}
		// raw fits in u64, and the remainder is below bound
		Ok((raw as u64 % bound as u64) as usize)
	}
}
