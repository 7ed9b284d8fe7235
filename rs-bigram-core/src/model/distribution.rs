use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::ops::Bound;

use crate::error::{MarkovError, Result};
use super::index_source::IndexSource;

/// Frequency histogram over ordered values.
///
/// A `WeightedDistribution` counts how many times each value was recorded.
/// Conceptually it is the virtual sequence obtained by repeating each key,
/// in sorted order, as many times as it was recorded:
///
/// `{ "a": 2, "c": 1, "b": 3 }` → `a a b b b c`
///
/// `pick(i)` returns the key at position `i` of that sequence and
/// `index(k)` returns the first position of `k`. Sorting the keys makes both
/// mappings independent of insertion order, which is what lets a recorded
/// list of indices replay the same walk later.
///
/// ## Invariants
/// - Every stored count is strictly positive
/// - `total` is the sum of all stored counts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedDistribution<T: Ord> {
	/// Occurrence count per recorded value, kept in natural order.
	records: BTreeMap<T, usize>,
	total: usize,
}

impl<T: Ord> Default for WeightedDistribution<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Ord> WeightedDistribution<T> {
	/// Creates an empty distribution.
	pub fn new() -> Self {
		Self {
			records: BTreeMap::new(),
			total: 0,
		}
	}

	/// Records one more occurrence of `value`.
	///
	/// - If the value already exists, its count is increased.
	/// - Otherwise, it is inserted with a count of 1.
	pub fn record(&mut self, value: T) {
		*self.records.entry(value).or_insert(0) += 1;
		self.total += 1;
	}

	/// Total number of recorded occurrences.
	pub fn total(&self) -> usize {
		self.total
	}

	pub fn is_empty(&self) -> bool {
		self.total == 0
	}

	/// Recorded values in natural order.
	pub fn keys(&self) -> impl Iterator<Item = &T> {
		self.records.keys()
	}

	/// `(value, count)` pairs in natural order.
	pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> {
		self.records.iter().map(|(value, count)| (value, *count))
	}

	/// Returns how many times `value` was recorded.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `value` was never recorded. An unknown
	/// value is an error rather than a zero count.
	pub fn count<Q>(&self, value: &Q) -> Result<usize>
	where
		T: Borrow<Q>,
		Q: Ord + Debug + ?Sized,
	{
		self.records
			.get(value)
			.copied()
			.ok_or_else(|| not_recorded(value))
	}

	/// Returns the value at position `index` of the flattened sequence.
	///
	/// Keys are scanned in order, accumulating counts, until the running
	/// upper bound exceeds `index`.
	///
	/// # Errors
	/// - `InvalidArgument` if `index >= total()`
	/// - `IllegalState` if the counts do not add up to `total`
	pub fn pick(&self, index: usize) -> Result<&T> {
		if index >= self.total {
			return Err(MarkovError::InvalidArgument(format!(
				"index {} out of range, distribution total is {}",
				index, self.total
			)));
		}

		let mut upper = 0;
		for (value, count) in &self.records {
			upper += count;
			if index < upper {
				return Ok(value);
			}
		}

		Err(MarkovError::IllegalState(format!(
			"counts sum to {} but total is {}",
			upper, self.total
		)))
	}

	/// Picks a value using an index drawn from `source`.
	///
	/// The source is only consulted when there is something to pick.
	///
	/// # Errors
	/// Returns `NoSuchElement` if the distribution is empty.
	pub fn pick_from<S: IndexSource + ?Sized>(&self, source: &mut S) -> Result<&T> {
		if self.total == 0 {
			return Err(MarkovError::NoSuchElement(
				"cannot pick from an empty distribution".to_owned(),
			));
		}
		let index = source.next_index(self.total)?;
		self.pick(index)
	}

	/// Returns the first position of `value` in the flattened sequence,
	/// i.e. the summed counts of every strictly smaller key.
	///
	/// `pick(index(v)) == v` for every recorded `v`.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `value` was never recorded.
	pub fn index<Q>(&self, value: &Q) -> Result<usize>
	where
		T: Borrow<Q>,
		Q: Ord + Debug + ?Sized,
	{
		if !self.records.contains_key(value) {
			return Err(not_recorded(value));
		}

		Ok(self
			.records
			.range::<Q, _>((Bound::Unbounded, Bound::Excluded(value)))
			.map(|(_, count)| count)
			.sum())
	}
}

fn not_recorded<Q: Debug + ?Sized>(value: &Q) -> MarkovError {
	MarkovError::InvalidArgument(format!("{:?} is not in the distribution", value))
}

impl<T: Ord + Display> Display for WeightedDistribution<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{")?;
		for (value, count) in &self.records {
			write!(f, " \"{}\":{} ", value, count)?;
		}
		write!(f, "}}")
	}
}

impl<T: Ord> FromIterator<T> for WeightedDistribution<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		let mut distribution = Self::new();
		for value in iter {
			distribution.record(value);
		}
		distribution
	}
}
