use serde::Deserialize;

use crate::error::{MarkovError, Result};

/// Largest accepted value for `GenerationInput::max_tokens`.
pub const MAX_TOKENS_LIMIT: usize = 10_000;

/// Input parameters for generating text from a trained chain.
///
/// # Responsibilities
/// - Bound the length of a walk (`max_tokens`), since a chain with cycles
///   can walk forever
/// - Control how many times generation is retried when the output merely
///   repeats a training sentence (`nb_try`)
///
/// Can be read from a TOML table; missing fields take their default value
/// and unknown fields are rejected.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationInput {
	/// Maximum number of tokens in one generated text (0 = unbounded).
	max_tokens: usize,

	/// Number of extra attempts when the generated text already exists
	/// in the training data.
	pub nb_try: usize,
}

impl Default for GenerationInput {
	fn default() -> Self {
		Self {
			max_tokens: 0,
			nb_try: 0,
		}
	}
}

impl GenerationInput {
	pub fn new(max_tokens: usize, nb_try: usize) -> Result<Self> {
		let mut input = Self { nb_try, ..Self::default() };
		input.set_max_tokens(max_tokens)?;
		Ok(input)
	}

	/// Returns the walk length cap (0 = unbounded).
	pub fn max_tokens(&self) -> usize {
		self.max_tokens
	}

	/// Sets the walk length cap.
	///
	/// # Errors
	/// Returns `InvalidArgument` if the value exceeds `MAX_TOKENS_LIMIT`.
	pub fn set_max_tokens(&mut self, max_tokens: usize) -> Result<()> {
		check_max_tokens(max_tokens)?;
		self.max_tokens = max_tokens;
		Ok(())
	}

	/// Checks values that bypassed the setters (e.g. deserialized ones).
	pub fn validate(&self) -> Result<()> {
		check_max_tokens(self.max_tokens)
	}
}

fn check_max_tokens(max_tokens: usize) -> Result<()> {
	if max_tokens > MAX_TOKENS_LIMIT {
		return Err(MarkovError::InvalidArgument(format!(
			"max_tokens must be at most {}, got {}",
			MAX_TOKENS_LIMIT, max_tokens
		)));
	}
	Ok(())
}
