use thiserror::Error;

/// Errors raised by the distribution, the chain and their collaborators.
///
/// Every operation fails fast: input is validated before any state is
/// touched, and nothing is retried internally.
#[derive(Error, Debug)]
pub enum MarkovError {
	/// Absent input, or a key/transition that was never recorded.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Picking from a distribution that holds nothing.
	#[error("No such element: {0}")]
	NoSuchElement(String),

	/// Internal bookkeeping is inconsistent. Indicates a bug, not bad input.
	#[error("Illegal state: {0}")]
	IllegalState(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MarkovError>;
