//! Bigram (first-order Markov chain) text generation library.
//!
//! This crate provides:
//! - An order-stable weighted distribution with exact rank selection
//! - A bigram chain trained from token sequences, with a lazy walk generator
//!   and its inverse (token sequence → index sequence)
//! - Random and deterministic-replay index sources
//! - A text generator rendering walks as punctuation-aware strings
//! - Line, CSV and tokenization helpers feeding the trainer

/// Error type shared by every module.
pub mod error;

/// Core chain models and generation logic.
pub mod model;

/// I/O utilities (line iteration, CSV fields, tokenization, folder listing).
pub mod io;

pub use error::{MarkovError, Result};
