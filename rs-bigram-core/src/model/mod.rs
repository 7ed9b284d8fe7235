//! Top-level module for the bigram generation system.
//!
//! This module provides:
//! - Weighted, order-stable distributions (`WeightedDistribution`)
//! - The first-order chain and its walk (`BigramChain`, `Walk`)
//! - Sources of sampling decisions (`IndexSource`)
//! - Generation configuration (`GenerationInput`)
//! - A high-level generation interface (`TextGenerator`)

/// Frequency histogram over ordered values.
///
/// Supports rank-based picking and the exact inverse lookup that makes
/// replayed walks reproducible.
pub mod distribution;

/// Sources of bounded indices: uniform random, or cyclic replay.
pub mod index_source;

/// Bigram chain: start tokens, successor distributions, the lazy walk
/// and `find_walk_choices`.
pub mod bigram_chain;

/// Generation parameters (walk length cap, duplicate retries).
pub mod generation_input;

/// High-level interface training one chain and rendering walks to text.
pub mod generator;
