//! # seedsieve
//!
//! A seed-and-extend nucleotide read filter: burst-trie half-window seed
//! search, bit-parallel ≤1-edit matching, LIS chaining, and banded
//! Smith-Waterman extension, driven through a bounded reader/processor/
//! writer thread pool with checkpointed cross-part resume.
//!
//! See `SPEC_FULL.md` at the repository root for the full module map.
pub mod align;
pub mod chain;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod evalue;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod queue;
pub mod read;
pub mod record;
pub mod seed;
pub mod stats;
pub mod store;
