//! Library entry point for the maci-domainobjs crate.
//
// Exposes the voting domain objects for use by coordinators, clients and benchmarks.

pub mod ballot;
pub mod binarify;
pub mod commands;
pub mod config;
pub mod error;
pub mod keys;
pub mod processing;
pub mod serde_types;
pub mod state_leaf;
pub mod verifying_key;
pub mod vote_counts;

pub use maci_crypto::Fr;
