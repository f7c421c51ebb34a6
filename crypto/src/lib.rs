//! Library entry point for the maci-crypto crate.
//
// Field helpers, Poseidon hashing, baby jubjub keys and signatures,
// Poseidon encryption, the incremental Merkle tree and the accumulator
// queue.

pub mod acc_queue;
pub mod babyjub;
pub mod eddsa;
pub mod encryption;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod tree;
pub mod utils;

/// Element of the BN254 scalar field, the native field of the circuits.
pub type Fr = ark_bn254::Fr;

pub use error::{CryptoError, TreeError};
