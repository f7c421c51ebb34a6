use thiserror::Error;

/// Errors raised by the incremental Merkle tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Unsupported arity {0}, expected 2 or 5")]
    InvalidArity(usize),
    #[error("Invalid tree depth {0}")]
    InvalidDepth(usize),
    #[error("Tree is full ({capacity} leaves)")]
    TreeFull { capacity: usize },
    #[error("Leaf index {index} is out of bounds (next index is {next_index})")]
    IndexOutOfBounds { index: usize, next_index: usize },
    #[error("Merkle path for leaf {index} does not match the current root")]
    PathMismatch { index: usize },
    #[error("Queue has no leaves")]
    EmptyQueue,
    #[error("Subtree roots have not been merged")]
    SubRootsNotMerged,
    #[error("Subtree roots are already merged")]
    SubRootsAlreadyMerged,
    #[error("Depth {depth} cannot hold the queued leaves, need at least {required}")]
    DepthTooSmall { depth: usize, required: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("Point is not on the baby jubjub curve")]
    PointNotOnCurve,
    #[error("Decryption failed: plaintext does not match the authentication value")]
    DecryptionFailed,
    #[error("Poseidon error: {0}")]
    Hash(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
