use thiserror::Error;

/// Failures of the note cipher. Never retried; surfaced to the caller as is.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid key: expected {expected} bytes of key material")]
    InvalidKey { expected: usize },

    #[error("encryption failed")]
    Encrypt,

    #[error("malformed ciphertext: {0}")]
    Encoding(String),

    /// Authentication failed: wrong key or the ciphertext was modified.
    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    Decrypt,

    #[error("decrypted plaintext is not a note: {0}")]
    Plaintext(String),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("mining gave up after {iterations} nonces at difficulty {difficulty}")]
    MiningTimeout { iterations: u64, difficulty: usize },

    #[error("mining difficulty {requested} is below the minimum of {minimum}")]
    DifficultyBelowMinimum { requested: usize, minimum: usize },

    #[error("chain serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("note encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("note not found: {0}")]
    NoteNotFound(String),

    #[error("no block recorded for note {0}")]
    BlockNotFound(String),

    #[error("persisted chain failed validation")]
    InvalidPersistedChain,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
