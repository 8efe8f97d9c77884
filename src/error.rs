//! Fhirsight error types

use std::ops::RangeInclusive;
use thiserror::Error;

/// Fhirsight error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM output could not be converted into the expected content schema
    #[error("LLM output not parsable as {0}")]
    NotParsable(String),

    /// LLM invocation error, propagated unchanged from the service
    #[error("LLM error: {0}")]
    Llm(String),

    /// Submitted answer's variant does not match the question kind
    #[error("Answer type does not match question kind")]
    TypeMismatch,

    /// Submitted numeric answer outside the valid bound
    #[error("Answer out of range, expected {}..={}", .0.start(), .0.end())]
    InvalidRange(RangeInclusive<i64>),

    /// Index into a task's question list out of bounds
    #[error("Question index {0} out of bounds")]
    InvalidQuestionIndex(usize),

    /// Referenced task id not present in the study
    #[error("No task with id '{0}'")]
    TaskNotFound(String),

    /// Ciphertext shorter than the embedded ephemeral public key
    #[error("Encrypted data too short: {0} bytes")]
    DataTooShort(usize),

    /// Key material could not be parsed from PEM/raw input
    #[error("Key parse error: {0}")]
    KeyParse(String),

    /// Cryptographic error
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for fhirsight operations
pub type Result<T> = std::result::Result<T, Error>;
