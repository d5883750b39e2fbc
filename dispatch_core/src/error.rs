use thiserror::Error;

/// The closed error taxonomy shared by the Master, Worker and Client.
///
/// Kept as a tagged enum (rather than raw strings) so a handler can match on
/// the failure class instead of comparing against a `{FAILED_*}` token by
/// accident (see spec §9 on not confusing a failure path with a success
/// path).
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("registry is at capacity")]
    Capacity,

    #[error("invalid utilization update: {0}")]
    Validation(String),

    #[error("subprocess error: {0}")]
    Subprocess(String),
}

pub type Result<T> = std::result::Result<T, Error>;
