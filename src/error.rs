use thiserror::Error;

/// Errors that escape the engine to a caller.
///
/// Per the propagation policy: only ingest failures and state-machine
/// misuse are reported here. Internal NFP failures are recovered locally
/// by the placement worker (see [`crate::nfp::NfpOutcome`]) and never
/// surface as a variant of this type.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("invalid polygon: {reason}")]
    InvalidPolygon { reason: String },

    #[error("engine used before initialize() was called")]
    Unconfigured,

    #[error("evaluation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, NestError>;
