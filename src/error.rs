//! Error types of the simulation core.

use thiserror::Error;

/// Failure of a simulation run.
///
/// Both variants are caller-fixable: the simulator is deterministic,
/// so retrying with the same inputs fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Invalid configuration, detected before any stepping.
    #[error("config error: {0}")]
    Config(String),

    /// Degenerate arithmetic (zero denominator, NaN or Inf).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type SimResult<T> = Result<T, SimError>;
