//! Error types for the round manager

use thiserror::Error;
use types::RoundNumber;

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("Ledger error: {message}")]
    Ledger { message: String },

    #[error("State store error: {message}")]
    StateStore { message: String },

    #[error("Eligibility pool error: {message}")]
    Pool { message: String },

    #[error("Advisory lock error: {message}")]
    Lock { message: String },

    #[error("Snapshot submission for round {round} failed: {message}")]
    Submission { round: RoundNumber, message: String },

    #[error("Round {round} not found on ledger")]
    RoundNotFound { round: RoundNumber },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoundError {
    pub fn ledger(message: impl ToString) -> Self {
        RoundError::Ledger {
            message: message.to_string(),
        }
    }

    pub fn state_store(message: impl ToString) -> Self {
        RoundError::StateStore {
            message: message.to_string(),
        }
    }

    pub fn pool(message: impl ToString) -> Self {
        RoundError::Pool {
            message: message.to_string(),
        }
    }

    pub fn lock(message: impl ToString) -> Self {
        RoundError::Lock {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RoundError>;
