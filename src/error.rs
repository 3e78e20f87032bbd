use crate::domain::delivery::DeliveryStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("subscription ride quota exhausted")]
    QuotaExhausted,
    #[error("no rider available")]
    NoRiderAvailable,
    #[error("cannot {action} a delivery in status {from}")]
    InvalidTransition {
        from: DeliveryStatus,
        action: &'static str,
    },
    #[error("assignment conflict: another caller won the race")]
    AssignmentConflict,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("stale version: record was modified concurrently")]
    VersionConflict,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
