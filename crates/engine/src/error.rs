//! The module contains the error the engine can throw.
//!
//! The most common ones are:
//!
//! - [`KeyNotFound`] thrown when an item is missing or not visible to the caller.
//! - [`CarUnavailable`] thrown when a rental period collides with another booking.
//! - [`OfferNotApplicable`] thrown when an offer fails its eligibility rules.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`CarUnavailable`]: EngineError::CarUnavailable
//!  [`OfferNotApplicable`]: EngineError::OfferNotApplicable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid rental period: {0}")]
    InvalidDates(String),
    #[error("Car unavailable: {0}")]
    CarUnavailable(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Offer not applicable: {0}")]
    OfferNotApplicable(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidDates(a), Self::InvalidDates(b)) => a == b,
            (Self::CarUnavailable(a), Self::CarUnavailable(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::OfferNotApplicable(a), Self::OfferNotApplicable(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value.to_string())
    }
}
