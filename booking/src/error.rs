//! Aggregate error for callers that drive several steps.

use crate::boarding::DerivationError;
use crate::config::ConfigError;
use crate::forms::{enrollment_message, EnrollmentError, SearchError};
use crate::gate::ValidationFailure;
use crate::seats::SeatSelectionError;
use skypass_runtime::StoreError;
use thiserror::Error;

/// Any failure a booking session can surface
#[derive(Error, Debug)]
pub enum BookingError {
    /// Bad configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Search form rejected
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Enrollment form rejected
    #[error("{}", enrollment_message(.0))]
    Enrollment(Vec<EnrollmentError>),

    /// Seat selection rejected
    #[error(transparent)]
    Seats(#[from] SeatSelectionError),

    /// A step's preconditions are not met
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Boarding passes could not be assembled
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// Store runtime failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// QR payload could not be rendered
    #[error("could not render QR payload: {0}")]
    Render(#[from] serde_json::Error),

    /// The store recorded a user-facing message instead of advancing
    #[error("{0}")]
    Session(String),
}

impl From<Vec<EnrollmentError>> for BookingError {
    fn from(problems: Vec<EnrollmentError>) -> Self {
        Self::Enrollment(problems)
    }
}

/// Result alias for booking operations
pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seats::{SeatMap, SeatSelection};
    use crate::types::PassengerSlot;

    #[test]
    fn messages_pass_through() {
        let error: BookingError = SearchError::SameAirports.into();
        assert_eq!(error.to_string(), "Source and destination cannot be the same");

        let error: BookingError = vec![
            EnrollmentError::EmailRequired(PassengerSlot::First),
            EnrollmentError::NoFaceCapture(PassengerSlot::Second),
        ]
        .into();
        assert_eq!(
            error.to_string(),
            "Person 1: Email is required\nPerson 2: At least one face capture is required"
        );

        let error: BookingError = ConfigError::NoFaceCaptures.into();
        assert!(error.to_string().starts_with("configuration error"));

        let error = BookingError::Session("Please complete all previous steps".to_string());
        assert_eq!(error.to_string(), "Please complete all previous steps");
    }

    #[test]
    fn question_mark_lifts_step_errors() {
        fn finalize_pair() -> Result<()> {
            let _pair = SeatSelection::new(SeatMap::standard()).finalize()?;
            Ok(())
        }
        assert_eq!(
            finalize_pair().map_err(|e| e.to_string()),
            Err("Please select exactly 2 seats to continue".to_string())
        );
    }
}
