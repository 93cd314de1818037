//! Input checks for the search and enrollment forms.
//!
//! These run where the user submits, before anything reaches the store or
//! the synthesizer. A failure blocks progression with a message; nothing
//! here is fatal.

use crate::reducer::BookingEnvironment;
use crate::schedule::FlightOffer;
use crate::types::{PassengerSlot, Passengers};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Search form problems
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A field was left blank
    #[error("Please fill in all fields")]
    MissingFields,

    /// Origin and destination match
    #[error("Source and destination cannot be the same")]
    SameAirports,

    /// Date is not `YYYY-MM-DD`
    #[error("Please enter a valid date (YYYY-MM-DD), got {0:?}")]
    InvalidDate(String),

    /// Valid query, but the route is not served
    #[error("No flights available for this route")]
    NoFlights,
}

/// The flight search form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    /// Origin code
    pub origin: String,
    /// Destination code
    pub destination: String,
    /// Travel date as typed
    pub date: String,
}

/// A search that passed the form checks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    /// Origin code
    pub origin: String,
    /// Destination code
    pub destination: String,
    /// Travel date
    pub date: NaiveDate,
}

impl SearchForm {
    /// Fill the form
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date: date.into(),
        }
    }

    /// Exchange origin and destination
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.origin, &mut self.destination);
    }

    /// Check the form
    ///
    /// # Errors
    ///
    /// Blank fields first, then identical airports, then the date format.
    pub fn validate(&self) -> Result<SearchQuery, SearchError> {
        let origin = self.origin.trim();
        let destination = self.destination.trim();
        let date = self.date.trim();

        if origin.is_empty() || destination.is_empty() || date.is_empty() {
            return Err(SearchError::MissingFields);
        }
        if origin.eq_ignore_ascii_case(destination) {
            return Err(SearchError::SameAirports);
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SearchError::InvalidDate(self.date.clone()))?;

        Ok(SearchQuery {
            origin: origin.to_ascii_uppercase(),
            destination: destination.to_ascii_uppercase(),
            date,
        })
    }
}

/// Check the form and synthesize offers
///
/// # Errors
///
/// Form errors from [`SearchForm::validate`], or [`SearchError::NoFlights`]
/// when the route table has no entry for the pair.
pub fn search_flights(form: &SearchForm, env: &BookingEnvironment) -> Result<Vec<FlightOffer>, SearchError> {
    let query = form.validate()?;
    let offers = env.generate_schedules(&query.origin, &query.destination, query.date);
    if offers.is_empty() {
        tracing::info!(origin = %query.origin, destination = %query.destination, "No flights for route");
        return Err(SearchError::NoFlights);
    }
    Ok(offers)
}

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Loose `local@domain.tld` shape check
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

/// One problem with one traveller's enrollment
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentError {
    /// Blank first name
    #[error("Person {}: First name is required", .0.index() + 1)]
    FirstNameRequired(PassengerSlot),

    /// Blank last name
    #[error("Person {}: Last name is required", .0.index() + 1)]
    LastNameRequired(PassengerSlot),

    /// Blank email
    #[error("Person {}: Email is required", .0.index() + 1)]
    EmailRequired(PassengerSlot),

    /// Email does not look like an address
    #[error("Person {}: Invalid email format", .0.index() + 1)]
    InvalidEmail(PassengerSlot),

    /// No face captured
    #[error("Person {}: At least one face capture is required", .0.index() + 1)]
    NoFaceCapture(PassengerSlot),

    /// Capture limit reached
    #[error("Person {}: Maximum number of face captures reached", .0.index() + 1)]
    TooManyCaptures(PassengerSlot),
}

/// Check both travellers
///
/// # Errors
///
/// Every problem for both travellers, in slot then field order.
pub fn check_enrollment(passengers: &Passengers) -> Result<(), Vec<EnrollmentError>> {
    let mut problems = Vec::new();
    for (slot, passenger) in passengers.iter() {
        if passenger.first_name.trim().is_empty() {
            problems.push(EnrollmentError::FirstNameRequired(slot));
        }
        if passenger.last_name.trim().is_empty() {
            problems.push(EnrollmentError::LastNameRequired(slot));
        }
        let email = passenger.email.trim();
        if email.is_empty() {
            problems.push(EnrollmentError::EmailRequired(slot));
        } else if !is_valid_email(email) {
            problems.push(EnrollmentError::InvalidEmail(slot));
        }
        if passenger.images.is_empty() {
            problems.push(EnrollmentError::NoFaceCapture(slot));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Join problems one per line, as shown to the user
#[must_use]
pub fn enrollment_message(problems: &[EnrollmentError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
