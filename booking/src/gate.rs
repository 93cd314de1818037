//! Step validation gates.
//!
//! A step may only run once the state the earlier steps produce is in
//! place. The checks here are pure: they report what is missing and leave
//! messaging and navigation to the reducer.

use crate::seats::SEATS_PER_BOOKING;
use crate::types::{BookingState, PassengerSlot};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The steps of the flow, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    /// Flight search
    Search,
    /// Passenger enrollment
    PassengerDetails,
    /// Seat map
    SeatSelection,
    /// Face verification
    SelfCheckIn,
    /// Boarding pass display
    BoardingPass,
}

impl Step {
    /// Steps in flow order
    pub const ALL: [Self; 5] = [
        Self::Search,
        Self::PassengerDetails,
        Self::SeatSelection,
        Self::SelfCheckIn,
        Self::BoardingPass,
    ];

    /// The step after this one
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Search => Some(Self::PassengerDetails),
            Self::PassengerDetails => Some(Self::SeatSelection),
            Self::SeatSelection => Some(Self::SelfCheckIn),
            Self::SelfCheckIn => Some(Self::BoardingPass),
            Self::BoardingPass => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Search => "search",
            Self::PassengerDetails => "passenger-details",
            Self::SeatSelection => "seat-selection",
            Self::SelfCheckIn => "self-check-in",
            Self::BoardingPass => "boarding-pass",
        };
        f.write_str(name)
    }
}

/// A piece of state a step needs but does not have
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MissingField {
    /// Flight origin
    Origin,
    /// Flight destination
    Destination,
    /// Travel date
    Date,
    /// A traveller's first name
    FirstName(PassengerSlot),
    /// A traveller's last name
    LastName(PassengerSlot),
    /// Seat count differs from two; carries the count found
    Seats(usize),
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "flightDetails.from"),
            Self::Destination => write!(f, "flightDetails.to"),
            Self::Date => write!(f, "flightDetails.date"),
            Self::FirstName(slot) => write!(f, "passengers.{slot}.firstName"),
            Self::LastName(slot) => write!(f, "passengers.{slot}.lastName"),
            Self::Seats(found) => write!(f, "selectedSeats (found {found}, need 2)"),
        }
    }
}

/// State failed a step's preconditions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required booking data: {}", list(.missing))]
pub struct ValidationFailure {
    /// Everything that is missing, in check order
    pub missing: Vec<MissingField>,
}

fn list(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn missing_flight(state: &BookingState, missing: &mut Vec<MissingField>) {
    let flight = &state.flight_details;
    if flight.origin.trim().is_empty() {
        missing.push(MissingField::Origin);
    }
    if flight.destination.trim().is_empty() {
        missing.push(MissingField::Destination);
    }
    if flight.date.trim().is_empty() {
        missing.push(MissingField::Date);
    }
}

fn missing_names(state: &BookingState, missing: &mut Vec<MissingField>) {
    for (slot, passenger) in state.passengers.iter() {
        if passenger.first_name.trim().is_empty() {
            missing.push(MissingField::FirstName(slot));
        }
        if passenger.last_name.trim().is_empty() {
            missing.push(MissingField::LastName(slot));
        }
    }
}

fn missing_seats(state: &BookingState, missing: &mut Vec<MissingField>) {
    if state.selected_seats.len() != SEATS_PER_BOOKING {
        missing.push(MissingField::Seats(state.selected_seats.len()));
    }
}

fn finish(missing: Vec<MissingField>) -> Result<(), ValidationFailure> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { missing })
    }
}

/// Full precondition for boarding-pass derivation
///
/// Flight origin, destination and date are non-empty, both travellers have
/// first and last names, and exactly two seats are selected.
///
/// # Errors
///
/// Returns every missing field, not just the first.
pub fn validate(state: &BookingState) -> Result<(), ValidationFailure> {
    let mut missing = Vec::new();
    missing_flight(state, &mut missing);
    missing_names(state, &mut missing);
    missing_seats(state, &mut missing);
    finish(missing)
}

/// Boolean form of [`validate`]
#[must_use]
pub fn is_valid(state: &BookingState) -> bool {
    validate(state).is_ok()
}

/// Check whether `step` may be entered with the current state
///
/// Each step needs what the steps before it produce.
///
/// # Errors
///
/// Returns the fields the earlier steps should have filled in.
pub fn can_enter(step: Step, state: &BookingState) -> Result<(), ValidationFailure> {
    let mut missing = Vec::new();
    if step >= Step::PassengerDetails {
        missing_flight(state, &mut missing);
    }
    if step >= Step::SeatSelection {
        missing_names(state, &mut missing);
    }
    if step >= Step::SelfCheckIn {
        missing_seats(state, &mut missing);
    }
    finish(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seats::Seat;
    use crate::types::{FlightDetails, Passenger, Passengers};

    fn seat(label: &str) -> Seat {
        label.parse().unwrap_or(Seat::new(1, crate::seats::SeatColumn::B))
    }

    fn complete_state() -> BookingState {
        BookingState {
            flight_details: FlightDetails::new("DEL", "BOM", "2025-03-01"),
            passengers: Passengers::new(
                Passenger::new("Ravi", "Kumar", "ravi@example.com"),
                Passenger::new("Asha", "Rao", "asha@example.com"),
            ),
            selected_seats: vec![seat("1B"), seat("1C")],
            ..BookingState::default()
        }
    }

    #[test]
    fn one_seat_is_not_enough() {
        let mut state = complete_state();
        state.selected_seats = vec![seat("1A")];
        assert!(!is_valid(&state));
        assert_eq!(
            validate(&state),
            Err(ValidationFailure {
                missing: vec![MissingField::Seats(1)]
            })
        );
    }

    #[test]
    fn two_seats_with_complete_data_pass() {
        let mut state = complete_state();
        state.selected_seats = vec![seat("1A"), seat("1B")];
        assert!(is_valid(&state));
    }

    #[test]
    fn all_missing_fields_are_reported() {
        let failure = validate(&BookingState::default()).err();
        let missing = failure.map(|f| f.missing).unwrap_or_default();
        assert_eq!(missing.len(), 8);
        assert_eq!(missing[0], MissingField::Origin);
        assert_eq!(missing[7], MissingField::Seats(0));
    }

    #[test]
    fn failure_message_names_fields() {
        let mut state = complete_state();
        state.passengers.person2.last_name.clear();
        let message = validate(&state).err().map(|f| f.to_string()).unwrap_or_default();
        assert_eq!(message, "missing required booking data: passengers.person2.lastName");
    }

    #[test]
    fn steps_unlock_in_order() {
        let mut state = BookingState::default();
        assert!(can_enter(Step::Search, &state).is_ok());
        assert!(can_enter(Step::PassengerDetails, &state).is_err());

        state.flight_details = FlightDetails::new("DEL", "BOM", "2025-03-01");
        assert!(can_enter(Step::PassengerDetails, &state).is_ok());
        assert!(can_enter(Step::SeatSelection, &state).is_err());

        state.passengers = complete_state().passengers;
        assert!(can_enter(Step::SeatSelection, &state).is_ok());
        assert!(can_enter(Step::SelfCheckIn, &state).is_err());

        state.selected_seats = vec![seat("2C"), seat("2D")];
        for step in Step::ALL {
            assert!(can_enter(step, &state).is_ok(), "{step} should be open");
        }
    }

    #[test]
    fn step_order() {
        assert_eq!(Step::Search.next(), Some(Step::PassengerDetails));
        assert_eq!(Step::BoardingPass.next(), None);
    }
}
