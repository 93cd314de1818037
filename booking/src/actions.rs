//! Actions accepted by the booking store.
//!
//! The five `Set*` actions are plain replacements (merge for check-in
//! status) and carry the wire tags the views already dispatch. The rest
//! drive the simulated capture/verification delays and the derived
//! boarding passes.

use crate::boarding::BoardingPass;
use crate::gate::Step;
use crate::seats::Seat;
use crate::types::{CheckInStatusUpdate, FaceImage, FlightDetails, PassengerSlot, Passengers};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything that can happen to a booking session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BookingAction {
    // ========== Replacements ==========
    /// Replace the flight details
    SetFlightDetails(FlightDetails),

    /// Replace both travellers at once
    SetPassengerDetails(Passengers),

    /// Replace the selected seats; no validation
    SetSelectedSeats(Vec<Seat>),

    /// Replace the derived passes
    #[serde(alias = "SET_BOARDING_PASS")]
    SetBoardingPasses(Option<[BoardingPass; 2]>),

    /// Merge into the check-in status
    #[serde(rename = "SET_CHECK_IN_STATUS")]
    SetVerificationStatus(CheckInStatusUpdate),

    // ========== Checked submissions ==========
    /// Enrollment form submitted; stored only if every check passes
    SubmitPassengerDetails(Passengers),

    /// Seat map confirmed; stored only if the pair is valid
    SubmitSeats(Vec<Seat>),

    // ========== Face capture ==========
    /// Start a simulated capture
    CaptureFace {
        /// Traveller being captured
        slot: PassengerSlot,
        /// Captured frame
        data_url: String,
    },

    /// Capture finished
    FaceCaptured {
        /// Traveller captured
        slot: PassengerSlot,
        /// The stored image
        image: FaceImage,
    },

    /// Delete a capture
    RemoveFace {
        /// Traveller owning the capture
        slot: PassengerSlot,
        /// Capture to delete
        id: Uuid,
    },

    // ========== Check-in ==========
    /// Start the simulated verification
    VerifyPassenger {
        /// Traveller to verify
        slot: PassengerSlot,
    },

    /// Verification finished
    VerificationCompleted {
        /// Traveller verified
        slot: PassengerSlot,
    },

    // ========== Boarding pass ==========
    /// Run the gate and derive both passes
    GenerateBoardingPasses,

    /// Send the session back to a step
    Redirect {
        /// Destination step
        to: Step,
    },

    /// Any tag this build does not know; ignored
    #[serde(other)]
    Unrecognized,
}

impl BookingAction {
    /// Parse a dispatched action, mapping unknown tags to [`Self::Unrecognized`]
    ///
    /// Unknown tags may come with a payload of any shape; it is discarded.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or a known tag with a malformed payload.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut value: serde_json::Value = serde_json::from_str(raw)?;
        match serde_json::from_value(value.clone()) {
            Ok(action) => Ok(action),
            Err(err) => {
                if let Some(map) = value.as_object_mut() {
                    map.remove("payload");
                }
                match serde_json::from_value(value) {
                    Ok(Self::Unrecognized) => Ok(Self::Unrecognized),
                    _ => Err(err),
                }
            }
        }
    }

    /// Wire tag, for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetFlightDetails(_) => "SET_FLIGHT_DETAILS",
            Self::SetPassengerDetails(_) => "SET_PASSENGER_DETAILS",
            Self::SetSelectedSeats(_) => "SET_SELECTED_SEATS",
            Self::SetBoardingPasses(_) => "SET_BOARDING_PASSES",
            Self::SetVerificationStatus(_) => "SET_CHECK_IN_STATUS",
            Self::SubmitPassengerDetails(_) => "SUBMIT_PASSENGER_DETAILS",
            Self::SubmitSeats(_) => "SUBMIT_SEATS",
            Self::CaptureFace { .. } => "CAPTURE_FACE",
            Self::FaceCaptured { .. } => "FACE_CAPTURED",
            Self::RemoveFace { .. } => "REMOVE_FACE",
            Self::VerifyPassenger { .. } => "VERIFY_PASSENGER",
            Self::VerificationCompleted { .. } => "VERIFICATION_COMPLETED",
            Self::GenerateBoardingPasses => "GENERATE_BOARDING_PASSES",
            Self::Redirect { .. } => "REDIRECT",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}
