//! Domain types for the booking session.
//!
//! One `BookingState` lives for the whole session. Every step reads it and
//! changes it only by dispatching a [`BookingAction`](crate::BookingAction).

use crate::boarding::BoardingPass;
use crate::gate::Step;
use crate::schedule::FlightOffer;
use crate::seats::Seat;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// `HH:MM` (de)serialization for clock times
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    /// Serialize as zero-padded `HH:MM`
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    /// Parse `HH:MM`
    ///
    /// # Errors
    ///
    /// Fails on anything other than a valid 24-hour `HH:MM`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module for optional times; empty strings read as `None`
    pub mod option {
        use super::FORMAT;
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize `Some` as `HH:MM`, `None` as null
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.collect_str(&time.format(FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        /// Parse an optional `HH:MM`
        ///
        /// # Errors
        ///
        /// Fails on a non-empty string that is not a valid `HH:MM`.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => NaiveTime::parse_from_str(raw.trim(), FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

/// The flight the travellers picked
///
/// Only the route and date are required; the rest is copied from the chosen
/// offer and may be missing when the details were entered by hand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    /// Origin IATA code
    #[serde(rename = "from")]
    pub origin: String,
    /// Destination IATA code
    #[serde(rename = "to")]
    pub destination: String,
    /// Travel date, `YYYY-MM-DD`
    pub date: String,
    /// Flight number
    #[serde(default)]
    pub flight_number: Option<String>,
    /// Airline display name
    #[serde(default)]
    pub airline: Option<String>,
    /// Scheduled departure
    #[serde(default, with = "hhmm::option")]
    pub departure_time: Option<NaiveTime>,
    /// Scheduled arrival
    #[serde(default, with = "hhmm::option")]
    pub arrival_time: Option<NaiveTime>,
    /// Formatted flight time
    #[serde(default)]
    pub duration: Option<String>,
    /// Departure terminal
    #[serde(default)]
    pub terminal: Option<String>,
    /// Departure gate
    #[serde(default)]
    pub gate: Option<String>,
    /// Fare paid
    #[serde(default)]
    pub price: Option<u32>,
}

impl FlightDetails {
    /// Details for a route and date with nothing else chosen yet
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date: date.into(),
            ..Self::default()
        }
    }

    /// Copy everything the later steps need from a chosen offer
    #[must_use]
    pub fn from_offer(offer: &FlightOffer) -> Self {
        Self {
            origin: offer.origin.clone(),
            destination: offer.destination.clone(),
            date: offer.date.to_string(),
            flight_number: Some(offer.flight_number.clone()),
            airline: Some(offer.airline.clone()),
            departure_time: Some(offer.departure_time),
            arrival_time: Some(offer.arrival_time),
            duration: Some(offer.duration.clone()),
            terminal: Some(offer.terminal.clone()),
            gate: Some(offer.gate.clone()),
            price: Some(offer.price),
        }
    }

    /// Origin, destination and date are all present
    #[must_use]
    pub fn has_route(&self) -> bool {
        !self.origin.trim().is_empty()
            && !self.destination.trim().is_empty()
            && !self.date.trim().is_empty()
    }
}

/// A captured face image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceImage {
    /// Capture identifier
    pub id: Uuid,
    /// Opaque image reference (data URI or handle)
    pub data_url: String,
}

impl FaceImage {
    /// Wrap a capture under a fresh id
    #[must_use]
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_url: data_url.into(),
        }
    }
}

/// One traveller
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Captured face images, oldest first
    #[serde(default)]
    pub images: Vec<FaceImage>,
}

impl Passenger {
    /// A passenger with contact details and no captures yet
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            images: Vec::new(),
        }
    }

    /// Both name fields are non-blank
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }

    /// `First Last`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Which of the two travellers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassengerSlot {
    /// The first traveller
    #[serde(rename = "person1")]
    First,
    /// The second traveller
    #[serde(rename = "person2")]
    Second,
}

impl PassengerSlot {
    /// Both slots in order
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// Zero-based position
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for PassengerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "person1"),
            Self::Second => write!(f, "person2"),
        }
    }
}

/// The two travellers of the itinerary
///
/// The itinerary is always for exactly two people; the type has no way to
/// hold more or fewer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passengers {
    /// First traveller
    pub person1: Passenger,
    /// Second traveller
    pub person2: Passenger,
}

impl Passengers {
    /// Pair two travellers
    #[must_use]
    pub const fn new(person1: Passenger, person2: Passenger) -> Self {
        Self { person1, person2 }
    }

    /// Traveller in a slot
    #[must_use]
    pub const fn get(&self, slot: PassengerSlot) -> &Passenger {
        match slot {
            PassengerSlot::First => &self.person1,
            PassengerSlot::Second => &self.person2,
        }
    }

    /// Mutable traveller in a slot
    pub fn get_mut(&mut self, slot: PassengerSlot) -> &mut Passenger {
        match slot {
            PassengerSlot::First => &mut self.person1,
            PassengerSlot::Second => &mut self.person2,
        }
    }

    /// Slots paired with their travellers
    pub fn iter(&self) -> impl Iterator<Item = (PassengerSlot, &Passenger)> {
        PassengerSlot::ALL.into_iter().map(|slot| (slot, self.get(slot)))
    }
}

/// Per-passenger verification flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStatus {
    /// First traveller passed verification
    pub person1_verified: bool,
    /// Second traveller passed verification
    pub person2_verified: bool,
}

impl CheckInStatus {
    /// Whether a slot is verified
    #[must_use]
    pub const fn is_verified(&self, slot: PassengerSlot) -> bool {
        match slot {
            PassengerSlot::First => self.person1_verified,
            PassengerSlot::Second => self.person2_verified,
        }
    }

    /// Both travellers verified; unlocks the boarding pass download
    #[must_use]
    pub const fn all_verified(&self) -> bool {
        self.person1_verified && self.person2_verified
    }

    /// Apply the fields present in `update`, keep the rest
    pub const fn merge(&mut self, update: CheckInStatusUpdate) {
        if let Some(verified) = update.person1_verified {
            self.person1_verified = verified;
        }
        if let Some(verified) = update.person2_verified {
            self.person2_verified = verified;
        }
    }
}

/// A partial [`CheckInStatus`]; absent fields are left untouched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInStatusUpdate {
    /// New value for the first traveller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person1_verified: Option<bool>,
    /// New value for the second traveller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person2_verified: Option<bool>,
}

impl CheckInStatusUpdate {
    /// Mark one slot verified
    #[must_use]
    pub const fn verified(slot: PassengerSlot) -> Self {
        match slot {
            PassengerSlot::First => Self {
                person1_verified: Some(true),
                person2_verified: None,
            },
            PassengerSlot::Second => Self {
                person1_verified: None,
                person2_verified: Some(true),
            },
        }
    }
}

/// Busy flags for simulated operations, one per slot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlight {
    /// A face capture is in progress
    pub capturing: [bool; 2],
    /// A verification is in progress
    pub verifying: [bool; 2],
}

impl InFlight {
    /// Whether a capture is running for the slot
    #[must_use]
    pub const fn is_capturing(&self, slot: PassengerSlot) -> bool {
        self.capturing[slot.index()]
    }

    /// Whether a verification is running for the slot
    #[must_use]
    pub const fn is_verifying(&self, slot: PassengerSlot) -> bool {
        self.verifying[slot.index()]
    }
}

/// State of one booking session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingState {
    /// The chosen flight
    pub flight_details: FlightDetails,
    /// The two travellers
    pub passengers: Passengers,
    /// Seats picked on the seat map; not validated by the store
    pub selected_seats: Vec<Seat>,
    /// Derived boarding passes, both or none
    #[serde(default)]
    pub boarding_passes: Option<[BoardingPass; 2]>,
    /// Verification flags
    pub check_in_status: CheckInStatus,
    /// Simulated operations in progress
    #[serde(default)]
    pub in_flight: InFlight,
    /// Last user-facing error message
    #[serde(default)]
    pub last_error: Option<String>,
    /// Step the session was sent back to, if any
    #[serde(default)]
    pub redirect: Option<Step>,
}

impl BookingState {
    /// An empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
