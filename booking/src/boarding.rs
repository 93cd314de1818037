//! Boarding-pass derivation.
//!
//! Passes are derived from the accumulated state once the gate in
//! [`crate::gate`] is satisfied. Derivation is all-or-nothing: both passes
//! are produced or neither is.

use crate::seats::Seat;
use crate::types::{hhmm, BookingState, PassengerSlot};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use skypass_core::environment::RandomSource;
use thiserror::Error;

/// Minutes between boarding and departure
pub const BOARDING_LEAD_MINUTES: i64 = 30;

/// Services printed on every pass
pub const NO_SERVICES: &str = "NIL";

const PNR_LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Reasons derivation could not assemble both passes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// No departure time to compute boarding from
    #[error("flight has no departure time")]
    MissingDepartureTime,

    /// Traveller at the index has no name
    #[error("missing passenger data for passenger {}", .0 + 1)]
    MissingPassenger(usize),

    /// No seat at the index
    #[error("missing seat data for passenger {}", .0 + 1)]
    MissingSeat(usize),

    /// Traveller at the index was never enrolled with a face capture
    #[error("no face capture for passenger {}", .0 + 1)]
    MissingFaceCapture(usize),
}

/// Passenger section of a pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardingPassenger {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Assigned seat
    pub seat: Seat,
}

/// Flight section of a pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardingFlight {
    /// Flight number
    pub number: String,
    /// Airline display name
    pub airline: String,
    /// Origin code
    pub from: String,
    /// Destination code
    pub to: String,
    /// Travel date, `YYYY-MM-DD`
    pub date: String,
    /// Scheduled departure
    #[serde(with = "hhmm")]
    pub departure_time: NaiveTime,
    /// Scheduled arrival
    #[serde(default, with = "hhmm::option")]
    pub arrival_time: Option<NaiveTime>,
    /// Departure gate
    pub gate: String,
    /// Departure terminal
    pub terminal: String,
    /// Gate-closing checkpoint
    #[serde(with = "hhmm")]
    pub boarding_time: NaiveTime,
    /// Formatted flight time
    pub duration: String,
}

impl BoardingFlight {
    /// Date as printed on the pass, e.g. `01Mar2025`
    ///
    /// `None` if the stored date is not ISO formatted.
    #[must_use]
    pub fn printed_date(&self) -> Option<String> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .ok()
            .map(|date| date.format("%d%b%Y").to_string())
    }
}

/// One traveller's boarding pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardingPass {
    /// Passenger section
    pub passenger: BoardingPassenger,
    /// Flight section
    pub flight: BoardingFlight,
    /// Boarding sequence number, four digits
    pub seq: String,
    /// Booking reference, two letters then four digits
    pub pnr: String,
    /// Ancillary services
    pub services: String,
}

/// Departure minus thirty minutes, wrapping past midnight
#[must_use]
pub fn boarding_time(departure: NaiveTime) -> NaiveTime {
    departure
        .overflowing_sub_signed(ChronoDuration::minutes(BOARDING_LEAD_MINUTES))
        .0
}

/// Four-digit sequence number in `1000..=9999`
pub fn generate_sequence<R: RandomSource + ?Sized>(random: &R) -> String {
    random.between(1000, 10_000).to_string()
}

/// Two uppercase letters followed by four digits
pub fn generate_pnr<R: RandomSource + ?Sized>(random: &R) -> String {
    let mut pnr = String::with_capacity(6);
    for _ in 0..2 {
        let letter = PNR_LETTERS.get(random.below(26) as usize).copied().unwrap_or(b'A');
        pnr.push(char::from(letter));
    }
    for _ in 0..4 {
        pnr.push(char::from_digit(random.below(10), 10).unwrap_or('0'));
    }
    pnr
}

/// Assemble both passes
///
/// Passes are resolved in slot order; the first unresolved slot aborts the
/// whole derivation.
///
/// # Errors
///
/// Returns [`DerivationError`] if the departure time is missing, or if a
/// traveller has no name, no face capture or no seat.
pub fn derive_boarding_passes<R>(state: &BookingState, random: &R) -> Result<[BoardingPass; 2], DerivationError>
where
    R: RandomSource + ?Sized,
{
    let departure = state
        .flight_details
        .departure_time
        .ok_or(DerivationError::MissingDepartureTime)?;

    let first = derive_one(state, PassengerSlot::First, departure, random)?;
    let second = derive_one(state, PassengerSlot::Second, departure, random)?;
    Ok([first, second])
}

fn derive_one<R>(
    state: &BookingState,
    slot: PassengerSlot,
    departure: NaiveTime,
    random: &R,
) -> Result<BoardingPass, DerivationError>
where
    R: RandomSource + ?Sized,
{
    let index = slot.index();
    let passenger = state.passengers.get(slot);
    if !passenger.has_name() {
        return Err(DerivationError::MissingPassenger(index));
    }
    if passenger.images.is_empty() {
        return Err(DerivationError::MissingFaceCapture(index));
    }
    let seat = *state
        .selected_seats
        .get(index)
        .ok_or(DerivationError::MissingSeat(index))?;

    let details = &state.flight_details;
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    Ok(BoardingPass {
        passenger: BoardingPassenger {
            first_name: passenger.first_name.clone(),
            last_name: passenger.last_name.clone(),
            seat,
        },
        flight: BoardingFlight {
            number: text(&details.flight_number),
            airline: text(&details.airline),
            from: details.origin.clone(),
            to: details.destination.clone(),
            date: details.date.clone(),
            departure_time: departure,
            arrival_time: details.arrival_time,
            gate: text(&details.gate),
            terminal: text(&details.terminal),
            boarding_time: boarding_time(departure),
            duration: text(&details.duration),
        },
        seq: generate_sequence(random),
        pnr: generate_pnr(random),
        services: NO_SERVICES.to_string(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QrFlight<'a> {
    number: &'a str,
    airline: &'a str,
    from: &'a str,
    to: &'a str,
    date: &'a str,
    #[serde(with = "hhmm")]
    departure_time: NaiveTime,
    #[serde(with = "hhmm::option")]
    arrival_time: Option<NaiveTime>,
    terminal: &'a str,
    gate: &'a str,
}

#[derive(Serialize)]
struct QrPassenger {
    name: String,
    seat: Seat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QrPayload<'a> {
    flight: QrFlight<'a>,
    passenger: QrPassenger,
    #[serde(with = "hhmm")]
    boarding_time: NaiveTime,
    pnr: &'a str,
    seq: &'a str,
}

/// JSON encoded into the pass's QR code
///
/// # Errors
///
/// Propagates `serde_json` failures.
pub fn qr_payload(pass: &BoardingPass) -> Result<String, serde_json::Error> {
    let flight = &pass.flight;
    let payload = QrPayload {
        flight: QrFlight {
            number: &flight.number,
            airline: &flight.airline,
            from: &flight.from,
            to: &flight.to,
            date: &flight.date,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            terminal: &flight.terminal,
            gate: &flight.gate,
        },
        passenger: QrPassenger {
            name: format!("{} {}", pass.passenger.first_name, pass.passenger.last_name),
            seat: pass.passenger.seat,
        },
        boarding_time: flight.boarding_time,
        pnr: &pass.pnr,
        seq: &pass.seq,
    };
    serde_json::to_string(&payload)
}

/// Passes may be downloaded once both travellers are verified
///
/// Independent of derivation: passes can exist while download is locked.
#[must_use]
pub const fn can_download(state: &BookingState) -> bool {
    state.check_in_status.all_verified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FaceImage, FlightDetails, Passenger, Passengers};
    use skypass_testing::{ScriptedRandom, SeededRandom};

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
    }

    fn ready_state() -> BookingState {
        let mut passengers = Passengers::new(
            Passenger::new("Ravi", "Kumar", "ravi@example.com"),
            Passenger::new("Asha", "Rao", "asha@example.com"),
        );
        for slot in PassengerSlot::ALL {
            passengers.get_mut(slot).images.push(FaceImage::new("data:,"));
        }
        BookingState {
            flight_details: FlightDetails {
                flight_number: Some("6E 102".to_string()),
                airline: Some("IndiGo".to_string()),
                departure_time: Some(time(0, 10)),
                arrival_time: Some(time(1, 50)),
                gate: Some("B7".to_string()),
                terminal: Some("T2".to_string()),
                duration: Some("1hr 40min".to_string()),
                ..FlightDetails::new("DEL", "BOM", "2025-03-01")
            },
            passengers,
            selected_seats: vec!["5B".parse().unwrap_or(Seat::new(5, crate::seats::SeatColumn::B)), "5C".parse().unwrap_or(Seat::new(5, crate::seats::SeatColumn::C))],
            ..BookingState::default()
        }
    }

    #[test]
    fn boarding_time_wraps_past_midnight() {
        assert_eq!(boarding_time(time(0, 10)), time(23, 40));
        assert_eq!(boarding_time(time(14, 45)), time(14, 15));
        assert_eq!(boarding_time(time(9, 30)), time(9, 0));
    }

    #[test]
    fn derives_two_passes() {
        let passes = derive_boarding_passes(&ready_state(), &SeededRandom::new(5));
        let Ok([first, second]) = passes else {
            unreachable!("derivation should succeed: {passes:?}");
        };
        assert_eq!(first.passenger.first_name, "Ravi");
        assert_eq!(first.passenger.seat.to_string(), "5B");
        assert_eq!(second.passenger.seat.to_string(), "5C");
        assert_eq!(first.flight.boarding_time, time(23, 40));
        assert_eq!(first.flight.number, "6E 102");
        assert_eq!(first.services, "NIL");
        assert_eq!(first.flight.printed_date().as_deref(), Some("01Mar2025"));
    }

    #[test]
    fn missing_seat_aborts_everything() {
        let mut state = ready_state();
        state.selected_seats.truncate(1);
        assert_eq!(
            derive_boarding_passes(&state, &SeededRandom::new(1)),
            Err(DerivationError::MissingSeat(1))
        );
        assert_eq!(DerivationError::MissingSeat(1).to_string(), "missing seat data for passenger 2");
    }

    #[test]
    fn missing_departure_or_name_fails() {
        let mut state = ready_state();
        state.passengers.person1.first_name.clear();
        assert_eq!(
            derive_boarding_passes(&state, &SeededRandom::new(1)),
            Err(DerivationError::MissingPassenger(0))
        );

        let mut state = ready_state();
        state.flight_details.departure_time = None;
        assert_eq!(
            derive_boarding_passes(&state, &SeededRandom::new(1)),
            Err(DerivationError::MissingDepartureTime)
        );
    }

    #[test]
    fn uncaptured_traveller_blocks_derivation() {
        let mut state = ready_state();
        state.passengers.person2.images.clear();
        assert_eq!(
            derive_boarding_passes(&state, &SeededRandom::new(1)),
            Err(DerivationError::MissingFaceCapture(1))
        );
        assert_eq!(
            DerivationError::MissingFaceCapture(1).to_string(),
            "no face capture for passenger 2"
        );
    }

    #[test]
    fn pnr_survives_out_of_range_draws() {
        // A source that ignores its bound still yields a well-formed PNR
        struct Overshoot;
        impl RandomSource for Overshoot {
            fn next_f64(&self) -> f64 {
                0.0
            }
            fn below(&self, upper: u32) -> u32 {
                upper
            }
        }
        assert_eq!(generate_pnr(&Overshoot), "AA0000");
    }

    #[test]
    fn sequence_and_pnr_shapes() {
        assert_eq!(generate_sequence(&ScriptedRandom::constant(0.0)), "1000");
        assert_eq!(generate_sequence(&ScriptedRandom::constant(0.9999)), "9999");
        assert_eq!(generate_pnr(&ScriptedRandom::constant(0.0)), "AA0000");
        assert_eq!(generate_pnr(&ScriptedRandom::constant(0.9999)), "ZZ9999");

        let random = SeededRandom::new(77);
        for _ in 0..200 {
            let pnr = generate_pnr(&random);
            assert_eq!(pnr.len(), 6);
            assert!(pnr[..2].chars().all(|c| c.is_ascii_uppercase()));
            assert!(pnr[2..].chars().all(|c| c.is_ascii_digit()));
            let seq: u32 = generate_sequence(&random).parse().unwrap_or(0);
            assert!((1000..=9999).contains(&seq));
        }
    }

    #[test]
    fn qr_payload_carries_flight_and_passenger() {
        let passes = derive_boarding_passes(&ready_state(), &SeededRandom::new(5));
        let Ok([first, _]) = passes else {
            unreachable!("derivation should succeed");
        };
        let json = qr_payload(&first).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["flight"]["number"], "6E 102");
        assert_eq!(value["flight"]["departureTime"], "00:10");
        assert_eq!(value["passenger"]["name"], "Ravi Kumar");
        assert_eq!(value["passenger"]["seat"], "5B");
        assert_eq!(value["boardingTime"], "23:40");
        assert_eq!(value["pnr"], first.pnr.as_str());
    }

    #[test]
    fn download_needs_both_verified() {
        let mut state = ready_state();
        assert!(!can_download(&state));
        state.check_in_status.person1_verified = true;
        assert!(!can_download(&state));
        state.check_in_status.person2_verified = true;
        assert!(can_download(&state));
    }
}
