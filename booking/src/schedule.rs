//! Flight schedule synthesis.
//!
//! There is no inventory behind the search form. Every search synthesizes a
//! fresh list of offers for the requested route and date from the static
//! catalog, a wall-clock reading and a random source. Two calls with the
//! same inputs are expected to differ unless the random source is seeded;
//! callers must not rely on reproducible output.

use crate::catalog::{find_route, Airline, Route, AIRLINES};
use crate::types::hhmm;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use skypass_core::environment::{choose, RandomSource};
use std::collections::BTreeSet;
use std::fmt;

/// Upper bound on departure slots per search
pub const MAX_SLOTS: usize = 8;

/// First departure for any date other than today
const FIRST_DEPARTURE_HOUR: u32 = 6;

/// Probability that a slot is non-stop
const NON_STOP_PROBABILITY: f64 = 0.7;

/// Extra minutes a stop adds on top of the route minimum
const STOP_OVERHEAD_MINUTES: u32 = 90;

/// Fare premium for flights with stops
const STOP_PREMIUM: u32 = 1000;

/// Promotional tags attached to special offers
pub const SPECIAL_OFFER_TAGS: [&str; 5] = [
    "Limited Time Deal!",
    "Flash Sale!",
    "Early Bird Offer!",
    "Last Minute Deal!",
    "Special Discount!",
];

const TERMINALS: [&str; 3] = ["T1", "T2", "T3"];
const GATE_BLOCKS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Stop classification of an offer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stops {
    /// Direct flight
    NonStop,
    /// Flight with the given number of stops
    Stops(u8),
}

impl Stops {
    /// Whether the offer is direct
    #[must_use]
    pub const fn is_non_stop(self) -> bool {
        matches!(self, Self::NonStop)
    }
}

impl fmt::Display for Stops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonStop => write!(f, "Non Stop"),
            Self::Stops(n) => write!(f, "{n} Stop"),
        }
    }
}

/// Discount annotation on an offer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialOffer {
    /// Promotional tag
    pub tag: String,
    /// Price before the discount
    pub original_price: u32,
}

/// A synthesized flight choice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    /// `{airline code}-{date}-{slot index}`
    pub id: String,
    /// Airline display name
    pub airline: String,
    /// Airline designator
    pub airline_code: String,
    /// Airline logo asset
    pub logo: String,
    /// Flight number, e.g. `6E 103`
    pub flight_number: String,
    /// Origin IATA code
    pub origin: String,
    /// Destination IATA code
    pub destination: String,
    /// Travel date
    pub date: NaiveDate,
    /// Scheduled departure
    #[serde(with = "hhmm")]
    pub departure_time: NaiveTime,
    /// Scheduled arrival (wraps past midnight)
    #[serde(with = "hhmm")]
    pub arrival_time: NaiveTime,
    /// Flight time in minutes
    pub duration_minutes: u32,
    /// Flight time formatted as `{h}hr {m}min`
    pub duration: String,
    /// Stop classification
    pub stops: Stops,
    /// Fare
    pub price: u32,
    /// Seats left
    pub seats_available: u32,
    /// Departure terminal
    pub terminal: String,
    /// Departure gate
    pub gate: String,
    /// Discount annotation, present on 2-3 offers per search
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub special_offer: Option<SpecialOffer>,
}

/// One departure slot shared by every airline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TimeSlot {
    departure: NaiveTime,
    arrival: NaiveTime,
    duration_minutes: u32,
    stops: Stops,
}

/// Format minutes as `{h}hr {m}min`
#[must_use]
pub fn format_duration(minutes: u32) -> String {
    format!("{}hr {}min", minutes / 60, minutes % 60)
}

/// Synthesize offers for a route and date
///
/// `now` is the local wall-clock reading; it decides whether `date` is
/// today and, if so, where the first slot starts. Returns an empty list
/// when the pair is not in the route table.
///
/// The result holds `airline count × slot count` offers sorted by
/// departure time, then price.
pub fn generate_schedules<R>(
    origin: &str,
    destination: &str,
    date: NaiveDate,
    now: NaiveDateTime,
    random: &R,
) -> Vec<FlightOffer>
where
    R: RandomSource + ?Sized,
{
    let Some(route) = find_route(origin, destination) else {
        tracing::debug!(origin, destination, "No route, returning empty schedule");
        return Vec::new();
    };

    let slots = time_slots(route, date, now, random);

    let mut offers: Vec<FlightOffer> = AIRLINES
        .iter()
        .flat_map(|airline| {
            slots
                .iter()
                .enumerate()
                .map(move |(index, slot)| (airline, index, slot))
        })
        .map(|(airline, index, slot)| build_offer(route, airline, date, index, slot, random))
        .collect();

    apply_special_offers(&mut offers, random);

    offers.sort_by(|a, b| {
        a.departure_time
            .cmp(&b.departure_time)
            .then(a.price.cmp(&b.price))
    });

    tracing::debug!(
        origin,
        destination,
        %date,
        slots = slots.len(),
        offers = offers.len(),
        "Synthesized schedule"
    );

    offers
}

/// Produce up to [`MAX_SLOTS`] departure slots for the day
fn time_slots<R>(route: &Route, date: NaiveDate, now: NaiveDateTime, random: &R) -> Vec<TimeSlot>
where
    R: RandomSource + ?Sized,
{
    let (mut hour, mut minute) = if date == now.date() {
        (now.hour(), now.minute().div_ceil(15) * 15)
    } else {
        (FIRST_DEPARTURE_HOUR, 0)
    };
    hour += minute / 60;
    minute %= 60;
    if hour >= 24 {
        // Rounding ran past midnight; keep the last quarter hour of the day
        hour = 23;
        minute = 45;
    }

    let mut slots = Vec::with_capacity(MAX_SLOTS);
    for _ in 0..MAX_SLOTS {
        let Some(departure) = NaiveTime::from_hms_opt(hour, minute, 0) else {
            break;
        };
        slots.push(time_slot(route, departure, random));

        minute += random.below(60);
        hour += 1 + random.below(2);
        hour += minute / 60;
        minute %= 60;

        if hour >= 24 {
            break;
        }
    }
    slots
}

fn time_slot<R>(route: &Route, departure: NaiveTime, random: &R) -> TimeSlot
where
    R: RandomSource + ?Sized,
{
    let non_stop = random.chance(NON_STOP_PROBABILITY);
    let duration_minutes = if non_stop {
        route.min_duration + random.below(30)
    } else {
        let min_with_stops = route.min_duration + STOP_OVERHEAD_MINUTES;
        min_with_stops + random.below(route.max_duration.saturating_sub(min_with_stops))
    };
    let stops = if non_stop {
        Stops::NonStop
    } else {
        // At most two stops; 1 + below(2) is in 1..=2
        #[allow(clippy::cast_possible_truncation)]
        Stops::Stops((1 + random.below(2)) as u8)
    };

    let (arrival, _) =
        departure.overflowing_add_signed(ChronoDuration::minutes(i64::from(duration_minutes)));

    TimeSlot {
        departure,
        arrival,
        duration_minutes,
        stops,
    }
}

fn build_offer<R>(
    route: &Route,
    airline: &Airline,
    date: NaiveDate,
    index: usize,
    slot: &TimeSlot,
    random: &R,
) -> FlightOffer
where
    R: RandomSource + ?Sized,
{
    // index < MAX_SLOTS
    #[allow(clippy::cast_possible_truncation)]
    let index_u32 = index as u32;
    let premium = if slot.stops.is_non_stop() { 0 } else { STOP_PREMIUM };
    let raw_price = route.base_price + random.below(2000) + index_u32 * 100 + premium;

    let terminal = choose(random, &TERMINALS).copied().unwrap_or("T1");
    let block = choose(random, &GATE_BLOCKS).copied().unwrap_or('A');
    let gate = format!("{block}{}", 1 + random.below(20));

    FlightOffer {
        id: format!("{}-{date}-{index}", airline.code),
        airline: airline.name.to_string(),
        airline_code: airline.code.to_string(),
        logo: airline.logo.to_string(),
        flight_number: format!("{} {}", airline.code, 100 + index_u32),
        origin: route.origin.to_string(),
        destination: route.destination.to_string(),
        date,
        departure_time: slot.departure,
        arrival_time: slot.arrival,
        duration_minutes: slot.duration_minutes,
        duration: format_duration(slot.duration_minutes),
        stops: slot.stops,
        price: raw_price / 100 * 100,
        seats_available: 1 + random.below(30),
        terminal: terminal.to_string(),
        gate,
        special_offer: None,
    }
}

/// Discount 2-3 distinct offers to a fare in `[4000, 5000)`
fn apply_special_offers<R>(offers: &mut [FlightOffer], random: &R)
where
    R: RandomSource + ?Sized,
{
    let Ok(len) = u32::try_from(offers.len()) else {
        return;
    };
    let wanted = (2 + random.below(2)).min(len);

    // Partial shuffle: the first `wanted` entries end up distinct
    let mut indices: Vec<usize> = (0..offers.len()).collect();
    for i in 0..wanted {
        let j = i + random.below(len - i);
        indices.swap(i as usize, j as usize);
    }
    let picked: BTreeSet<usize> = indices.into_iter().take(wanted as usize).collect();

    for index in picked {
        let tag = choose(random, &SPECIAL_OFFER_TAGS)
            .copied()
            .unwrap_or(SPECIAL_OFFER_TAGS[0]);
        if let Some(offer) = offers.get_mut(index) {
            let original_price = offer.price;
            offer.price = random.between(4000, 5000);
            offer.special_offer = Some(SpecialOffer {
                tag: tag.to_string(),
                original_price,
            });
        }
    }
}
