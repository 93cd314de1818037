//! Reducer for the booking session.
//!
//! Replacement actions are applied as-is. Checked submissions run the form
//! checks first and record a user-facing message in `last_error` instead of
//! failing. Capture and verification are simulated with a delayed
//! completion action and a per-passenger busy flag.

use crate::actions::BookingAction;
use crate::boarding::derive_boarding_passes;
use crate::config::BookingConfig;
use crate::forms::{check_enrollment, enrollment_message, EnrollmentError};
use crate::gate::{validate, Step};
use crate::schedule::{self, FlightOffer};
use crate::seats::SeatMap;
use crate::types::{BookingState, CheckInStatusUpdate, FaceImage, PassengerSlot};
use chrono::{NaiveDate, NaiveDateTime, Offset, Utc};
use skypass_core::{
    delay,
    effect::Effect,
    environment::{Clock, RandomSource, SystemClock, ThreadRandom},
    reducer::Reducer,
    smallvec, SmallVec,
};
use std::sync::Arc;

/// Shown when boarding passes are requested before the earlier steps are done
pub const INCOMPLETE_STEPS_MESSAGE: &str = "Please complete all previous steps";

/// Shown when derivation fails
pub const DERIVATION_FAILED_MESSAGE: &str = "Error generating boarding passes";

/// Environment dependencies for the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Wall clock
    pub clock: Arc<dyn Clock>,
    /// Randomness for synthesized data
    pub random: Arc<dyn RandomSource>,
    /// Delays and limits
    pub config: BookingConfig,
}

impl BookingEnvironment {
    /// Creates a new `BookingEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>, config: BookingConfig) -> Self {
        Self {
            clock,
            random,
            config,
        }
    }

    /// System clock and thread-local randomness
    #[must_use]
    pub fn production(config: BookingConfig) -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(ThreadRandom), config)
    }

    /// Current wall-clock time at the configured UTC offset
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        let offset = chrono::FixedOffset::east_opt(self.config.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        self.clock.now().with_timezone(&offset).naive_local()
    }

    /// Synthesize offers for a route and date
    ///
    /// See [`schedule::generate_schedules`].
    #[must_use]
    pub fn generate_schedules(&self, origin: &str, destination: &str, date: NaiveDate) -> Vec<FlightOffer> {
        schedule::generate_schedules(origin, destination, date, self.local_now(), self.random.as_ref())
    }
}

/// Reducer for the booking session
#[derive(Clone, Debug, Default)]
pub struct BookingReducer {
    seat_map: SeatMap,
}

impl BookingReducer {
    /// Creates a new `BookingReducer` on the standard seat map
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seat_map: SeatMap::standard(),
        }
    }

    fn capture_face(
        state: &mut BookingState,
        slot: PassengerSlot,
        data_url: String,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        if state.in_flight.is_capturing(slot) {
            tracing::debug!(%slot, "Capture already in progress, ignoring");
            return SmallVec::new();
        }
        if state.passengers.get(slot).images.len() >= env.config.max_face_captures {
            let error = EnrollmentError::TooManyCaptures(slot);
            tracing::warn!(%slot, limit = env.config.max_face_captures, "Capture limit reached");
            state.last_error = Some(error.to_string());
            return SmallVec::new();
        }

        state.in_flight.capturing[slot.index()] = true;
        smallvec![delay! {
            duration: env.config.capture_delay(),
            action: BookingAction::FaceCaptured {
                slot,
                image: FaceImage::new(data_url),
            }
        }]
    }

    fn verify_passenger(
        state: &mut BookingState,
        slot: PassengerSlot,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        if state.in_flight.is_verifying(slot) {
            tracing::debug!(%slot, "Verification already in progress, ignoring");
            return SmallVec::new();
        }
        if state.check_in_status.is_verified(slot) {
            tracing::debug!(%slot, "Passenger already verified, ignoring");
            return SmallVec::new();
        }

        state.in_flight.verifying[slot.index()] = true;
        tracing::info!(%slot, "Verification started");
        smallvec![delay! {
            duration: env.config.verification_delay(),
            action: BookingAction::VerificationCompleted { slot }
        }]
    }

    fn generate_boarding_passes(
        state: &mut BookingState,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        if let Err(failure) = validate(state) {
            tracing::warn!(missing = %failure, "Boarding pass gate failed, redirecting");
            state.boarding_passes = None;
            state.last_error = Some(INCOMPLETE_STEPS_MESSAGE.to_string());
            return smallvec![delay! {
                duration: env.config.redirect_delay(),
                action: BookingAction::Redirect { to: Step::Search }
            }];
        }

        match derive_boarding_passes(state, env.random.as_ref()) {
            Ok(passes) => {
                tracing::info!(
                    pnr1 = %passes[0].pnr,
                    pnr2 = %passes[1].pnr,
                    "Boarding passes generated"
                );
                state.boarding_passes = Some(passes);
                state.last_error = None;
            }
            Err(error) => {
                tracing::warn!(%error, "Boarding pass derivation failed");
                state.boarding_passes = None;
                state.last_error = Some(DERIVATION_FAILED_MESSAGE.to_string());
            }
        }
        SmallVec::new()
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::debug!(action = action.kind(), "Reducing");

        match action {
            // ========== Replacements ==========
            BookingAction::SetFlightDetails(details) => {
                state.flight_details = details;
            }
            BookingAction::SetPassengerDetails(passengers) => {
                state.passengers = passengers;
            }
            BookingAction::SetSelectedSeats(seats) => {
                state.selected_seats = seats;
            }
            BookingAction::SetBoardingPasses(passes) => {
                state.boarding_passes = passes;
            }
            BookingAction::SetVerificationStatus(update) => {
                state.check_in_status.merge(update);
            }

            // ========== Checked submissions ==========
            BookingAction::SubmitPassengerDetails(passengers) => match check_enrollment(&passengers) {
                Ok(()) => {
                    tracing::info!("Passenger details saved");
                    state.passengers = passengers;
                    state.last_error = None;
                }
                Err(problems) => {
                    tracing::warn!(problems = problems.len(), "Enrollment rejected");
                    state.last_error = Some(enrollment_message(&problems));
                }
            },
            BookingAction::SubmitSeats(seats) => match self.seat_map.check_selection(&seats) {
                Ok(pair) => {
                    tracing::info!(first = %pair[0], second = %pair[1], "Seats saved");
                    state.selected_seats = pair.to_vec();
                    state.last_error = None;
                }
                Err(error) => {
                    tracing::warn!(%error, "Seat selection rejected");
                    state.last_error = Some(error.to_string());
                }
            },

            // ========== Face capture ==========
            BookingAction::CaptureFace { slot, data_url } => {
                return Self::capture_face(state, slot, data_url, env);
            }
            BookingAction::FaceCaptured { slot, image } => {
                state.in_flight.capturing[slot.index()] = false;
                let images = &mut state.passengers.get_mut(slot).images;
                if images.len() < env.config.max_face_captures {
                    tracing::debug!(%slot, id = %image.id, "Face captured");
                    images.push(image);
                }
            }
            BookingAction::RemoveFace { slot, id } => {
                state.passengers.get_mut(slot).images.retain(|image| image.id != id);
            }

            // ========== Check-in ==========
            BookingAction::VerifyPassenger { slot } => {
                return Self::verify_passenger(state, slot, env);
            }
            BookingAction::VerificationCompleted { slot } => {
                state.in_flight.verifying[slot.index()] = false;
                state.check_in_status.merge(CheckInStatusUpdate::verified(slot));
                tracing::info!(%slot, "Passenger verified");
                if state.check_in_status.all_verified() {
                    tracing::info!("All passengers verified, boarding pass download unlocked");
                }
            }

            // ========== Boarding pass ==========
            BookingAction::GenerateBoardingPasses => {
                return Self::generate_boarding_passes(state, env);
            }
            BookingAction::Redirect { to } => {
                tracing::info!(step = %to, "Redirecting");
                state.redirect = Some(to);
            }

            BookingAction::Unrecognized => {
                tracing::debug!("Unrecognized action ignored");
            }
        }

        SmallVec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seats::Seat;
    use crate::types::{FlightDetails, Passenger, Passengers};
    use skypass_testing::{assertions, test_clock, FixedClock, ReducerTest, SeededRandom};
    use std::time::Duration;

    fn test_env() -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SeededRandom::new(42)),
            BookingConfig::default(),
        )
    }

    fn seats(labels: &[&str]) -> Vec<Seat> {
        labels.iter().filter_map(|label| label.parse().ok()).collect()
    }

    fn enrolled() -> Passengers {
        let mut passengers = Passengers::new(
            Passenger::new("Ravi", "Kumar", "ravi@example.com"),
            Passenger::new("Asha", "Rao", "asha@example.com"),
        );
        for slot in PassengerSlot::ALL {
            passengers.get_mut(slot).images.push(FaceImage::new("data:,"));
        }
        passengers
    }

    fn ready_state() -> BookingState {
        BookingState {
            flight_details: FlightDetails {
                departure_time: chrono::NaiveTime::from_hms_opt(0, 10, 0),
                ..FlightDetails::new("DEL", "BOM", "2025-03-01")
            },
            passengers: enrolled(),
            selected_seats: seats(&["5B", "5C"]),
            ..BookingState::default()
        }
    }

    #[test]
    fn set_flight_details_replaces() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SetFlightDetails(FlightDetails::new("HYD", "DEL", "2025-04-02")))
            .then_state(|state| {
                assert_eq!(state.flight_details.origin, "HYD");
                assert_eq!(state.flight_details.date, "2025-04-02");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn set_selected_seats_does_not_validate() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SetSelectedSeats(seats(&["1A", "1A", "2B"])))
            .then_state(|state| assert_eq!(state.selected_seats.len(), 3))
            .run();
    }

    #[test]
    fn verification_status_merges() {
        let mut given = BookingState::default();
        given.check_in_status.person1_verified = true;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::SetVerificationStatus(CheckInStatusUpdate::verified(
                PassengerSlot::Second,
            )))
            .then_state(|state| assert!(state.check_in_status.all_verified()))
            .run();
    }

    #[test]
    fn unrecognized_is_a_no_op() {
        let given = ready_state();
        let expected = given.clone();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::Unrecognized)
            .then_state(move |state| assert_eq!(*state, expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn enrollment_rejection_records_message() {
        let mut passengers = enrolled();
        passengers.person1.email = "not-an-email".to_string();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SubmitPassengerDetails(passengers))
            .then_state(|state| {
                assert_eq!(state.last_error.as_deref(), Some("Person 1: Invalid email format"));
                assert!(!state.passengers.person1.has_name());
            })
            .run();
    }

    #[test]
    fn seat_submission_requires_two() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SubmitSeats(seats(&["3C"])))
            .then_state(|state| {
                assert!(state.selected_seats.is_empty());
                assert_eq!(
                    state.last_error.as_deref(),
                    Some("Please select exactly 2 seats to continue")
                );
            })
            .run();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SubmitSeats(seats(&["3C", "3D"])))
            .then_state(|state| {
                assert_eq!(state.selected_seats, seats(&["3C", "3D"]));
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn capture_schedules_delayed_completion() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::CaptureFace {
                slot: PassengerSlot::First,
                data_url: "data:image/jpeg;base64,AAAA".to_string(),
            })
            .then_state(|state| assert!(state.in_flight.is_capturing(PassengerSlot::First)))
            .then_effects(|effects| {
                let (duration, action) = assertions::assert_single_delay(effects);
                assert_eq!(duration, Duration::from_millis(500));
                assert!(matches!(
                    action,
                    BookingAction::FaceCaptured { slot: PassengerSlot::First, image } if image.data_url == "data:image/jpeg;base64,AAAA"
                ));
            })
            .run();
    }

    #[test]
    fn capture_limit_is_enforced() {
        let mut given = BookingState::default();
        for _ in 0..6 {
            given.passengers.person2.images.push(FaceImage::new("data:,"));
        }
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::CaptureFace {
                slot: PassengerSlot::Second,
                data_url: "data:,".to_string(),
            })
            .then_state(|state| {
                assert!(!state.in_flight.is_capturing(PassengerSlot::Second));
                assert_eq!(
                    state.last_error.as_deref(),
                    Some("Person 2: Maximum number of face captures reached")
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn remove_face_by_id() {
        let mut given = BookingState::default();
        let keep = FaceImage::new("data:keep");
        let drop = FaceImage::new("data:drop");
        let drop_id = drop.id;
        given.passengers.person1.images = vec![keep.clone(), drop];
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::RemoveFace {
                slot: PassengerSlot::First,
                id: drop_id,
            })
            .then_state(move |state| assert_eq!(state.passengers.person1.images, vec![keep]))
            .run();
    }

    #[test]
    fn verification_in_flight_blocks_reentry() {
        let mut given = BookingState::default();
        given.in_flight.verifying[0] = true;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::VerifyPassenger {
                slot: PassengerSlot::First,
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn verification_starts_with_two_second_delay() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::default())
            .when_action(BookingAction::VerifyPassenger {
                slot: PassengerSlot::Second,
            })
            .then_state(|state| assert!(state.in_flight.is_verifying(PassengerSlot::Second)))
            .then_effects(|effects| {
                let (duration, action) = assertions::assert_single_delay(effects);
                assert_eq!(duration, Duration::from_secs(2));
                assert_eq!(
                    *action,
                    BookingAction::VerificationCompleted {
                        slot: PassengerSlot::Second
                    }
                );
            })
            .run();
    }

    #[test]
    fn gate_failure_schedules_redirect() {
        let mut given = ready_state();
        given.selected_seats.truncate(1);
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::GenerateBoardingPasses)
            .then_state(|state| {
                assert!(state.boarding_passes.is_none());
                assert_eq!(state.last_error.as_deref(), Some(INCOMPLETE_STEPS_MESSAGE));
            })
            .then_effects(|effects| {
                let (duration, action) = assertions::assert_single_delay(effects);
                assert_eq!(duration, Duration::from_secs(3));
                assert_eq!(*action, BookingAction::Redirect { to: Step::Search });
            })
            .run();
    }

    #[test]
    fn derivation_failure_is_generic() {
        let mut given = ready_state();
        given.flight_details.departure_time = None;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::GenerateBoardingPasses)
            .then_state(|state| {
                assert!(state.boarding_passes.is_none());
                assert_eq!(state.last_error.as_deref(), Some(DERIVATION_FAILED_MESSAGE));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn raw_passengers_without_captures_get_no_passes() {
        let mut given = ready_state();
        given.passengers = Passengers::new(
            Passenger::new("Ravi", "Kumar", "ravi@example.com"),
            Passenger::new("Asha", "Rao", "asha@example.com"),
        );
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(BookingAction::GenerateBoardingPasses)
            .then_state(|state| {
                assert!(state.boarding_passes.is_none());
                assert_eq!(state.last_error.as_deref(), Some(DERIVATION_FAILED_MESSAGE));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn boarding_passes_generated_for_valid_state() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(ready_state())
            .when_action(BookingAction::GenerateBoardingPasses)
            .then_state(|state| {
                let passes = state.boarding_passes.as_ref();
                assert_eq!(
                    passes.map(|p| p[0].flight.boarding_time.format("%H:%M").to_string()),
                    Some("23:40".to_string())
                );
                assert_eq!(passes.map(|p| p[1].passenger.seat.to_string()), Some("5C".to_string()));
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn local_now_applies_offset() {
        let env = BookingEnvironment::new(
            Arc::new(FixedClock::at("2025-01-01T20:00:00Z")),
            Arc::new(SeededRandom::new(1)),
            BookingConfig::default(),
        );
        let now = env.local_now();
        assert_eq!(now.format("%Y-%m-%d %H:%M").to_string(), "2025-01-02 01:30");
    }
}
