//! # Skypass Booking
//!
//! A simulated airline self-service flow: search, passenger enrollment,
//! seat selection, self check-in and boarding pass.
//!
//! There is no backend. Flight offers are synthesized from a static
//! catalog on every search, verification is a timed delay, and the session
//! lives in one [`BookingState`] held by a
//! [`Store`](skypass_runtime::Store) and mutated only through
//! [`BookingAction`]s.
//!
//! ## Pieces
//!
//! - [`schedule`]: offer synthesis for a route and date
//! - [`reducer`]: the state transitions and simulated delays
//! - [`gate`]: per-step preconditions
//! - [`boarding`]: boarding-pass derivation and the download lock
//! - [`forms`] and [`seats`]: input checks at the point of submission
//!
//! ## Example
//!
//! ```ignore
//! let env = BookingEnvironment::production(BookingConfig::from_env());
//! let store = Store::new(BookingState::new(), BookingReducer::new(), env);
//!
//! store.send(BookingAction::SetFlightDetails(details)).await?;
//! let mut handle = store.send(BookingAction::VerifyPassenger { slot: PassengerSlot::First }).await?;
//! handle.wait().await;
//! ```

pub mod actions;
pub mod boarding;
pub mod catalog;
pub mod config;
pub mod error;
pub mod forms;
pub mod gate;
pub mod reducer;
pub mod schedule;
pub mod seats;
pub mod types;

pub use actions::BookingAction;
pub use boarding::{can_download, derive_boarding_passes, qr_payload, BoardingPass, DerivationError};
pub use config::{BookingConfig, ConfigError};
pub use error::BookingError;
pub use forms::{check_enrollment, search_flights, EnrollmentError, SearchError, SearchForm};
pub use gate::{can_enter, is_valid, validate, MissingField, Step, ValidationFailure};
pub use reducer::{BookingEnvironment, BookingReducer};
pub use schedule::{generate_schedules, FlightOffer, SpecialOffer, Stops};
pub use seats::{Seat, SeatColumn, SeatMap, SeatSelection, SeatSelectionError};
pub use types::{
    BookingState, CheckInStatus, CheckInStatusUpdate, FaceImage, FlightDetails, Passenger,
    PassengerSlot, Passengers,
};

/// Store specialised to the booking session
pub type BookingStore =
    skypass_runtime::Store<BookingState, BookingAction, BookingEnvironment, BookingReducer>;
