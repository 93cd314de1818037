//! # Skypass Core
//!
//! Core traits and types for the Skypass self-service flow.
//!
//! Every step of the flow (search, enrollment, seat selection, check-in,
//! boarding pass) reads and mutates one booking state through a reducer.
//! This crate holds the vocabulary that reducer is written in.
//!
//! ## Core Concepts
//!
//! - **State**: The booking aggregate shared by all steps
//! - **Action**: Every input a step can dispatch
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (clock, randomness) via traits
//!
//! ## Example
//!
//! ```ignore
//! use skypass_core::*;
//!
//! impl Reducer for BookingReducer {
//!     type State = BookingState;
//!     type Action = BookingAction;
//!     type Environment = BookingEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BookingState,
//!         action: BookingAction,
//!         env: &BookingEnvironment,
//!     ) -> SmallVec<[Effect<BookingAction>; 4]> {
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Declarative helpers for building effects
pub mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic once the
/// environment (clock, randomness) is fixed.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce no effects, so the return type keeps up to
        /// four effects inline without allocating.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe work the runtime performs after a reducer returns.
/// The flow has no I/O; its only side effect is time passing.
pub mod effect {
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are returned from reducers
    /// and executed by the Store runtime.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Feed `action` back into the store once `duration` has elapsed
        ///
        /// Used for simulated capture, verification and redirects. Once
        /// started, the delayed action is always reduced, even if the store
        /// begins shutting down in the meantime.
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },
    }

    impl<Action> Effect<Action> {
        /// The delayed action, if this effect schedules one
        #[must_use]
        pub fn delayed(&self) -> Option<(Duration, &Action)> {
            match self {
                Self::None => None,
                Self::Delay { duration, action } => Some((*duration, action.as_ref())),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// The flow depends on exactly two ambient sources: a wall clock and
/// randomness. Both are abstracted behind traits so tests can pin them.
pub mod environment {
    use chrono::{DateTime, Utc};
    use rand::Rng;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of randomness for synthesized data
    ///
    /// Implementations take `&self` so one source can be shared by every
    /// consumer in an environment; seeded implementations use interior
    /// mutability.
    pub trait RandomSource: Send + Sync {
        /// Uniform float in `[0, 1)`
        fn next_f64(&self) -> f64;

        /// Uniform integer in `[0, upper)`. Returns 0 when `upper` is 0.
        fn below(&self, upper: u32) -> u32;

        /// Uniform integer in `[low, high)`. Returns `low` for an empty range.
        fn between(&self, low: u32, high: u32) -> u32 {
            low + self.below(high.saturating_sub(low))
        }

        /// `true` with the given probability
        fn chance(&self, probability: f64) -> bool {
            self.next_f64() < probability
        }
    }

    /// Pick one element uniformly, `None` for an empty slice
    pub fn choose<'a, T, R>(random: &R, items: &'a [T]) -> Option<&'a T>
    where
        R: RandomSource + ?Sized,
    {
        let len = u32::try_from(items.len()).ok()?;
        items.get(random.below(len) as usize)
    }

    /// Production randomness backed by the thread-local generator
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ThreadRandom;

    impl RandomSource for ThreadRandom {
        fn next_f64(&self) -> f64 {
            rand::thread_rng().gen_range(0.0..1.0)
        }

        fn below(&self, upper: u32) -> u32 {
            if upper == 0 {
                return 0;
            }
            rand::thread_rng().gen_range(0..upper)
        }
    }
}
