//! # Skypass Testing
//!
//! Testing utilities and helpers for the Skypass self-service flow.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//!   (`FixedClock`, `SeededRandom`, `ScriptedRandom`)
//! - `ReducerTest`, a Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use skypass_testing::{test_clock, SeededRandom};
//!
//! let env = BookingEnvironment::new(
//!     Arc::new(test_clock()),
//!     Arc::new(SeededRandom::new(7)),
//!     BookingConfig::default(),
//! );
//! let offers = env.generate_schedules("DEL", "BOM", date);
//! ```

use chrono::{DateTime, Utc};
use skypass_core::environment::{Clock, RandomSource};


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, RandomSource, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use skypass_testing::mocks::FixedClock;
    /// use skypass_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Create a fixed clock from an RFC 3339 timestamp
        ///
        /// # Panics
        ///
        /// Panics if the timestamp does not parse. Only meant for literals
        /// in tests.
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn at(rfc3339: &str) -> Self {
            Self::new(
                DateTime::parse_from_rfc3339(rfc3339)
                    .expect("test timestamp should be valid RFC 3339")
                    .with_timezone(&Utc),
            )
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::at("2025-01-01T00:00:00Z")
    }

    /// Seeded randomness: same seed, same sequence
    #[derive(Debug)]
    pub struct SeededRandom {
        rng: Mutex<StdRng>,
    }

    impl SeededRandom {
        /// Create a generator from a seed
        #[must_use]
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }
        }
    }

    impl RandomSource for SeededRandom {
        fn next_f64(&self) -> f64 {
            self.rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .gen_range(0.0..1.0)
        }

        fn below(&self, upper: u32) -> u32 {
            if upper == 0 {
                return 0;
            }
            self.rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .gen_range(0..upper)
        }
    }

    /// Replays a fixed list of unit-interval draws, then repeats the last one
    ///
    /// `below(n)` maps a draw `x` to `floor(x * n)`, so a script can pin
    /// exact outcomes: `0.0` always takes the lowest option, `0.999` the
    /// highest.
    #[derive(Debug)]
    pub struct ScriptedRandom {
        draws: Mutex<VecDeque<f64>>,
        fallback: f64,
    }

    impl ScriptedRandom {
        /// Create a script from draws in `[0, 1)`
        #[must_use]
        pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
            let draws: VecDeque<f64> = draws.into_iter().map(|d| d.clamp(0.0, 0.999_999)).collect();
            let fallback = draws.back().copied().unwrap_or(0.0);
            Self {
                draws: Mutex::new(draws),
                fallback,
            }
        }

        /// A script that always draws the same value
        #[must_use]
        pub fn constant(draw: f64) -> Self {
            Self::new([draw])
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_f64(&self) -> f64 {
            let mut draws = self.draws.lock().unwrap_or_else(PoisonError::into_inner);
            if draws.len() > 1 {
                draws.pop_front().unwrap_or(self.fallback)
            } else {
                draws.front().copied().unwrap_or(self.fallback)
            }
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_lossless
        )]
        fn below(&self, upper: u32) -> u32 {
            if upper == 0 {
                return 0;
            }
            ((self.next_f64() * f64::from(upper)) as u32).min(upper - 1)
        }
    }
}

/// Fluent reducer testing
pub use reducer_test::{assertions, ReducerTest};

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, ScriptedRandom, SeededRandom};
