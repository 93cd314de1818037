//! Configuration management for the self-service flow.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration values that cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one face capture must be allowed
    #[error("max_face_captures must be at least 1")]
    NoFaceCaptures,

    /// Offset outside what any real time zone uses
    #[error("utc_offset_minutes {0} is outside -840..=840")]
    OffsetOutOfRange(i32),
}

/// Flow configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Simulated face verification time in milliseconds
    pub verification_delay_ms: u64,
    /// Simulated face capture time in milliseconds
    pub capture_delay_ms: u64,
    /// How long a blocking message stays up before redirecting, in milliseconds
    pub redirect_delay_ms: u64,
    /// Face captures allowed per passenger
    pub max_face_captures: usize,
    /// Offset of the local wall clock from UTC, in minutes
    pub utc_offset_minutes: i32,
    /// Default tracing filter (overridden by `RUST_LOG`)
    pub log_filter: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            verification_delay_ms: 2000,
            capture_delay_ms: 500,
            redirect_delay_ms: 3000,
            max_face_captures: 6,
            utc_offset_minutes: 330,
            log_filter: "skypass=info,skypass_booking=info,skypass_runtime=info".to_string(),
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            verification_delay_ms: parsed("SKYPASS_VERIFICATION_DELAY_MS")
                .unwrap_or(defaults.verification_delay_ms),
            capture_delay_ms: parsed("SKYPASS_CAPTURE_DELAY_MS").unwrap_or(defaults.capture_delay_ms),
            redirect_delay_ms: parsed("SKYPASS_REDIRECT_DELAY_MS")
                .unwrap_or(defaults.redirect_delay_ms),
            max_face_captures: parsed("SKYPASS_MAX_FACE_CAPTURES")
                .unwrap_or(defaults.max_face_captures),
            utc_offset_minutes: parsed("SKYPASS_UTC_OFFSET_MINUTES")
                .unwrap_or(defaults.utc_offset_minutes),
            log_filter: env::var("SKYPASS_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Check that the values can drive the flow
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero capture limit or an offset beyond ±14h.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_face_captures == 0 {
            return Err(ConfigError::NoFaceCaptures);
        }
        if self.utc_offset_minutes < -840 || self.utc_offset_minutes > 840 {
            return Err(ConfigError::OffsetOutOfRange(self.utc_offset_minutes));
        }
        Ok(())
    }

    /// Simulated verification delay
    #[must_use]
    pub const fn verification_delay(&self) -> Duration {
        Duration::from_millis(self.verification_delay_ms)
    }

    /// Simulated capture delay
    #[must_use]
    pub const fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    /// Delay before a failed gate redirects to the entry step
    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
