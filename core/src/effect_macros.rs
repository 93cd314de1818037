//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Delay` for a simulated suspension point
///
/// The wrapped action is fed back into the store once the duration
/// elapses. Used for every timed simulation in the flow (face capture,
/// face verification, redirect after a blocking message).
///
/// # Example
///
/// ```rust,ignore
/// use skypass_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(2),
///     action: BookingAction::VerificationCompleted { slot: PassengerSlot::First }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
