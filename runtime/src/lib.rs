//! # Skypass Runtime
//!
//! The Store that owns one booking session.
//!
//! Every step of the flow holds a clone of the same store. Actions are
//! reduced one at a time under a write lock, so any read issued after
//! `send` returns observes that action. Delayed effects run on spawned
//! tasks and feed their action back through the same reduce path.
//!
//! ## Example
//!
//! ```ignore
//! use skypass_runtime::Store;
//!
//! let store = Store::new(BookingState::default(), BookingReducer::new(), env);
//!
//! // Dispatch an action
//! store.send(BookingAction::SetSelectedSeats(seats)).await?;
//!
//! // Read state
//! let seats = store.state(|s| s.selected_seats.len()).await;
//! ```

use skypass_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `send()` was called after shutdown started
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Delays were still running when the shutdown timeout elapsed
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action arrived before the timeout
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Effect-produced actions buffered for `send_and_wait_for` observers
const ACTION_BUFFER: usize = 16;

/// Timeout used by [`Store::shutdown_default`]
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared count of running effects
///
/// Waiters watch the value reach zero instead of polling.
#[derive(Clone)]
struct EffectCounter(Arc<watch::Sender<usize>>);

impl EffectCounter {
    fn new() -> Self {
        Self(Arc::new(watch::channel(0).0))
    }

    fn watch(&self) -> watch::Receiver<usize> {
        self.0.subscribe()
    }

    fn current(&self) -> usize {
        *self.0.borrow()
    }

    fn add(&self) {
        self.0.send_modify(|n| *n += 1);
    }

    fn remove(&self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Keeps one effect registered with its action's counter and the store's
///
/// Dropping it, including on panic inside the effect task, releases both.
struct RunningEffect {
    action: EffectCounter,
    store: EffectCounter,
}

impl RunningEffect {
    fn start(action: &EffectCounter, store: &EffectCounter) -> Self {
        action.add();
        store.add();
        Self {
            action: action.clone(),
            store: store.clone(),
        }
    }
}

impl Drop for RunningEffect {
    fn drop(&mut self) {
        self.action.remove();
        self.store.remove();
    }
}

/// Handle for the effects of one dispatched action
///
/// Returned by [`Store::send()`]. For a delay, completion includes reducing
/// the delayed action.
///
/// ```ignore
/// let mut handle = store.send(BookingAction::VerifyPassenger { slot }).await?;
/// handle.wait().await;
/// // The verification result has been merged into the state
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    pending: watch::Receiver<usize>,
}

impl EffectHandle {
    /// A handle with nothing left to wait for
    #[must_use]
    pub fn completed() -> Self {
        Self {
            pending: EffectCounter::new().watch(),
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        // An error means every counter is gone, so nothing is running
        let _ = self.pending.wait_for(|n| *n == 0).await;
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when
    /// the timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish()
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        broadcast, Arc, AtomicBool, Duration, Effect, EffectCounter, EffectHandle, Ordering, Reducer,
        RunningEffect, RwLock, StoreError, ACTION_BUFFER, DEFAULT_SHUTDOWN_TIMEOUT,
    };

    /// The Store - runtime coordinator for a reducer
    ///
    /// `send` is the only way to mutate state. Reads go through
    /// [`Store::state`] or [`Store::snapshot`] and never hand out a mutable
    /// reference. Clones share state, effects and the shutdown flag.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        running: EffectCounter,
        /// Every action fed back by an effect, sent after it was reduced
        completed_actions: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (completed_actions, _) = broadcast::channel(ACTION_BUFFER);
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                running: EffectCounter::new(),
                completed_actions,
            }
        }

        /// Dispatch an action
        ///
        /// Reduces the action, then starts its effects. Returns once the
        /// state reflects the action; use the returned [`EffectHandle`] to
        /// wait for delayed follow-ups.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] once shutdown started.
        #[tracing::instrument(skip_all, name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            metrics::counter!("store.commands.total").increment(1);
            Ok(self.dispatch(action).await)
        }

        /// Dispatch an action and wait for a matching action fed back by its
        /// effects
        ///
        /// The matching action has already been reduced when this returns.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: nothing matched before the timeout
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: shutdown started
        pub async fn send_and_wait_for<F>(&self, action: A, predicate: F, timeout: Duration) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe first so a fast effect cannot be missed
            let mut completed = self.completed_actions.subscribe();
            self.send(action).await?;

            let matching = async {
                loop {
                    match completed.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => return Err(StoreError::ChannelClosed),
                    }
                }
            };
            tokio::time::timeout(timeout, matching)
                .await
                .map_err(|_| StoreError::Timeout)?
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let verified = store.state(|s| s.check_in_status.all_verified()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Clone the current state
        ///
        /// The returned value is detached from the store; changing it has no
        /// effect on the session.
        pub async fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state(Clone::clone).await
        }

        /// Stop accepting actions and wait for running delays to finish
        ///
        /// Delays that already started still reduce their action.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running when the timeout expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);
            self.shutdown.store(true, Ordering::Release);

            let mut running = self.running.watch();
            if tokio::time::timeout(timeout, running.wait_for(|n| *n == 0)).await.is_err() {
                let pending = self.running.current();
                tracing::error!(pending_effects = pending, "Shutdown timed out");
                metrics::counter!("store.shutdown.timeout").increment(1);
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tracing::info!("All effects completed, shutdown successful");
            Ok(())
        }

        /// [`Store::shutdown`] with [`DEFAULT_SHUTDOWN_TIMEOUT`]
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT).await
        }

        /// Reduce one action and start its effects, ignoring the shutdown flag
        async fn dispatch(&self, action: A) -> EffectHandle {
            let effects = {
                let mut state = self.state.write().await;
                let _span = tracing::debug_span!("reducer_execution").entered();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds").record(start.elapsed().as_secs_f64());
                tracing::trace!(effects = effects.len(), "Reducer completed");
                effects
            };

            let counter = EffectCounter::new();
            let handle = EffectHandle {
                pending: counter.watch(),
            };
            for effect in effects {
                self.start_effect(effect, &counter);
            }
            handle
        }

        fn start_effect(&self, effect: Effect<A>, counter: &EffectCounter) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!(?duration, "Starting delay");
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let running = RunningEffect::start(counter, &self.running);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _running = running;
                        tokio::time::sleep(duration).await;

                        let action = *action;
                        store.dispatch(action.clone()).await;
                        // No subscribers is fine
                        let _ = store.completed_actions.send(action);
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                running: self.running.clone(),
                completed_actions: self.completed_actions.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
