//! The shared attempt/interval/timeout skeleton behind every waiter.
//!
//! One engine, one transient-error policy: a failed sample is logged at
//! warn level, consumes its attempt, and the loop keeps going. The waiters
//! in [`crate::poller`] differ only in how they classify a successful
//! sample.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::{ConvergenceError, SampleError};
use crate::policy::PollPolicy;

/// Terminal classification of one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    ReachedGoal,
    Failed,
    TimedOut,
    Cancelled,
}

/// Outcome of one wait: how it ended, the last state observed, how many
/// samples were taken, and wall-clock time spent.
///
/// Constructed fresh per wait and never mutated after return. `attempts`
/// counts samples performed, including ones that failed transiently.
#[derive(Debug, Clone)]
pub struct PollResult<S> {
    pub outcome: PollOutcome,
    pub state: Option<S>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl<S> PollResult<S> {
    pub fn reached_goal(&self) -> bool {
        self.outcome == PollOutcome::ReachedGoal
    }

    /// Map the result onto `Result`, so callers can surface FAILED,
    /// TIMED_OUT, and cancellation through `?` or `expect`.
    pub fn into_goal(self) -> Result<S, ConvergenceError>
    where
        S: std::fmt::Debug,
    {
        match self.outcome {
            PollOutcome::ReachedGoal => match self.state {
                Some(state) => Ok(state),
                None => unreachable!("goal outcome always carries the observed state"),
            },
            PollOutcome::Failed => Err(ConvergenceError::Failed {
                state: debug_state(&self.state),
                attempts: self.attempts,
            }),
            PollOutcome::TimedOut => Err(ConvergenceError::TimedOut {
                last_state: debug_state(&self.state),
                attempts: self.attempts,
            }),
            PollOutcome::Cancelled => Err(ConvergenceError::Cancelled {
                attempts: self.attempts,
            }),
        }
    }
}

fn debug_state<S: std::fmt::Debug>(state: &Option<S>) -> String {
    match state {
        Some(state) => format!("{state:?}"),
        None => "<none>".to_string(),
    }
}

/// How a waiter classifies one successfully sampled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Goal,
    Failure,
    Pending,
}

/// Run the sample/classify/sleep loop until a terminal verdict, the
/// attempt budget, or cancellation ends it.
///
/// `classify` is invoked exactly once per successful sample, in order, so
/// it may carry state across attempts (the waiters use that for
/// transition logging). The goal check must come before the failure check
/// inside `classify` implementations built on [`Verdict`]; the engine
/// honors whichever verdict it is handed.
pub(crate) async fn drive<S, F, Fut, C>(
    policy: &PollPolicy,
    shutdown: Option<watch::Receiver<bool>>,
    mut sample: F,
    mut classify: C,
) -> PollResult<S>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, SampleError>>,
    C: FnMut(&S) -> Verdict,
{
    let start = Instant::now();
    let mut shutdown = shutdown;
    let mut attempts = 0u32;
    let mut state: Option<S> = None;

    let outcome = loop {
        if is_cancelled(&shutdown) {
            break PollOutcome::Cancelled;
        }
        if attempts >= policy.max_attempts {
            break PollOutcome::TimedOut;
        }
        attempts += 1;

        match sample().await {
            Ok(observed) => match classify(&observed) {
                Verdict::Goal => {
                    state = Some(observed);
                    break PollOutcome::ReachedGoal;
                }
                Verdict::Failure => {
                    state = Some(observed);
                    break PollOutcome::Failed;
                }
                Verdict::Pending => state = Some(observed),
            },
            Err(e) => log::warn!("sample attempt {attempts} failed: {e}"),
        }

        if !sleep_interval(policy.interval, shutdown.as_mut()).await {
            break PollOutcome::Cancelled;
        }
    };

    PollResult {
        outcome,
        state,
        attempts,
        elapsed: start.elapsed(),
    }
}

fn is_cancelled(shutdown: &Option<watch::Receiver<bool>>) -> bool {
    shutdown.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
}

/// Sleep for one interval, racing the shutdown signal. Returns `false`
/// when the wait was cancelled mid-sleep.
async fn sleep_interval(
    interval: Duration,
    shutdown: Option<&mut watch::Receiver<bool>>,
) -> bool {
    let rx = match shutdown {
        Some(rx) => rx,
        None => {
            tokio::time::sleep(interval).await;
            return true;
        }
    };

    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = rx.changed() => {
                match changed {
                    Ok(()) => {
                        if *rx.borrow() {
                            return false;
                        }
                        // Spurious flip back to false; keep sleeping.
                    }
                    Err(_) => {
                        // Sender dropped; nobody can cancel us anymore.
                        sleep.await;
                        return true;
                    }
                }
            }
        }
    }
}
