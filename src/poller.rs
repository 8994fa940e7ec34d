//! Public entry points for waiting on remote state convergence.
//!
//! Each waiter samples remote state through an injected closure, so the
//! client handle is a captured dependency rather than a process-wide
//! singleton, and a scripted fake drops in for tests.

use std::future::Future;

use futures::future::join_all;
use tokio::sync::watch;

use crate::engine::{self, PollResult, Verdict};
use crate::error::SampleError;
use crate::policy::PollPolicy;

/// Deduplicates consecutive identical state observations, so a state is
/// logged exactly once per distinct run of values.
#[derive(Debug, Default)]
struct StateTracker {
    last_seen: Option<String>,
}

impl StateTracker {
    /// Records one observation. Returns `true` when it differs from the
    /// previous one and should be logged.
    fn observe(&mut self, state: &str) -> bool {
        if self.last_seen.as_deref() == Some(state) {
            return false;
        }
        self.last_seen = Some(state.to_string());
        true
    }
}

/// Polls remote state until convergence, failure, or exhaustion of the
/// attempt budget.
///
/// A `Poller` is cheap to construct and owns no connection; build one per
/// wait or share one per test. Independent waits share no state.
#[derive(Debug, Clone)]
pub struct Poller {
    policy: PollPolicy,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            shutdown: None,
        }
    }

    /// Attach a shutdown signal. When the sender flips it to `true` the
    /// wait ends with [`PollOutcome::Cancelled`](crate::PollOutcome),
    /// checked before each sample and raced against the interval sleep.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Wait until the sampled state equals `goal_state`, observing
    /// `failure_state` as a distinct terminal outcome.
    ///
    /// The goal check runs first, so a label serving as both goal and
    /// failure counts as success. A transiently failing sample is logged
    /// and retried; it consumes its attempt but never aborts the wait.
    pub async fn wait_for_state<F, Fut>(
        &self,
        goal_state: &str,
        failure_state: &str,
        sample: F,
    ) -> PollResult<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, SampleError>>,
    {
        log::info!("waiting for state {goal_state}");
        let mut tracker = StateTracker::default();
        let result = engine::drive(&self.policy, self.shutdown.clone(), sample, |state| {
            if tracker.observe(state) {
                log::info!("transitioned to state {state}");
            }
            if state == goal_state {
                Verdict::Goal
            } else if state == failure_state {
                Verdict::Failure
            } else {
                Verdict::Pending
            }
        })
        .await;

        log_terminal(&result, goal_state);
        result
    }

    /// Wait until any state in `goal_states` is observed. There is no
    /// failure state; every listed state ends the wait as a goal.
    ///
    /// This is the "reached a terminal state" wait: pass the full set of
    /// terminal labels and inspect `result.state` for which one ended it.
    pub async fn wait_for_terminal<F, Fut>(
        &self,
        goal_states: &[&str],
        sample: F,
    ) -> PollResult<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, SampleError>>,
    {
        log::info!("waiting for any state of {goal_states:?}");
        let mut tracker = StateTracker::default();
        let result = engine::drive(&self.policy, self.shutdown.clone(), sample, |state| {
            if tracker.observe(state) {
                log::info!("transitioned to state {state}");
            }
            if goal_states.iter().any(|goal| state == goal) {
                Verdict::Goal
            } else {
                Verdict::Pending
            }
        })
        .await;

        match &result.outcome {
            engine::PollOutcome::ReachedGoal => log::info!(
                "state transition took {:.3} seconds",
                result.elapsed.as_secs_f64()
            ),
            _ => log::info!(
                "goal_states:{goal_states:?} current_state:{} attempts:{}",
                result.state.as_deref().unwrap_or("<none>"),
                result.attempts
            ),
        }
        result
    }

    /// Wait until `condition` holds for a freshly fetched object.
    ///
    /// Same timing and retry discipline as [`wait_for_state`]; the
    /// predicate replaces the goal/failure comparison, so there is no
    /// failure outcome, only convergence or timeout.
    ///
    /// [`wait_for_state`]: Poller::wait_for_state
    pub async fn wait_for_condition<T, F, Fut, P>(
        &self,
        subject: &str,
        fetch: F,
        mut condition: P,
    ) -> PollResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SampleError>>,
        P: FnMut(&T) -> bool,
    {
        log::info!("{subject} waiting for condition");
        let result = engine::drive(&self.policy, self.shutdown.clone(), fetch, |observed| {
            if condition(observed) {
                Verdict::Goal
            } else {
                Verdict::Pending
            }
        })
        .await;

        match &result.outcome {
            engine::PollOutcome::ReachedGoal => log::info!(
                "{subject} condition met in {:.3} seconds",
                result.elapsed.as_secs_f64()
            ),
            _ => log::info!(
                "{subject} condition not met, attempts:{}",
                result.attempts
            ),
        }
        result
    }

    /// Wait until all `units` sub-units report ready in the same attempt.
    ///
    /// Each attempt samples every sub-unit concurrently and counts how
    /// many satisfy the per-unit target; the wait succeeds only when the
    /// count equals `units`. A sub-unit whose sample fails transiently
    /// counts as not ready for that attempt.
    ///
    /// The result state is the ready count from the last attempt.
    pub async fn wait_for_all_ready<F, Fut>(
        &self,
        subject: &str,
        units: usize,
        unit_ready: F,
    ) -> PollResult<usize>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = Result<bool, SampleError>>,
    {
        log::info!("{subject} waiting for {units} units to be ready");
        let mut last_count: Option<usize> = None;
        let result = engine::drive(
            &self.policy,
            self.shutdown.clone(),
            || {
                let checks = (0..units).map(&unit_ready);
                async move {
                    let mut count = 0;
                    for (unit, readiness) in join_all(checks).await.into_iter().enumerate() {
                        match readiness {
                            Ok(true) => count += 1,
                            Ok(false) => {}
                            Err(e) => log::warn!("unit {unit} readiness check failed: {e}"),
                        }
                    }
                    Ok(count)
                }
            },
            |count: &usize| {
                if last_count != Some(*count) {
                    log::info!("{subject} has {count}/{units} units ready");
                    last_count = Some(*count);
                }
                if *count == units {
                    Verdict::Goal
                } else {
                    Verdict::Pending
                }
            },
        )
        .await;

        match &result.outcome {
            engine::PollOutcome::ReachedGoal => log::info!(
                "{subject} has all {units} units ready in {:.3} seconds",
                result.elapsed.as_secs_f64()
            ),
            _ => log::info!(
                "{subject} readiness not reached, ready:{} attempts:{}",
                result.state.unwrap_or(0),
                result.attempts
            ),
        }
        result
    }
}

fn log_terminal(result: &PollResult<String>, goal_state: &str) {
    match result.outcome {
        engine::PollOutcome::ReachedGoal => log::info!(
            "state transition took {:.3} seconds",
            result.elapsed.as_secs_f64()
        ),
        engine::PollOutcome::TimedOut => {
            log::info!("max attempts reached to wait for goal state");
            log::info!(
                "goal_state:{goal_state} current_state:{} attempts:{}",
                result.state.as_deref().unwrap_or("<none>"),
                result.attempts
            );
        }
        engine::PollOutcome::Failed => log::info!(
            "goal_state:{goal_state} current_state:{} attempts:{}",
            result.state.as_deref().unwrap_or("<none>"),
            result.attempts
        ),
        engine::PollOutcome::Cancelled => {
            log::info!("wait for state {goal_state} cancelled after {} attempts", result.attempts)
        }
    }
}
