//! Integration tests for goal/failure/timeout classification of the state
//! waiter, driven against a scripted job service.

use std::time::{Duration, Instant};

use goalstate::{
    ConvergenceError, PollConfig, PollOutcome, PollPolicy, Poller, StateVocabulary,
    JOB_STATE_FAILED, JOB_STATE_PENDING, JOB_STATE_SUCCEEDED,
};
use tokio::sync::watch;

use crate::integration::test_utils::{ScriptedJobService, Step};

/// A job that converges through PENDING and RUNNING reaches the goal on
/// the fifth sample: `attempts` counts samples, and later hypothetical
/// states are never read.
#[tokio::test]
async fn test_wait_for_state_reaches_goal_through_transitions() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[
        Step::State("PENDING"),
        Step::State("PENDING"),
        Step::State("RUNNING"),
        Step::State("RUNNING"),
        Step::State("SUCCEEDED"),
    ]);

    let poller = Poller::new(PollPolicy::immediate(5));
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::ReachedGoal);
    assert_eq!(result.attempts, 5);
    assert_eq!(result.state.as_deref(), Some("SUCCEEDED"));
    assert_eq!(service.samples_served(), 5);
}

/// A job stuck in PENDING exhausts the budget after exactly
/// `max_attempts` samples.
#[tokio::test]
async fn test_wait_for_state_times_out_after_exact_budget() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[
        Step::State("PENDING"),
        Step::State("PENDING"),
        Step::State("PENDING"),
    ]);

    let poller = Poller::new(PollPolicy::immediate(3));
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert_eq!(result.attempts, 3);
    assert_eq!(service.samples_served(), 3);
    assert_eq!(result.state.as_deref(), Some("PENDING"));
}

#[tokio::test]
async fn test_wait_for_state_observes_failure_state() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[Step::State("PENDING"), Step::State("FAILED")]);

    let poller = Poller::new(PollPolicy::immediate(10));
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::Failed);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.state.as_deref(), Some("FAILED"));
}

/// When one label serves as both goal and failure state the goal check
/// runs first, so the wait counts as success.
#[tokio::test]
async fn test_goal_check_has_priority_over_failure_check() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[Step::State("PENDING"), Step::State("SUCCEEDED")]);

    let poller = Poller::new(PollPolicy::immediate(5));
    let result = poller
        .wait_for_state("SUCCEEDED", "SUCCEEDED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::ReachedGoal);
    assert_eq!(result.attempts, 2);
}

/// Transient sampling failures are logged and retried; a flaky service
/// that recovers still converges.
#[tokio::test]
async fn test_transient_sample_errors_are_retried() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[
        Step::TransportError,
        Step::State("RUNNING"),
        Step::TransportError,
        Step::State("SUCCEEDED"),
    ]);

    let poller = Poller::new(PollPolicy::immediate(10));
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::ReachedGoal);
    assert_eq!(result.attempts, 4);
}

/// A job that was never created misses on every read; the wait times out
/// with no observed state rather than erroring out.
#[tokio::test]
async fn test_missing_entity_times_out_with_no_state() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[]);

    let poller = Poller::new(PollPolicy::immediate(4));
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert_eq!(result.attempts, 4);
    assert!(result.state.is_none());
}

/// `into_goal` maps the non-goal outcomes onto errors a test can bubble
/// with `?` or assert on.
#[tokio::test]
async fn test_into_goal_surfaces_failure_diagnostics() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[Step::State("FAILED")]);

    let poller = Poller::new(PollPolicy::immediate(5));
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    match result.into_goal() {
        Err(ConvergenceError::Failed { state, attempts }) => {
            assert!(state.contains("FAILED"));
            assert_eq!(attempts, 1);
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

/// Cancellation mid-wait ends the poll promptly with the attempt count
/// and elapsed time it had accumulated.
#[tokio::test]
async fn test_cancellation_aborts_long_wait() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[Step::State("PENDING")]);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = Poller::new(PollPolicy::new(5, Duration::from_secs(30))).with_shutdown(shutdown_rx);

    let start = Instant::now();
    let wait = tokio::spawn(async move {
        poller
            .wait_for_state(JOB_STATE_SUCCEEDED, JOB_STATE_FAILED, move || {
                let service = service.clone();
                async move { service.job_state().await }
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();

    let result = wait.await.unwrap();
    assert_eq!(result.outcome, PollOutcome::Cancelled);
    assert_eq!(result.attempts, 1);
    assert!(start.elapsed() < Duration::from_secs(5));

    match result.into_goal() {
        Err(ConvergenceError::Cancelled { attempts }) => assert_eq!(attempts, 1),
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

/// Any state in the terminal set ends the wait; KILLED is as terminal as
/// SUCCEEDED or FAILED.
#[tokio::test]
async fn test_wait_for_terminal_stops_on_any_listed_state() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[
        Step::State("PENDING"),
        Step::State("RUNNING"),
        Step::State("KILLED"),
    ]);

    let poller = Poller::new(PollPolicy::immediate(10));
    let result = poller
        .wait_for_terminal(&["SUCCEEDED", "FAILED", "KILLED"], || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::ReachedGoal);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.state.as_deref(), Some("KILLED"));
}

/// Bare goal names resolve through the vocabulary to the qualified labels
/// the v1alpha API reports, instead of being prefix-concatenated.
#[tokio::test]
async fn test_vocabulary_resolved_labels_drive_the_wait() {
    let _ = env_logger::try_init();

    let service = ScriptedJobService::new(&[
        Step::State(JOB_STATE_PENDING),
        Step::State(JOB_STATE_SUCCEEDED),
    ]);

    let vocabulary = StateVocabulary::job_states();
    let goal = vocabulary.resolve("SUCCEEDED").unwrap();
    let failure = vocabulary.resolve("FAILED").unwrap();
    assert_eq!(goal, JOB_STATE_SUCCEEDED);
    assert_eq!(failure, JOB_STATE_FAILED);

    let poller = Poller::new(PollPolicy::immediate(5));
    let result = poller
        .wait_for_state(goal, failure, || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::ReachedGoal);
    assert_eq!(result.attempts, 2);
}

/// Harness configuration converts straight into a working policy.
#[tokio::test]
async fn test_config_driven_policy() {
    let _ = env_logger::try_init();

    let config = PollConfig {
        max_retry_attempts: 3,
        sleep_time_sec: 0.0,
        rpc_timeout_sec: 10.0,
    };
    config.validate().unwrap();

    let service = ScriptedJobService::new(&[Step::State("PENDING")]);

    let poller = Poller::new(config.policy());
    let result = poller
        .wait_for_state("SUCCEEDED", "FAILED", || {
            let service = service.clone();
            async move { service.job_state().await }
        })
        .await;

    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert_eq!(result.attempts, 3);
}
