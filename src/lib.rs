//! # Goalstate
//!
//! Goal-state convergence polling for integration tests against a remote
//! job-orchestration service.
//!
//! A [`Poller`] repeatedly samples remote state through an injected
//! closure, on a fixed interval and a bounded attempt budget, and
//! classifies the outcome: the goal state was reached, a designated
//! failure state was observed, the budget ran out, or the wait was
//! cancelled. Variants wait on an arbitrary condition over a fetched
//! object or on all sub-units of a collection reaching a target state;
//! all share one retry/timeout engine and one transient-error policy.

pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod poller;
pub mod state;

// Re-export main public API
pub use config::{load_config, PollConfig};
pub use engine::{PollOutcome, PollResult};
pub use error::{ConvergenceError, SampleError};
pub use policy::PollPolicy;
pub use poller::Poller;
pub use state::{StateVocabulary, UnknownState};

// Well-known qualified state labels
pub const JOB_STATE_PENDING: &str = "JOB_STATE_PENDING";
pub const JOB_STATE_RUNNING: &str = "JOB_STATE_RUNNING";
pub const JOB_STATE_SUCCEEDED: &str = "JOB_STATE_SUCCEEDED";
pub const JOB_STATE_FAILED: &str = "JOB_STATE_FAILED";
pub const JOB_STATE_KILLED: &str = "JOB_STATE_KILLED";
pub const POD_STATE_RUNNING: &str = "POD_STATE_RUNNING";

// Re-export the version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
