//! Explicit mapping between bare state names and the qualified
//! enumeration labels used on the wire.
//!
//! The legacy API reports job states as bare names (`SUCCEEDED`) while the
//! v1alpha API qualifies them per entity kind (`JOB_STATE_SUCCEEDED`,
//! `WORKFLOW_STATE_SUCCEEDED`). Waits that span both need the translation;
//! it lives here as an explicit table so an unknown name is an error
//! instead of a silently concatenated label.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state name: {0}")]
pub struct UnknownState(pub String);

/// Bare-name to qualified-label table for one entity kind.
#[derive(Debug, Clone)]
pub struct StateVocabulary {
    entries: HashMap<&'static str, &'static str>,
}

const JOB_STATES: &[(&str, &str)] = &[
    ("UNINITIALIZED", "JOB_STATE_UNINITIALIZED"),
    ("INITIALIZED", "JOB_STATE_INITIALIZED"),
    ("PENDING", crate::JOB_STATE_PENDING),
    ("RUNNING", crate::JOB_STATE_RUNNING),
    ("SUCCEEDED", crate::JOB_STATE_SUCCEEDED),
    ("FAILED", crate::JOB_STATE_FAILED),
    ("KILLING", "JOB_STATE_KILLING"),
    ("KILLED", crate::JOB_STATE_KILLED),
    ("DELETED", "JOB_STATE_DELETED"),
];

const WORKFLOW_STATES: &[(&str, &str)] = &[
    ("INITIALIZED", "WORKFLOW_STATE_INITIALIZED"),
    ("ROLLING_FORWARD", "WORKFLOW_STATE_ROLLING_FORWARD"),
    ("ROLLING_BACKWARD", "WORKFLOW_STATE_ROLLING_BACKWARD"),
    ("PAUSED", "WORKFLOW_STATE_PAUSED"),
    ("ROLLED_BACK", "WORKFLOW_STATE_ROLLED_BACK"),
    ("ABORTED", "WORKFLOW_STATE_ABORTED"),
    ("SUCCEEDED", "WORKFLOW_STATE_SUCCEEDED"),
    ("FAILED", "WORKFLOW_STATE_FAILED"),
];

const POD_STATES: &[(&str, &str)] = &[
    ("PENDING", "POD_STATE_PENDING"),
    ("LAUNCHED", "POD_STATE_LAUNCHED"),
    ("STARTING", "POD_STATE_STARTING"),
    ("RUNNING", crate::POD_STATE_RUNNING),
    ("SUCCEEDED", "POD_STATE_SUCCEEDED"),
    ("FAILED", "POD_STATE_FAILED"),
    ("KILLED", "POD_STATE_KILLED"),
];

impl StateVocabulary {
    fn from_table(table: &[(&'static str, &'static str)]) -> Self {
        Self {
            entries: table.iter().copied().collect(),
        }
    }

    pub fn job_states() -> Self {
        Self::from_table(JOB_STATES)
    }

    pub fn workflow_states() -> Self {
        Self::from_table(WORKFLOW_STATES)
    }

    pub fn pod_states() -> Self {
        Self::from_table(POD_STATES)
    }

    /// Translate a bare name to its qualified label.
    pub fn resolve(&self, name: &str) -> Result<&'static str, UnknownState> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| UnknownState(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
