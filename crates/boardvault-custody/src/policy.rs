//! Release policy
//!
//! Fixes the caller rules that are deployment decisions rather than
//! protocol invariants. Unanimity is not configurable.

use serde::{Deserialize, Serialize};

/// Who may execute a fully signed release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseTrigger {
    /// Only the privileged initiator
    #[default]
    Initiator,
    /// Any authenticated caller
    AnyCaller,
}

impl std::str::FromStr for ReleaseTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "initiator" => Ok(ReleaseTrigger::Initiator),
            "any" | "any_caller" => Ok(ReleaseTrigger::AnyCaller),
            other => Err(format!("unknown release trigger: {}", other)),
        }
    }
}

/// Caller rules for the release workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleasePolicy {
    /// Who may call `release_funds` once every member signed
    pub trigger: ReleaseTrigger,
    /// Whether the initiator may abandon an open request
    pub allow_cancel: bool,
}

impl ReleasePolicy {
    pub fn with_trigger(mut self, trigger: ReleaseTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_cancel(mut self, allow_cancel: bool) -> Self {
        self.allow_cancel = allow_cancel;
        self
    }
}
