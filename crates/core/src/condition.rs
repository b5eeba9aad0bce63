use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse lifecycle phase for a `ModelRegistration`, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "PascalCase")]
pub enum Phase {
    Pending,
    Ready,
    Failed,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Ready => write!(f, "Ready"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Typed `reason` values a reconciler attaches to its `Ready` condition.
///
/// Per spec.md §4.2: `reason=Unsupported` for unimplemented backend kinds,
/// `reason=ReconcileFailed` for transient errors, `reason=Succeeded` on
/// success. `Validation` is an ambient addition for malformed CRs (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Reason {
    Succeeded,
    ReconcileFailed,
    Unsupported,
    Validation,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "Succeeded"),
            Self::ReconcileFailed => write!(f, "ReconcileFailed"),
            Self::Unsupported => write!(f, "Unsupported"),
            Self::Validation => write!(f, "Validation"),
        }
    }
}

/// Standard Kubernetes-style condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// A single status condition, following the conventional
/// `{type, status, reason, message, last_transition_time}` shape used
/// throughout the Kubernetes ecosystem so existing tooling (kubectl
/// describe, status printers) renders it without special-casing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Condition {
    /// Condition type, e.g. `"Ready"`.
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: Reason,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
    /// Generation this condition was computed against, so readers can tell
    /// a stale condition from a fresh one without re-running reconcile.
    pub observed_generation: Option<i64>,
}

impl Condition {
    #[must_use]
    pub fn ready(
        status: ConditionStatus,
        reason: Reason,
        message: impl Into<String>,
        observed_generation: Option<i64>,
    ) -> Self {
        Self {
            type_: "Ready".to_owned(),
            status,
            reason,
            message: message.into(),
            last_transition_time: Utc::now(),
            observed_generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Pending.to_string(), "Pending");
        assert_eq!(Phase::Ready.to_string(), "Ready");
        assert_eq!(Phase::Failed.to_string(), "Failed");
    }

    #[test]
    fn phase_default_is_pending() {
        assert_eq!(Phase::default(), Phase::Pending);
    }

    #[test]
    fn condition_ready_builder() {
        let cond = Condition::ready(ConditionStatus::True, Reason::Succeeded, "ok", Some(3));
        assert_eq!(cond.type_, "Ready");
        assert_eq!(cond.observed_generation, Some(3));
    }
}
