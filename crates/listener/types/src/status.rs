//! Lifecycle status of a recorded log event.

use core::str::FromStr;
use thiserror::Error;

/// The status of a [`LogEvent`](crate::LogEvent).
///
/// Logs are created as [`Pending`](Self::Pending) by discovery. Reconciliation only ever moves a
/// pending log to [`Inactive`](Self::Inactive) or [`Dropped`](Self::Dropped); the remaining
/// transitions belong to the confirmation process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogEventStatus {
    /// Observed in a block that is not yet deep enough to be irreversible.
    Pending,
    /// Deep enough in the chain to be considered irreversible.
    Confirmed,
    /// The producing transaction reappeared in a new block and the log must be re-derived.
    Inactive,
    /// The producing transaction can never be included: its nonce was reused.
    Dropped,
    /// The producing transaction was reverted.
    Reverted,
}

impl LogEventStatus {
    /// Returns the canonical upper-case name of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Inactive => "INACTIVE",
            Self::Dropped => "DROPPED",
            Self::Reverted => "REVERTED",
        }
    }

    /// Returns `true` for [`Pending`](Self::Pending).
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` if a log in this status must be hidden from read views.
    pub const fn is_hidden(&self) -> bool {
        matches!(self, Self::Inactive | Self::Dropped)
    }
}

impl core::fmt::Display for LogEventStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`LogEventStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log event status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for LogEventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "INACTIVE" => Ok(Self::Inactive),
            "DROPPED" => Ok(Self::Dropped),
            "REVERTED" => Ok(Self::Reverted),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}
