//! Appliance operation mode.

use std::fmt;

/// Operation mode reported by the `status` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationMode {
    /// Idle, waiting for a program.
    Waiting,
    /// Cooking.
    Running,
    /// Keeping the food warm after cooking finished.
    AutoKeepWarm,
    /// A delayed start is pending.
    PreCook,
    /// Any value this crate does not know about.
    #[default]
    Unknown,
}

impl OperationMode {
    /// Create from the raw `status` value. Unrecognized values map to `Unknown`.
    pub fn from_raw(value: i64) -> Self {
        match value {
            1 => Self::Waiting,
            2 => Self::Running,
            3 => Self::AutoKeepWarm,
            4 => Self::PreCook,
            _ => Self::Unknown,
        }
    }

    /// Raw `status` value, if the mode is known.
    pub fn to_raw(&self) -> Option<i64> {
        match self {
            Self::Waiting => Some(1),
            Self::Running => Some(2),
            Self::AutoKeepWarm => Some(3),
            Self::PreCook => Some(4),
            Self::Unknown => None,
        }
    }

    /// Check if the appliance is idle and can accept a program.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Check if the appliance is keeping food warm.
    pub fn is_keeping_warm(&self) -> bool {
        matches!(self, Self::AutoKeepWarm)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Running => write!(f, "Running"),
            Self::AutoKeepWarm => write!(f, "AutoKeepWarm"),
            Self::PreCook => write!(f, "PreCook"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
