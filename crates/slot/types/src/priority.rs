//! Request priority levels.

use serde::{Deserialize, Serialize};

/// Priority of a request. Higher levels are served first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Vip = 4,
    Emergency = 5,
}

impl RequestPriority {
    /// Numeric level (1 = lowest, 5 = highest)
    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Normal),
            3 => Some(Self::High),
            4 => Some(Self::Vip),
            5 => Some(Self::Emergency),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Vip => "vip",
            Self::Emergency => "emergency",
        };
        f.write_str(name)
    }
}
