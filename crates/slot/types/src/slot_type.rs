//! Slot kinds.

use serde::{Deserialize, Serialize};

/// Kind of slot. Requests may restrict placement to one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    #[default]
    Regular,
    Compact,
    Large,
    Handicap,
    Electric,
    Motorcycle,
    Vip,
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Regular => "regular",
            Self::Compact => "compact",
            Self::Large => "large",
            Self::Handicap => "handicap",
            Self::Electric => "electric",
            Self::Motorcycle => "motorcycle",
            Self::Vip => "vip",
        };
        f.write_str(name)
    }
}
