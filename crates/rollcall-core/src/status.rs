//! Record lifecycle statuses.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// Lifecycle status of a member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Known to at least one system, not yet confirmed everywhere.
    #[default]
    Pending,
    /// Fully registered.
    Active,
    /// Suspended; retained but excluded from fan-out.
    Suspended,
}

impl MemberStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::Active => "active",
            MemberStatus::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MemberStatus::Pending),
            "active" => Ok(MemberStatus::Active),
            "suspended" => Ok(MemberStatus::Suspended),
            _ => Err(CoreError::invalid(
                "member_status",
                format!("unknown member status: {s}"),
            )),
        }
    }
}

/// Lifecycle status of a group record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Created but not yet opened to members.
    #[default]
    Pending,
    /// Open.
    Active,
    /// Closed; retained for history.
    Closed,
}

impl GroupStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Pending => "pending",
            GroupStatus::Active => "active",
            GroupStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(GroupStatus::Pending),
            "active" => Ok(GroupStatus::Active),
            "closed" => Ok(GroupStatus::Closed),
            _ => Err(CoreError::invalid(
                "group_status",
                format!("unknown group status: {s}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_status_roundtrip() {
        for status in [
            MemberStatus::Pending,
            MemberStatus::Active,
            MemberStatus::Suspended,
        ] {
            let s = status.as_str();
            let parsed: MemberStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_group_status_roundtrip() {
        for status in [GroupStatus::Pending, GroupStatus::Active, GroupStatus::Closed] {
            let s = status.as_str();
            let parsed: GroupStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(MemberStatus::default(), MemberStatus::Pending);
        assert_eq!(GroupStatus::default(), GroupStatus::Pending);
    }

    #[test]
    fn test_unknown_status() {
        assert!("archived".parse::<MemberStatus>().is_err());
        assert!("archived".parse::<GroupStatus>().is_err());
    }
}
