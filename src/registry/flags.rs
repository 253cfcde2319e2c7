//! Service flag records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Availability of one feature: 1 = enabled, 0 = disabled.
///
/// Serialized as the number `0` or `1`. Reads also accept `"0"`/`"1"`
/// because hand-seeded registry documents sometimes store strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStatus", into = "u8")]
pub enum FlagStatus {
    Off,
    On,
}

impl FlagStatus {
    pub fn is_on(self) -> bool {
        self == FlagStatus::On
    }

    pub fn label(self) -> &'static str {
        match self {
            FlagStatus::On => "ACTIVE",
            FlagStatus::Off => "INACTIVE",
        }
    }
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlagStatus::On => "ON",
            FlagStatus::Off => "OFF",
        })
    }
}

impl From<bool> for FlagStatus {
    fn from(on: bool) -> Self {
        if on { FlagStatus::On } else { FlagStatus::Off }
    }
}

impl From<FlagStatus> for u8 {
    fn from(status: FlagStatus) -> Self {
        match status {
            FlagStatus::Off => 0,
            FlagStatus::On => 1,
        }
    }
}

impl TryFrom<u8> for FlagStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlagStatus::Off),
            1 => Ok(FlagStatus::On),
            other => Err(format!("flag status must be 0 or 1, got {other}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Number(u64),
    Text(String),
}

impl TryFrom<RawStatus> for FlagStatus {
    type Error = String;

    fn try_from(raw: RawStatus) -> Result<Self, Self::Error> {
        let value = match raw {
            RawStatus::Number(n) => n,
            RawStatus::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("flag status must be 0 or 1, got {s:?}"))?,
        };
        u8::try_from(value)
            .map_err(|_| format!("flag status must be 0 or 1, got {value}"))
            .and_then(FlagStatus::try_from)
    }
}

/// Persisted flag document in the registry database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFlag {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(rename = "service_name")]
    pub name: String,

    pub status: FlagStatus,
}

impl ServiceFlag {
    pub fn new(name: impl Into<String>, status: FlagStatus) -> Self {
        Self { id: None, rev: None, name: name.into(), status }
    }
}

/// Wire snapshot of every flag: `{ "<service name>": 0 | 1 }`.
pub type FlagSnapshot = BTreeMap<String, FlagStatus>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_accepts_numbers_and_numeric_strings() {
        let flag: ServiceFlag = serde_json::from_value(json!({
            "_id": "a1", "_rev": "3-x", "service_name": "User Library", "status": "0"
        }))
        .unwrap();
        assert_eq!(flag.status, FlagStatus::Off);

        let flag: ServiceFlag =
            serde_json::from_value(json!({ "service_name": "Analytics & Visualization", "status": 1 })).unwrap();
        assert_eq!(flag.status, FlagStatus::On);
        assert!(flag.id.is_none());
    }

    #[test]
    fn test_status_rejects_other_values() {
        assert!(serde_json::from_value::<FlagStatus>(json!(2)).is_err());
        assert!(serde_json::from_value::<FlagStatus>(json!("online")).is_err());
    }

    #[test]
    fn test_snapshot_wire_format() {
        let mut snapshot = FlagSnapshot::new();
        snapshot.insert("User Library".into(), FlagStatus::On);
        snapshot.insert("Analytics & Visualization".into(), FlagStatus::Off);
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({ "Analytics & Visualization": 0, "User Library": 1 })
        );
    }
}
