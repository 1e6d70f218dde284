// ── Device identity ──
//
// Opaque, stable identifier assigned by the upstream platform. The only
// invariant enforced locally is non-emptiness.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identifier of one device, stable across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create an id, rejecting empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::config("device id must not be empty"));
        }
        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DeviceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DeviceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Parse a batch of raw ids, failing on the first invalid one.
pub fn parse_ids<I, S>(raw: I) -> Result<Vec<DeviceId>, CoreError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    raw.into_iter().map(DeviceId::new).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_id() {
        assert!(DeviceId::new("").is_err());
        assert!(DeviceId::new("   ").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = DeviceId::new("  d1 ").unwrap();
        assert_eq!(id.as_str(), "d1");
    }

    #[test]
    fn deserialize_rejects_empty() {
        let result: Result<DeviceId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: DeviceId = "a1b2".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a1b2\"");
    }

    #[test]
    fn parse_ids_stops_on_invalid() {
        assert_eq!(parse_ids(["a", "b"]).unwrap().len(), 2);
        assert!(parse_ids(["a", ""]).is_err());
    }
}
