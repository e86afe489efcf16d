use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a stored site-content document.
///
/// Assigned by the store on insert and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Mint a fresh UUIDv7 id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let raw = "0190f5a2-7c3e-7b8a-9d4e-1f2a3b4c5d6e";
        let id: DocumentId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: DocumentId = " 0190f5a2-7c3e-7b8a-9d4e-1f2a3b4c5d6e\n".parse().unwrap();
        assert_eq!(id.to_string(), "0190f5a2-7c3e-7b8a-9d4e-1f2a3b4c5d6e");
    }

    #[test]
    fn rejects_garbage() {
        assert!("footer-1".parse::<DocumentId>().is_err());
    }
}
