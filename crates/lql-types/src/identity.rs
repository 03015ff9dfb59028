use std::fmt;

use serde::{Deserialize, Serialize};

/// A named participant of a record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Party(String);

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Party({})", self.0)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a logical entity across all of its record versions.
///
/// The UUID is time-ordered (v7). An optional external identifier lets
/// application code correlate the entity with an outside system.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinearId {
    pub id: uuid::Uuid,
    pub external_id: Option<String>,
}

impl LinearId {
    /// Generate a new time-ordered identifier.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            external_id: None,
        }
    }

    /// Generate a new identifier carrying an external id.
    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            external_id: Some(external_id.into()),
        }
    }

    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self {
            id,
            external_id: None,
        }
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

impl Default for LinearId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LinearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.external_id {
            Some(external) => write!(f, "LinearId({}, {external})", self.short_id()),
            None => write!(f, "LinearId({})", self.short_id()),
        }
    }
}

impl fmt::Display for LinearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.external_id {
            Some(external) => write!(f, "{external}_{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ids_are_unique() {
        assert_ne!(LinearId::new(), LinearId::new());
    }

    #[test]
    fn display_includes_external_id() {
        let id = LinearId::with_external_id("invoice-42");
        assert!(id.to_string().starts_with("invoice-42_"));
        assert!(!LinearId::new().to_string().contains('_'));
    }

    #[test]
    fn party_serializes_as_plain_name() {
        let party = Party::new("alice");
        assert_eq!(serde_json::to_string(&party).unwrap(), "\"alice\"");
    }
}
