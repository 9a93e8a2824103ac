//! Discriminant field selection and default allow-lists.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EventError;

// =============================================================================
// Default Known Values
// =============================================================================

/// Default allow-list when routing by application name.
pub const DEFAULT_KNOWN_APPS: [&str; 3] = ["app1", "app2", "app3"];

/// Default allow-list when routing by event type.
pub const DEFAULT_KNOWN_TYPES: [&str; 3] = ["type1", "type2", "type3"];

// =============================================================================
// Discriminant Field
// =============================================================================

/// Which event field a deployment routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminantField {
    /// Route on the `app` field (application name).
    #[default]
    App,
    /// Route on the `type` field (event-type tag).
    Type,
}

impl DiscriminantField {
    /// JSON field name of the discriminant.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscriminantField::App => "app",
            DiscriminantField::Type => "type",
        }
    }

    /// The allow-list used when none is configured.
    pub fn default_known_values(&self) -> Vec<String> {
        let values: &[&str] = match self {
            DiscriminantField::App => &DEFAULT_KNOWN_APPS,
            DiscriminantField::Type => &DEFAULT_KNOWN_TYPES,
        };
        values.iter().map(|v| v.to_string()).collect()
    }
}

impl std::fmt::Display for DiscriminantField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DiscriminantField {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "app" => Ok(DiscriminantField::App),
            "type" | "event_type" => Ok(DiscriminantField::Type),
            other => Err(EventError::UnknownDiscriminantField(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminant_field_serialization() {
        assert_eq!(
            serde_json::to_string(&DiscriminantField::App).unwrap(),
            "\"app\""
        );
        assert_eq!(
            serde_json::to_string(&DiscriminantField::Type).unwrap(),
            "\"type\""
        );
    }

    #[test]
    fn test_discriminant_field_parse() {
        assert_eq!(
            "app".parse::<DiscriminantField>().unwrap(),
            DiscriminantField::App
        );
        assert_eq!(
            " TYPE ".parse::<DiscriminantField>().unwrap(),
            DiscriminantField::Type
        );
        assert_eq!(
            "event_type".parse::<DiscriminantField>().unwrap(),
            DiscriminantField::Type
        );
        assert!(matches!(
            "tenant".parse::<DiscriminantField>(),
            Err(EventError::UnknownDiscriminantField(_))
        ));
    }

    #[test]
    fn test_default_known_values() {
        assert_eq!(
            DiscriminantField::App.default_known_values(),
            vec!["app1", "app2", "app3"]
        );
        assert_eq!(DiscriminantField::Type.default_known_values().len(), 3);
    }
}
