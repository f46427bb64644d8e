//! Rules configuration: tunable knobs for the board rules.
//!
//! Loaded from JSON by the harness; every field has a default matching the
//! printed rulebook, so an empty document `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::constants::damage;
use crate::error::ConfigError;

/// Board rule settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Exploded rooms (fire at max or keg detonated) that sink the ship.
    pub critical_explosion_threshold: u32,
    /// Reject placements where a door faces a neighbour's wall. Turning
    /// this off is a house rule; a placement still needs one connection.
    pub enforce_door_matching: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            critical_explosion_threshold: damage::DEFAULT_CRITICAL_EXPLOSIONS,
            enforce_door_matching: true,
        }
    }
}

impl RulesConfig {
    /// Parse and validate a JSON rules document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RulesConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.critical_explosion_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RulesConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RulesConfig::default());
        assert_eq!(config.critical_explosion_threshold, 4);
        assert!(config.enforce_door_matching);
    }

    #[test]
    fn test_partial_document() {
        let config = RulesConfig::from_json_str(r#"{"critical_explosion_threshold": 6}"#).unwrap();
        assert_eq!(config.critical_explosion_threshold, 6);
        assert!(config.enforce_door_matching);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = RulesConfig::from_json_str(r#"{"critical_explosion_threshold": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroThreshold));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = RulesConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
