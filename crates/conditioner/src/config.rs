use serde::{Deserialize, Serialize};

/// Facade-level knobs (§1 ambient config): the monthly inference budget cap
/// passed down to every C1 call, and the upvote thresholds C12 uses to tell
/// `SocialSuccess` from `Rejection` from `Inertia`. Deserializable from TOML
/// so a deployment can override without touching code; `Default` gives sane
/// values so the crate works with zero configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monthly_cap: f64,
    pub audit_success_upvote_threshold: f64,
    pub audit_rejection_upvote_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monthly_cap: 50.0,
            audit_success_upvote_threshold: 0.8,
            audit_rejection_upvote_threshold: 0.3,
        }
    }
}

impl Config {
    /// # Errors
    /// Returns a `toml::de::Error` wrapped as a string if `text` does not
    /// parse, or has a field of the wrong type.
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_a_nonzero_cap() {
        assert!(Config::default().monthly_cap > 0.0);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = Config::from_toml("monthly_cap = 12.5").unwrap();
        assert_eq!(config.monthly_cap, 12.5);
        assert_eq!(config.audit_success_upvote_threshold, Config::default().audit_success_upvote_threshold);
    }
}
