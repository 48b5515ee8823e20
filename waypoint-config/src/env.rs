// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Prefix used when none is given
pub const DEFAULT_PREFIX: &str = "WAYPOINT";

/// Reads variables under a prefix. `WAYPOINT_LOG_LEVEL` is exposed as
/// `log_level`.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Load every variable of the process environment under the prefix
    pub fn load(&self) -> HashMap<String, String> {
        self.from_vars(env::vars())
    }

    /// Keep the pairs under the prefix, with the prefix stripped and the
    /// remainder lowercased.
    pub fn from_vars<I, K, V>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let rest = key.as_ref().strip_prefix(self.prefix.as_str())?;
                let rest = rest.strip_prefix('_')?;
                (!rest.is_empty()).then(|| (rest.to_lowercase(), value.into()))
            })
            .collect()
    }

    /// Load a specific variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = format!("{}_{}", self.prefix, key.to_uppercase());
        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe, so these tests feed pairs directly.

    #[test]
    fn test_prefix_is_stripped() {
        let loader = EnvLoader::default();
        let vars = loader.from_vars([
            ("WAYPOINT_LOG_LEVEL", "debug"),
            ("WAYPOINT_ROUTER_PREFER_EXACT_MATCH", "off"),
            ("WAYPOINTX_IGNORED", "1"),
            ("WAYPOINT_", "1"),
            ("PATH", "/bin"),
        ]);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["log_level"], "debug");
        assert_eq!(vars["router_prefer_exact_match"], "off");
    }

    #[test]
    fn test_custom_prefix() {
        let loader = EnvLoader::new("MY_APP");
        let vars = loader.from_vars([("MY_APP_LOG_FORMAT", "pretty"), ("WAYPOINT_LOG_FORMAT", "json")]);
        assert_eq!(vars.get("log_format").map(String::as_str), Some("pretty"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_missing_var() {
        let loader = EnvLoader::new("WAYPOINT_TEST");
        assert!(matches!(
            loader.load_var("MISSING_VAR_67890"),
            Err(ConfigError::EnvError(_))
        ));
        assert_eq!(loader.load_var_or("MISSING_VAR_67890", "fallback"), "fallback");
    }
}
