//! Process settings from environment variables (after `.env` is loaded).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SCHEMA: &str = "camp";
pub const DEFAULT_PAYMENT_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    /// When unset, storage is in memory (development only).
    pub database_url: Option<String>,
    pub bind_addr: String,
    /// Schema holding system tables. Must be a valid PostgreSQL identifier.
    pub schema: String,
    pub catalog_path: Option<PathBuf>,
    pub site_config_path: Option<PathBuf>,
    /// Public API base URL handed to clients; empty means same origin.
    pub api_base_url: Option<String>,
    pub payment_publishable_key: Option<String>,
    pub payment_secret_key: Option<String>,
    pub payment_api_base: String,
    pub session_ttl_hours: i64,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            schema: DEFAULT_SCHEMA.into(),
            catalog_path: None,
            site_config_path: None,
            api_base_url: None,
            payment_publishable_key: None,
            payment_secret_key: None,
            payment_api_base: DEFAULT_PAYMENT_API_BASE.into(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let schema = get("CAMP_SCHEMA").unwrap_or(defaults.schema);
        if !is_identifier(&schema) {
            return Err(ConfigError::Load(format!("CAMP_SCHEMA is not a valid identifier: {}", schema)));
        }
        let session_ttl_hours = match get("SESSION_TTL_HOURS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| ConfigError::Load(format!("SESSION_TTL_HOURS must be a positive integer, got {}", v)))?,
            None => defaults.session_ttl_hours,
        };
        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Load(format!("MAX_BODY_BYTES must be a positive integer, got {}", v)))?,
            None => defaults.max_body_bytes,
        };

        Ok(Settings {
            database_url: get("DATABASE_URL"),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            schema,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            site_config_path: get("SITE_CONFIG_PATH").map(PathBuf::from),
            api_base_url: get("API_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            payment_publishable_key: get("PAYMENT_PUBLISHABLE_KEY"),
            payment_secret_key: get("PAYMENT_SECRET_KEY"),
            payment_api_base: get("PAYMENT_API_BASE")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.payment_api_base),
            session_ttl_hours,
            max_body_bytes,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(s.schema, "camp");
        assert!(s.database_url.is_none());
        assert_eq!(s.session_ttl_hours, 168);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let s = settings(&[("DATABASE_URL", "  "), ("API_BASE_URL", "https://camp.example/")]).unwrap();
        assert!(s.database_url.is_none());
        assert_eq!(s.api_base_url.as_deref(), Some("https://camp.example"));
    }

    #[test]
    fn rejects_bad_schema_and_ttl() {
        assert!(settings(&[("CAMP_SCHEMA", "drop table;")]).is_err());
        assert!(settings(&[("SESSION_TTL_HOURS", "-3")]).is_err());
    }
}
