//! Service configuration (env-driven).

use std::net::SocketAddr;

use anyhow::{Context, Result};
use fanout_events::DiscriminantField;

use crate::routing::RoutingConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address.
    pub listen_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Routing rules and buffer sizes.
    pub routing: RoutingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let listen_addr = lookup("FANOUT_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse::<SocketAddr>()
            .context("FANOUT_LISTEN_ADDR must be a socket address (host:port).")?;

        let log_level = lookup("FANOUT_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let field = lookup("FANOUT_DISCRIMINANT")
            .map(|v| v.parse::<DiscriminantField>())
            .transpose()
            .context("FANOUT_DISCRIMINANT must be `app` or `type`.")?
            .unwrap_or_default();

        let mut routing = RoutingConfig::for_field(field);

        if let Some(raw) = lookup("FANOUT_KNOWN_VALUES") {
            routing.known_values = parse_known_values(&raw);
        }

        if let Some(name) = lookup("FANOUT_UNMATCHED_CHANNEL") {
            routing.unmatched_channel = name.trim().to_string();
        }

        if let Some(prefix) = lookup("FANOUT_KEY_PREFIX") {
            routing.key_prefix = prefix;
        }

        if let Some(capacity) = lookup("FANOUT_STREAM_CAPACITY")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("FANOUT_STREAM_CAPACITY must be an integer.")?
        {
            routing.stream_capacity = capacity;
        }

        if let Some(capacity) = lookup("FANOUT_CHANNEL_CAPACITY")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("FANOUT_CHANNEL_CAPACITY must be an integer.")?
        {
            routing.channel_capacity = capacity;
        }

        routing
            .validate()
            .context("Invalid routing configuration.")?;

        Ok(Self {
            listen_addr,
            log_level,
            routing,
        })
    }
}

/// Split a comma-separated allow-list, trimming entries and skipping empty ones.
pub fn parse_known_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.routing, RoutingConfig::default());
    }

    #[test]
    fn test_type_variant_defaults() {
        let config = load(&[("FANOUT_DISCRIMINANT", "type")]).unwrap();
        assert_eq!(config.routing.field, DiscriminantField::Type);
        assert_eq!(config.routing.known_values, vec!["type1", "type2", "type3"]);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("FANOUT_LISTEN_ADDR", "0.0.0.0:9000"),
            ("FANOUT_KNOWN_VALUES", "billing, audit ,,search"),
            ("FANOUT_UNMATCHED_CHANNEL", "dead_letters"),
            ("FANOUT_KEY_PREFIX", "n-"),
            ("FANOUT_STREAM_CAPACITY", "8"),
            ("FANOUT_CHANNEL_CAPACITY", "2"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.routing.known_values, vec!["billing", "audit", "search"]);
        assert_eq!(config.routing.unmatched_channel, "dead_letters");
        assert_eq!(config.routing.key_prefix, "n-");
        assert_eq!(config.routing.stream_capacity, 8);
        assert_eq!(config.routing.channel_capacity, 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("FANOUT_LISTEN_ADDR", "nope")]).is_err());
        assert!(load(&[("FANOUT_DISCRIMINANT", "tenant")]).is_err());
        assert!(load(&[("FANOUT_STREAM_CAPACITY", "-1")]).is_err());
        assert!(load(&[("FANOUT_CHANNEL_CAPACITY", "0")]).is_err());
        assert!(load(&[("FANOUT_KNOWN_VALUES", "a,b,a")]).is_err());
        assert!(load(&[("FANOUT_KNOWN_VALUES", " , ")]).is_err());
    }
}
