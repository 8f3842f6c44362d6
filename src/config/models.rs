//! Configuration data structures for mesh-router.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files and
//! include defaults so that a minimal config only names the local service.
use serde::{Deserialize, Serialize};

use crate::core::{
    identity::{LocalIdentity, Location},
    pipeline::DEFAULT_LABEL_HEADER,
    router_chain::RouterFlags,
};

fn default_namespace() -> String {
    "default".to_string()
}

fn default_label_header() -> String {
    DEFAULT_LABEL_HEADER.to_string()
}

/// Enable switch of a single router; a missing `enabled` key means off
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RouterToggle {
    pub enabled: bool,
}

/// Switches for every router in the chain
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RoutersConfig {
    pub metadata: RouterToggle,
    pub nearby: RouterToggle,
    pub rule_based: RouterToggle,
}

impl Default for RoutersConfig {
    fn default() -> Self {
        let flags = RouterFlags::default();
        Self {
            metadata: RouterToggle {
                enabled: flags.metadata,
            },
            nearby: RouterToggle {
                enabled: flags.nearby,
            },
            rule_based: RouterToggle {
                enabled: flags.rule_based,
            },
        }
    }
}

impl From<RoutersConfig> for RouterFlags {
    fn from(config: RoutersConfig) -> Self {
        RouterFlags {
            metadata: config.metadata.enabled,
            nearby: config.nearby.enabled,
            rule_based: config.rule_based.enabled,
        }
    }
}

/// Logging output configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `mesh_router=debug`
    pub level: String,
    /// Emit JSON lines instead of pretty console output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub service: String,
    #[serde(default = "default_label_header")]
    pub label_header: String,
    #[serde(default)]
    pub routers: RoutersConfig,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RouterConfig {
    /// Create a new router configuration builder
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }

    pub fn identity(&self) -> LocalIdentity {
        LocalIdentity::new(self.namespace.clone(), self.service.clone())
    }

    pub fn flags(&self) -> RouterFlags {
        self.routers.into()
    }
}

/// Builder for RouterConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct RouterConfigBuilder {
    namespace: Option<String>,
    service: Option<String>,
    label_header: Option<String>,
    flags: Option<RouterFlags>,
    location: Option<Location>,
    logging: Option<LoggingConfig>,
}

impl RouterConfigBuilder {
    /// Set the local namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the local service name
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the routing-label header name
    pub fn label_header(mut self, header: impl Into<String>) -> Self {
        self.label_header = Some(header.into());
        self
    }

    /// Set all router switches at once
    pub fn flags(mut self, flags: RouterFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Set the caller's location for nearby routing
    pub fn location(mut self, region: impl Into<String>, zone: impl Into<String>) -> Self {
        self.location = Some(Location {
            region: region.into(),
            zone: zone.into(),
        });
        self
    }

    /// Set logging configuration
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the final RouterConfig
    pub fn build(self) -> Result<RouterConfig, String> {
        let service = self
            .service
            .ok_or_else(|| "service is required".to_string())?;

        let flags = self.flags.unwrap_or_default();

        Ok(RouterConfig {
            namespace: self.namespace.unwrap_or_else(default_namespace),
            service,
            label_header: self.label_header.unwrap_or_else(default_label_header),
            routers: RoutersConfig {
                metadata: RouterToggle {
                    enabled: flags.metadata,
                },
                nearby: RouterToggle {
                    enabled: flags.nearby,
                },
                rule_based: RouterToggle {
                    enabled: flags.rule_based,
                },
            },
            location: self.location,
            logging: self.logging.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_service() {
        assert!(RouterConfig::builder().build().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = RouterConfig::builder().service("caller").build().unwrap();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.label_header, "X-Router-Label");
        assert_eq!(config.flags(), RouterFlags::default());
        assert_eq!(config.identity(), LocalIdentity::new("default", "caller"));
        assert!(config.location.is_none());
    }

    #[test]
    fn test_builder_flags_round_trip() {
        let flags = RouterFlags {
            metadata: false,
            nearby: true,
            rule_based: false,
        };
        let config = RouterConfig::builder()
            .service("caller")
            .flags(flags)
            .location("eu", "eu-1")
            .build()
            .unwrap();
        assert_eq!(config.flags(), flags);
        assert_eq!(config.location.unwrap().zone, "eu-1");
    }

    #[test]
    fn test_toggle_without_enabled_key_is_off() {
        let routers: RoutersConfig =
            serde_json::from_str(r#"{ "nearby": {}, "rule_based": {} }"#).unwrap();
        assert!(routers.metadata.enabled);
        assert!(!routers.nearby.enabled);
        assert!(!routers.rule_based.enabled);
    }
}
