use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;

use crate::payments::currency;

const KNOWN_GATEWAYS: [&str; 3] = ["paypal", "redsys", "redsys-sha1"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub gateways: GatewaysConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaysConfig {
    /// Gateways this deployment accepts notifications from
    pub enabled: Vec<String>,
    /// Currency used when a request does not state one
    pub default_currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .context("PORT not set")?
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        let enabled_str =
            env::var("GATEWAYS_ENABLED").context("GATEWAYS_ENABLED not set")?;
        let enabled: Vec<String> = enabled_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let gateways = GatewaysConfig {
            enabled,
            default_currency: env::var("DEFAULT_CURRENCY")
                .unwrap_or_else(|_| "EUR".to_string()),
        };

        let config = Config { server, gateways };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate port range
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if self.gateways.enabled.is_empty() {
            return Err(anyhow!(
                "GATEWAYS_ENABLED must contain at least one gateway"
            ));
        }

        for gateway in &self.gateways.enabled {
            if !KNOWN_GATEWAYS.contains(&gateway.as_str()) {
                return Err(anyhow!(
                    "Unknown gateway '{}', expected one of: {:?}",
                    gateway,
                    KNOWN_GATEWAYS
                ));
            }
        }

        currency::numeric_for(&self.gateways.default_currency)
            .map_err(|e| anyhow!("DEFAULT_CURRENCY is not supported: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                environment: "development".to_string(),
            },
            gateways: GatewaysConfig {
                enabled: vec!["paypal".to_string(), "redsys".to_string()],
                default_currency: "EUR".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_unknown_gateway_rejected() {
        let mut config = test_config();
        config.gateways.enabled.push("stripe".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_default_currency_rejected() {
        let mut config = test_config();
        config.gateways.default_currency = "XYZ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_privileged_port_rejected() {
        let mut config = test_config();
        config.server.port = 80;
        assert!(config.validate().is_err());
    }
}
