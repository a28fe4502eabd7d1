use crate::error::AppError;
use config::{Config as Cfg, ConfigBuilder, File, builder::DefaultState};
use serde::Deserialize;

/// Settings shared by every service binary: listener port and shutdown grace.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace_seconds() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            shutdown_grace_seconds: default_shutdown_grace_seconds(),
        }
    }
}

impl Config {
    /// Load from an optional `configuration.{toml,yaml,json}` file, then `APP__*` env vars.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let builder = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_builder(Cfg::builder()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.shutdown_grace_seconds, 10);
    }

    #[test]
    fn overrides_are_honoured() {
        let builder = Cfg::builder()
            .set_override("port", 9001)
            .unwrap()
            .set_override("shutdown_grace_seconds", 0)
            .unwrap();
        let config = Config::from_builder(builder).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.shutdown_grace_seconds, 0);
    }
}
