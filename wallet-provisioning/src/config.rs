use crate::{
    errors::config_error::ConfigError,
    flow::simulated::SimulatedFlowConfig,
    models::options::DEFAULT_BACKEND_TIMEOUT_MS,
};
use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct Config {
    pub http_bind: String,
    pub allowed_origin: Option<String>,
    pub session_ttl: Option<Duration>,
    pub watchdog_interval: Duration,
    pub default_backend_timeout: Duration,
    pub event_channel_capacity: usize,
    pub simulated_flow: SimulatedFlowConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let session_ttl_secs: u64 = parse_var(&lookup, "SESSION_TTL_SECS", 300)?;
        let watchdog_interval_secs: u64 = parse_var(&lookup, "WATCHDOG_INTERVAL_SECS", 15)?;
        if watchdog_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "WATCHDOG_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let event_channel_capacity: usize = parse_var(&lookup, "EVENT_CHANNEL_CAPACITY", 64)?;
        if event_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EVENT_CHANNEL_CAPACITY",
                value: "0".to_string(),
            });
        }

        let default_backend_timeout_ms: u64 =
            parse_var(&lookup, "DEFAULT_BACKEND_TIMEOUT_MS", DEFAULT_BACKEND_TIMEOUT_MS)?;
        if default_backend_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DEFAULT_BACKEND_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }

        let defaults = SimulatedFlowConfig::default();

        Ok(Config {
            http_bind: lookup("HTTP_BIND").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            allowed_origin: lookup("ALLOWED_ORIGIN").filter(|origin| !origin.trim().is_empty()),
            session_ttl: (session_ttl_secs > 0).then(|| Duration::from_secs(session_ttl_secs)),
            watchdog_interval: Duration::from_secs(watchdog_interval_secs),
            default_backend_timeout: Duration::from_millis(default_backend_timeout_ms),
            event_channel_capacity,
            simulated_flow: SimulatedFlowConfig {
                can_add: parse_var(&lookup, "SIMULATED_CAN_ADD", defaults.can_add)?,
                platform_version: lookup("SIMULATED_PLATFORM_VERSION")
                    .unwrap_or(defaults.platform_version),
                model: lookup("SIMULATED_DEVICE_MODEL").unwrap_or(defaults.model),
                completion_timeout: Duration::from_secs(parse_var(
                    &lookup,
                    "SIMULATED_COMPLETION_TIMEOUT_SECS",
                    defaults.completion_timeout.as_secs(),
                )?),
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .or(Err(ConfigError::InvalidValue { name, value })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]).unwrap();

        assert_eq!(config.http_bind, "0.0.0.0:3000");
        assert_eq!(config.session_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.default_backend_timeout, Duration::from_millis(25_000));
        assert_eq!(config.event_channel_capacity, 64);
        assert!(config.simulated_flow.can_add);
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn zero_ttl_disables_the_watchdog() {
        let config = config(&[("SESSION_TTL_SECS", "0"), ("SIMULATED_CAN_ADD", "false")]).unwrap();

        assert!(config.session_ttl.is_none());
        assert!(!config.simulated_flow.can_add);
    }

    #[test]
    fn rejects_unparsable_values() {
        assert_eq!(
            config(&[("DEFAULT_BACKEND_TIMEOUT_MS", "soon")]).unwrap_err(),
            ConfigError::InvalidValue {
                name: "DEFAULT_BACKEND_TIMEOUT_MS",
                value: "soon".to_string()
            }
        );
        assert!(config(&[("WATCHDOG_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn rejects_a_zero_backend_timeout() {
        assert_eq!(
            config(&[("DEFAULT_BACKEND_TIMEOUT_MS", "0")]).unwrap_err(),
            ConfigError::InvalidValue {
                name: "DEFAULT_BACKEND_TIMEOUT_MS",
                value: "0".to_string()
            }
        );
        assert_eq!(
            config(&[("DEFAULT_BACKEND_TIMEOUT_MS", "1")])
                .unwrap()
                .default_backend_timeout,
            Duration::from_millis(1)
        );
    }
}
