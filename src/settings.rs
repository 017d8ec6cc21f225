use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::controller::ConsoleOptions;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub event_store_url: Url,
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    pub reference_timezone: Tz,
    pub notification_ttl_ms: u64,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_EVENT_STORE_URL, APP_REFERENCE_TIMEZONE, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("event_store_url", "http://localhost:8000/api")?
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("reference_timezone", "UTC")?
            .set_default("notification_ttl_ms", 3000)?
            .set_default("request_timeout_secs", 10)?
            .build()?;

        config.try_deserialize()
    }

    pub fn console_options(&self) -> ConsoleOptions {
        ConsoleOptions {
            timezone: self.reference_timezone,
            notification_ttl: Duration::from_millis(self.notification_ttl_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VARS: &[&str] = &[
        "APP_EVENT_STORE_URL",
        "APP_REFERENCE_TIMEZONE",
        "APP_NOTIFICATION_TTL_MS",
        "APP_PORT",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.reference_timezone, chrono_tz::UTC);
        assert_eq!(settings.notification_ttl_ms, 3000);
        assert_eq!(settings.console_options().notification_ttl, Duration::from_millis(3000));
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    #[serial]
    fn test_overrides_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("APP_EVENT_STORE_URL", "https://events.example.edu/v1");
            std::env::set_var("APP_REFERENCE_TIMEZONE", "Asia/Kolkata");
            std::env::set_var("APP_NOTIFICATION_TTL_MS", "1500");
            std::env::set_var("APP_PORT", "9090");
        }
        let settings = Settings::from_env().unwrap();
        clear_env();

        assert_eq!(settings.event_store_url.as_str(), "https://events.example.edu/v1");
        assert_eq!(settings.reference_timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(settings.notification_ttl_ms, 1500);
        assert_eq!(settings.port, 9090);
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_timezone() {
        clear_env();
        unsafe { std::env::set_var("APP_REFERENCE_TIMEZONE", "Mars/Olympus") };
        let result = Settings::from_env();
        clear_env();
        assert!(result.is_err());
    }
}
