//! Tunables for the notify-out core (spec §6).
//!
//! Mirrors `heimdall`'s `DnsConfig`: a plain struct with a `Default` impl,
//! an `from_env` override layer, and a `validate` pass, rather than a
//! config-file parser — the teacher crate does not carry one either.

use crate::error::ConfigError;
use std::time::Duration;

/// Bounded-concurrency and retry tunables governing the notify dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyConfig {
    /// Maximum number of zones notifying concurrently (a "slot" per spec §3).
    pub max_notify_num: usize,

    /// Retries per target before giving up and advancing to the next one.
    pub max_notify_try_num: u8,

    /// Base timeout for an outstanding NOTIFY query; doubles per retry.
    pub notify_timeout: Duration,

    /// Fallback poll interval when no zone has an outstanding query.
    pub idle_sleep_time: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_notify_num: 30,
            max_notify_try_num: 5,
            notify_timeout: Duration::from_secs(3),
            idle_sleep_time: Duration::from_secs(10),
        }
    }
}

impl NotifyConfig {
    /// Override defaults from `NOTIFY_OUT_*` environment variables.
    ///
    /// Returns `Err` if a variable is present but unparsable; absent
    /// variables leave the default untouched.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("NOTIFY_OUT_MAX_NOTIFY_NUM") {
            config.max_notify_num = raw
                .parse()
                .map_err(|_| ConfigError::InvalidMaxNotifyNum(raw))?;
        }

        if let Ok(raw) = std::env::var("NOTIFY_OUT_MAX_NOTIFY_TRY_NUM") {
            config.max_notify_try_num = raw
                .parse()
                .map_err(|_| ConfigError::InvalidMaxNotifyTryNum(raw))?;
        }

        if let Ok(raw) = std::env::var("NOTIFY_OUT_NOTIFY_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidNotifyTimeout(raw.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidNotifyTimeout(
                    "notify timeout must be greater than 0".to_string(),
                ));
            }
            config.notify_timeout = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("NOTIFY_OUT_IDLE_SLEEP_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidIdleSleepTime(raw.clone()))?;
            config.idle_sleep_time = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sanity-check tunables that parsed fine individually but don't make
    /// sense together (e.g. a retry ceiling with no concurrency slots).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_notify_num == 0 {
            return Err(ConfigError::InvalidMaxNotifyNum(
                "max_notify_num must be greater than 0".to_string(),
            ));
        }

        if self.max_notify_num > 10_000 {
            return Err(ConfigError::InvalidMaxNotifyNum(
                "max_notify_num too large (max 10000)".to_string(),
            ));
        }

        if self.notify_timeout.as_secs() == 0 {
            return Err(ConfigError::InvalidNotifyTimeout(
                "notify_timeout must be greater than 0".to_string(),
            ));
        }

        if self.notify_timeout.as_secs() > 300 {
            return Err(ConfigError::InvalidNotifyTimeout(
                "notify_timeout too large (max 300 seconds)".to_string(),
            ));
        }

        // A retry ceiling high enough that doubling the base timeout would
        // overflow is nonsensical long before it overflows in practice;
        // bound it the way the teacher bounds `max_iterations`.
        if self.max_notify_try_num > 16 {
            return Err(ConfigError::InvalidMaxNotifyTryNum(
                "max_notify_try_num too large (max 16)".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NotifyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_notify_num, 30);
        assert_eq!(config.max_notify_try_num, 5);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let config = NotifyConfig {
            max_notify_num: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_timeout() {
        let config = NotifyConfig {
            notify_timeout: Duration::from_secs(400),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
