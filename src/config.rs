// Runtime configuration read from the environment (a `.env` file is loaded
// first by main). Anything required that is missing stops the bot at startup.

use crate::core::publishing::{SchedulerConfig, DEFAULT_BATCH_LIMIT};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),

    #[error("{key} has an invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
}

pub struct Settings {
    pub discord_token: String,
    pub database_url: String,
    /// Channel the publisher and `/publish` post into.
    pub publish_channel: Option<u64>,
    /// Zero disables the scheduled publisher.
    pub poll_interval: Duration,
    pub batch_limit: u32,
    pub moderator_ids: Vec<u64>,
    pub publish_cooldown: Duration,
    pub publish_max_cooldown: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_token = read("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let database_url = read("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let publish_channel = match read("CHANNEL_ID") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(id) if id != 0 => Some(id),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "CHANNEL_ID",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        let poll_interval_secs = parse_or("POLL_INTERVAL", read("POLL_INTERVAL"), 0i64)?.max(0);
        let batch_limit = parse_or("BATCH_LIMIT", read("BATCH_LIMIT"), DEFAULT_BATCH_LIMIT as i64)?
            .clamp(1, u32::MAX as i64) as u32;
        let cooldown_secs = parse_or("PUBLISH_COOLDOWN", read("PUBLISH_COOLDOWN"), 5u64)?;
        // A zero cooldown would turn a persistent failure into a busy loop.
        if cooldown_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "PUBLISH_COOLDOWN",
                value: cooldown_secs.to_string(),
            });
        }
        let max_cooldown_secs =
            parse_or("PUBLISH_MAX_COOLDOWN", read("PUBLISH_MAX_COOLDOWN"), 60u64)?;

        // Entries that aren't plain ids are ignored rather than fatal.
        let moderator_ids = read("ADMINS")
            .map(|raw| {
                raw.split(',')
                    .filter_map(|item| item.trim().parse::<u64>().ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            discord_token,
            database_url,
            publish_channel,
            poll_interval: Duration::from_secs(poll_interval_secs as u64),
            batch_limit,
            moderator_ids,
            publish_cooldown: Duration::from_secs(cooldown_secs),
            publish_max_cooldown: Duration::from_secs(max_cooldown_secs),
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.poll_interval,
            batch_limit: self.batch_limit,
            destination: self.publish_channel,
            cooldown: self.publish_cooldown,
            max_cooldown: self.publish_max_cooldown,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
