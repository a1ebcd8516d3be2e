use anyhow::Result;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::env;

use super::time::{DaySchedule, parse_clock};
use crate::constants::*;
use crate::matching::MatchSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub timezone: Tz,
    pub pairing_expiry: NaiveTime,
    pub history_window_days: i64,
    pub activity_recency_days: i64,
    pub max_failure_streak: i32,
    pub match_run_time: NaiveTime,
    pub flake_sweep_time: NaiveTime,
    pub reminder_time: NaiveTime,
    pub notify_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let timezone_name = env::var("MATCH_TIMEZONE").unwrap_or_else(|_| DEFAULT_MATCH_TIMEZONE.to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow::anyhow!("MATCH_TIMEZONE '{}' is not a valid time zone: {}", timezone_name, e))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_SERVER_PORT),
            timezone,
            pairing_expiry: clock_from_env("PAIRING_EXPIRY_TIME", DEFAULT_PAIRING_EXPIRY_TIME)?,
            history_window_days: number_from_env("HISTORY_WINDOW_DAYS", DEFAULT_HISTORY_WINDOW_DAYS),
            activity_recency_days: number_from_env("ACTIVITY_RECENCY_DAYS", DEFAULT_ACTIVITY_RECENCY_DAYS),
            max_failure_streak: number_from_env("MAX_FAILURE_STREAK", DEFAULT_MAX_FAILURE_STREAK),
            match_run_time: clock_from_env("MATCH_RUN_TIME", DEFAULT_MATCH_RUN_TIME)?,
            flake_sweep_time: clock_from_env("FLAKE_SWEEP_TIME", DEFAULT_FLAKE_SWEEP_TIME)?,
            reminder_time: clock_from_env("REMINDER_TIME", DEFAULT_REMINDER_TIME)?,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|url| !url.trim().is_empty()),
        })
    }

    pub fn schedule(&self) -> DaySchedule {
        DaySchedule::new(self.timezone, self.pairing_expiry)
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            history_window_days: self.history_window_days,
            activity_recency_days: self.activity_recency_days,
            max_failure_streak: self.max_failure_streak,
        }
    }
}

fn clock_from_env(key: &str, default: &str) -> Result<NaiveTime> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_clock(&value).map_err(|e| anyhow::anyhow!("{}: {}", key, e))
}

fn number_from_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
