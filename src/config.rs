//! Configuration loading.
//!
//! Configuration is a TOML file. Before it is deserialized, every string
//! value has `${NAME}` references replaced by the environment variable
//! `NAME` (or by `NAME` itself when the variable is unset), so secrets can
//! stay out of the file:
//!
//! ```toml
//! poll_interval = 60
//!
//! [cooker]
//! name = "Rice cooker"
//! ip = "192.168.1.50"
//! token = "${COOKER_TOKEN}"
//! auto_keep_warm = true
//!
//! [cooker.unplugged_check]
//! enabled = true
//! max_duration = 120
//! max_reminder_count = 3
//! auto_stop = false
//!
//! [[cooker.meals]]
//! profile = "FineRice"
//! earliest = "07:00"
//! usual = "07:30"
//! latest = "08:00"
//!
//! [push]
//! token = "${BARK_TOKEN}"
//! ```

use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::notify::BarkNotifier;
use crate::protocol::ProfileType;

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Create from hour and minute; `None` if out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Hour of day (0-23).
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Minute of hour (0-59).
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// This time of day on the same calendar day as `now`.
    pub fn on_day_of(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.date().and_time(self.0)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map(Self)
            .map_err(|e| format!("invalid time of day {value:?} (expected HH:MM): {e}"))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// One meal occasion: when it may be served, when it usually is, and what to cook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MealWindow {
    /// Profile to cook.
    pub profile: ProfileType,
    /// Earliest acceptable time.
    pub earliest: TimeOfDay,
    /// Usual mealtime; delayed starts aim to finish here.
    pub usual: TimeOfDay,
    /// Latest acceptable time.
    pub latest: TimeOfDay,
}

impl MealWindow {
    /// Whether `now` lies strictly inside today's window.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.earliest.on_day_of(now) < now && now < self.latest.on_day_of(now)
    }

    /// Whether today's window has not opened yet.
    pub fn is_ahead_of(&self, now: NaiveDateTime) -> bool {
        now < self.earliest.on_day_of(now)
    }

    /// Whole minutes from `now` until today's usual time.
    pub fn minutes_until_usual(&self, now: NaiveDateTime) -> i64 {
        (self.usual.on_day_of(now) - now).num_minutes()
    }

    fn validate(&self) -> Result<()> {
        if self.earliest >= self.latest {
            return Err(Error::UnsupportedMealWindow {
                earliest: self.earliest.to_string(),
                usual: self.usual.to_string(),
                latest: self.latest.to_string(),
            });
        }

        if self.usual < self.earliest || self.usual > self.latest {
            return Err(Error::InvalidConfig {
                context: format!(
                    "usual time {} of {} meal is outside {} ~ {}",
                    self.usual, self.profile, self.earliest, self.latest
                ),
            });
        }

        Ok(())
    }
}

/// Safety check for food kept warm while nobody unplugs the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnpluggedCheckConfig {
    /// Enable the check.
    pub enabled: bool,
    /// Minutes of keep-warm before the check fires.
    pub max_duration: u32,
    /// Maximum number of reminders pushed per keep-warm episode.
    pub max_reminder_count: u32,
    /// Stop the appliance once the check fires.
    pub auto_stop: bool,
}

impl Default for UnpluggedCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_duration: 120,
            max_reminder_count: 3,
            auto_stop: false,
        }
    }
}

/// Appliance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CookerConfig {
    /// Display name, used as the notification title.
    #[serde(default = "default_cooker_name")]
    pub name: String,
    /// Appliance IP address.
    pub ip: IpAddr,
    /// 32-character hex device token.
    pub token: String,
    /// Keep warm after automatically started programs.
    #[serde(default)]
    pub auto_keep_warm: bool,
    /// Keep-warm safety check.
    #[serde(default)]
    pub unplugged_check: UnpluggedCheckConfig,
    /// Meal windows, evaluated in order.
    #[serde(default)]
    pub meals: Vec<MealWindow>,
}

/// Push notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushConfig {
    /// Bark device token; pushes are skipped when empty.
    #[serde(default)]
    pub token: String,
    /// Bark server.
    #[serde(default = "default_push_server")]
    pub server: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            server: default_push_server(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Seconds between two polls.
    pub poll_interval: u64,
    /// Appliance configuration.
    pub cooker: CookerConfig,
    /// Push notification configuration.
    #[serde(default)]
    pub push: PushConfig,
}

fn default_cooker_name() -> String {
    "Rice cooker".to_string()
}

fn default_push_server() -> String {
    BarkNotifier::DEFAULT_SERVER.to_string()
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::InvalidConfig {
            context: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::parse(&content, |name| std::env::var(name).ok())
    }

    /// Parse and validate configuration text, resolving `${NAME}` with `lookup`.
    pub fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut value = toml::Value::Table(table);
        expand_env(&mut value, &lookup);

        let config: Config = value.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval == 0 {
            return Err(Error::InvalidConfig {
                context: "poll_interval must be positive".to_string(),
            });
        }

        let token = &self.cooker.token;
        if token.len() != 32 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidConfig {
                context: "cooker token must be 32 hex characters".to_string(),
            });
        }

        let check = &self.cooker.unplugged_check;
        if check.enabled && check.max_duration == 0 {
            return Err(Error::InvalidConfig {
                context: "unplugged_check.max_duration must be positive".to_string(),
            });
        }

        for meal in &self.cooker.meals {
            meal.validate()?;
        }

        Ok(())
    }
}

/// Replace `${NAME}` in every string value of `value`.
fn expand_env(value: &mut toml::Value, lookup: &impl Fn(&str) -> Option<String>) {
    match value {
        toml::Value::String(s) => {
            if s.contains("${") {
                *s = substitute(s, lookup);
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                expand_env(item, lookup);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_env(item, lookup);
            }
        }
        _ => {}
    }
}

/// Substitute `${NAME}` references; unset variables become their own name.
fn substitute(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end)
                if end > 0
                    && after[..end]
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_') =>
            {
                let name = &after[..end];
                output.push_str(&lookup(name).unwrap_or_else(|| name.to_string()));
                rest = &after[end + 1..];
            }
            _ => {
                output.push_str("${");
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}
