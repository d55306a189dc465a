//! Domain models for monitor settings data operations.
//!
//! Defines the persisted rate-limit alerting configuration. There is exactly
//! one settings row per deployment; the repository pins its id to 1.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::util::parse::parse_u64_from_string;

/// Default five-minute event count that triggers an alert.
pub const DEFAULT_ALERT_THRESHOLD: i32 = 5;

/// Rate-limit alerting configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Discord channel ID to send alerts to (stored as String), `None` until
    /// an owner runs `ratelimit setchannel`.
    pub alert_channel_id: Option<String>,
    /// Five-minute event count at which alerts fire.
    pub alert_threshold: i32,
    /// Timestamp when the settings were last changed.
    pub updated_at: DateTime<Utc>,
}

impl MonitorSettings {
    /// Converts an entity model to a settings domain model at the repository boundary.
    ///
    /// # Arguments
    /// - `entity` - The entity model from the database
    ///
    /// # Returns
    /// - `MonitorSettings` - The converted settings domain model
    pub fn from_entity(entity: entity::monitor_settings::Model) -> Self {
        Self {
            alert_channel_id: entity.alert_channel_id,
            alert_threshold: entity.alert_threshold,
            updated_at: entity.updated_at,
        }
    }

    /// Settings used before any owner has configured alerting.
    pub fn unconfigured() -> Self {
        Self {
            alert_channel_id: None,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            updated_at: Utc::now(),
        }
    }

    /// Parses the stored alert channel id into a numeric Discord ID.
    ///
    /// # Returns
    /// - `Ok(Some(u64))` - Channel configured and parseable
    /// - `Ok(None)` - No channel configured
    /// - `Err(AppError)` - Stored value is not a valid snowflake
    pub fn alert_channel(&self) -> Result<Option<u64>, AppError> {
        match &self.alert_channel_id {
            Some(id) => Ok(Some(parse_u64_from_string(id.clone())?)),
            None => Ok(None),
        }
    }
}
