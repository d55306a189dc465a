//! Monitor settings data repository for database operations.
//!
//! This module provides the `MonitorSettingsRepository` for managing the
//! single rate-limit alerting configuration row. The row is created lazily on
//! the first write and always carries id 1, so reads never need a lookup key.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait};

use crate::model::settings::{MonitorSettings, DEFAULT_ALERT_THRESHOLD};

const SETTINGS_ROW_ID: i32 = 1;

/// Repository providing database operations for rate-limit alert settings.
pub struct MonitorSettingsRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> MonitorSettingsRepository<'a> {
    /// Creates a new MonitorSettingsRepository instance.
    ///
    /// # Arguments
    /// - `db` - Reference to the database connection
    ///
    /// # Returns
    /// - `MonitorSettingsRepository` - New repository instance
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gets the stored settings row, if any write has created it yet.
    ///
    /// # Returns
    /// - `Ok(Some(MonitorSettings))` - Settings row exists
    /// - `Ok(None)` - No settings have been persisted
    /// - `Err(DbErr)` - Database error during query
    pub async fn get(&self) -> Result<Option<MonitorSettings>, DbErr> {
        let entity = entity::prelude::MonitorSettings::find_by_id(SETTINGS_ROW_ID)
            .one(self.db)
            .await?;

        Ok(entity.map(MonitorSettings::from_entity))
    }

    /// Gets the stored settings, falling back to the unconfigured defaults
    /// when no row exists.
    ///
    /// # Returns
    /// - `Ok(MonitorSettings)` - Stored or default settings
    /// - `Err(DbErr)` - Database error during query
    pub async fn get_or_default(&self) -> Result<MonitorSettings, DbErr> {
        Ok(self.get().await?.unwrap_or_else(MonitorSettings::unconfigured))
    }

    /// Sets or clears the alert destination channel.
    ///
    /// Creates the settings row with the default threshold when it does not
    /// exist yet.
    ///
    /// # Arguments
    /// - `channel_id` - Discord channel ID to alert into, or `None` to clear
    ///
    /// # Returns
    /// - `Ok(MonitorSettings)` - The updated settings
    /// - `Err(DbErr)` - Database error during upsert
    pub async fn set_alert_channel(
        &self,
        channel_id: Option<u64>,
    ) -> Result<MonitorSettings, DbErr> {
        let existing = self.get().await?;
        let now = Utc::now();
        let channel_id = channel_id.map(|id| id.to_string());

        let entity = if let Some(existing) = existing {
            let active = entity::monitor_settings::ActiveModel {
                id: ActiveValue::Set(SETTINGS_ROW_ID),
                alert_channel_id: ActiveValue::Set(channel_id),
                alert_threshold: ActiveValue::Set(existing.alert_threshold),
                updated_at: ActiveValue::Set(now),
            };
            active.update(self.db).await?
        } else {
            let new_record = entity::monitor_settings::ActiveModel {
                id: ActiveValue::Set(SETTINGS_ROW_ID),
                alert_channel_id: ActiveValue::Set(channel_id),
                alert_threshold: ActiveValue::Set(DEFAULT_ALERT_THRESHOLD),
                updated_at: ActiveValue::Set(now),
            };
            new_record.insert(self.db).await?
        };

        Ok(MonitorSettings::from_entity(entity))
    }

    /// Sets the alert threshold, preserving the configured channel.
    ///
    /// Range validation (1..=100) happens at the command layer; the
    /// repository persists whatever it is given.
    ///
    /// # Arguments
    /// - `threshold` - Five-minute event count at which alerts fire
    ///
    /// # Returns
    /// - `Ok(MonitorSettings)` - The updated settings
    /// - `Err(DbErr)` - Database error during upsert
    pub async fn set_alert_threshold(&self, threshold: i32) -> Result<MonitorSettings, DbErr> {
        let existing = self.get().await?;
        let now = Utc::now();

        let entity = if let Some(existing) = existing {
            let active = entity::monitor_settings::ActiveModel {
                id: ActiveValue::Set(SETTINGS_ROW_ID),
                alert_channel_id: ActiveValue::Set(existing.alert_channel_id),
                alert_threshold: ActiveValue::Set(threshold),
                updated_at: ActiveValue::Set(now),
            };
            active.update(self.db).await?
        } else {
            let new_record = entity::monitor_settings::ActiveModel {
                id: ActiveValue::Set(SETTINGS_ROW_ID),
                alert_channel_id: ActiveValue::Set(None),
                alert_threshold: ActiveValue::Set(threshold),
                updated_at: ActiveValue::Set(now),
            };
            new_record.insert(self.db).await?
        };

        Ok(MonitorSettings::from_entity(entity))
    }
}

#[cfg(test)]
#[path = "test/settings/mod.rs"]
mod test;
