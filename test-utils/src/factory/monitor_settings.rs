//! Monitor settings factory for creating the persisted configuration row.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating the test monitor settings row with customizable fields.
///
/// The settings table holds a single row with id 1; the factory always writes
/// that row.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::factory::monitor_settings::MonitorSettingsFactory;
///
/// let settings = MonitorSettingsFactory::new(&db)
///     .alert_channel_id(Some("987654321".to_string()))
///     .alert_threshold(10)
///     .build()
///     .await?;
/// ```
pub struct MonitorSettingsFactory<'a> {
    db: &'a DatabaseConnection,
    alert_channel_id: Option<String>,
    alert_threshold: i32,
}

impl<'a> MonitorSettingsFactory<'a> {
    /// Creates a new MonitorSettingsFactory with default values.
    ///
    /// Defaults:
    /// - alert_channel_id: `None` (alerts disabled)
    /// - alert_threshold: `5`
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            alert_channel_id: None,
            alert_threshold: 5,
        }
    }

    /// Sets the alert channel id.
    pub fn alert_channel_id(mut self, alert_channel_id: Option<String>) -> Self {
        self.alert_channel_id = alert_channel_id;
        self
    }

    /// Sets the alert threshold.
    pub fn alert_threshold(mut self, alert_threshold: i32) -> Self {
        self.alert_threshold = alert_threshold;
        self
    }

    /// Builds and inserts the settings row into the database.
    ///
    /// # Returns
    /// - `Ok(entity::monitor_settings::Model)` - Created settings row
    /// - `Err(DbErr)` - Database error during insert
    pub async fn build(self) -> Result<entity::monitor_settings::Model, DbErr> {
        entity::monitor_settings::ActiveModel {
            id: ActiveValue::Set(1),
            alert_channel_id: ActiveValue::Set(self.alert_channel_id),
            alert_threshold: ActiveValue::Set(self.alert_threshold),
            updated_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates the monitor settings row with default values.
///
/// Shorthand for `MonitorSettingsFactory::new(db).build().await`.
pub async fn create_settings(
    db: &DatabaseConnection,
) -> Result<entity::monitor_settings::Model, DbErr> {
    MonitorSettingsFactory::new(db).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TestBuilder;
    use entity::prelude::*;

    #[tokio::test]
    async fn creates_settings_with_defaults() -> Result<(), DbErr> {
        let test = TestBuilder::new()
            .with_table(MonitorSettings)
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();

        let settings = create_settings(db).await?;

        assert_eq!(settings.id, 1);
        assert!(settings.alert_channel_id.is_none());
        assert_eq!(settings.alert_threshold, 5);

        Ok(())
    }

    #[tokio::test]
    async fn creates_settings_with_custom_values() -> Result<(), DbErr> {
        let test = TestBuilder::new()
            .with_table(MonitorSettings)
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();

        let settings = MonitorSettingsFactory::new(db)
            .alert_channel_id(Some("987654321".to_string()))
            .alert_threshold(10)
            .build()
            .await?;

        assert_eq!(settings.alert_channel_id, Some("987654321".to_string()));
        assert_eq!(settings.alert_threshold, 10);

        Ok(())
    }
}
