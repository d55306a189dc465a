//! Persistent configuration for the rate-limit monitor.
//!
//! A single-row table (id = 1) holding the alert destination channel and the
//! alert threshold. The row is created on first write; readers fall back to
//! defaults when it does not exist yet.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "monitor_settings")]
pub struct Model {
    /// Always 1; the settings are process-global, not per guild.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Discord channel id (snowflake as string) receiving rate-limit alerts.
    /// `None` disables alert dispatch entirely.
    pub alert_channel_id: Option<String>,
    /// Number of rate-limit events within a five-minute window that triggers
    /// an alert.
    pub alert_threshold: i32,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
