use crate::data::settings::MonitorSettingsRepository;
use crate::error::AppError;
use crate::model::settings::DEFAULT_ALERT_THRESHOLD;
use test_utils::builder::TestBuilder;

mod get;
mod set_alert_channel;
mod set_alert_threshold;
