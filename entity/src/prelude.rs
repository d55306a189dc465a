pub use super::monitor_settings::Entity as MonitorSettings;
