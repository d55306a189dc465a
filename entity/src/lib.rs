//! SeaORM entity models for the SPROUTS monitoring bot.

pub mod monitor_settings;
pub mod prelude;
