//! Factory methods for creating test data.
//!
//! This module provides factory methods for creating test entities with sensible
//! defaults, reducing boilerplate in tests.
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use test_utils::factory;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), sea_orm::DbErr> {
//!     let db = /* ... */;
//!
//!     // Create with defaults
//!     let settings = factory::monitor_settings::create_settings(&db).await?;
//!
//!     // Or customize through the builder
//!     let settings = factory::monitor_settings::MonitorSettingsFactory::new(&db)
//!         .alert_channel_id(Some("123456789".to_string()))
//!         .alert_threshold(10)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod monitor_settings;

pub use monitor_settings::create_settings;
