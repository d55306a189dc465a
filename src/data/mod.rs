//! Database repository layer.
//!
//! Repositories use SeaORM entity models internally and return domain models
//! to keep the data layer separate from the monitoring and command logic.

pub mod settings;
