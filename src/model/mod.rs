//! Domain models shared across the data and service layers.

pub mod settings;
