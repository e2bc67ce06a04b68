//! Mercury 230 energy meter driver
//!
//! Builds the request frames, validates and decodes the responses of the
//! Mercury 230 serial protocol and polls configured meters with it.

pub mod checksum;
pub mod config;
pub mod metering_mercury;
pub mod models;
pub mod poller;
pub mod transport;

// Re-export common types for easier access
pub use config::{Config, MeterConfig, MeterModel};
pub use metering_mercury::{create_device, Mercury230, MercuryError, MeterDevice, ResponseError};
pub use metering_mercury::structs::CurrentValues;
pub use models::MeterReading;
pub use transport::Transport;
