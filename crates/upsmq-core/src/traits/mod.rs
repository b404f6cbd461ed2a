//! Core traits for the UPS bridge
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`StatusSource`]: Read one raw UPS status dump per cycle
//! - [`Publisher`]: Deliver telemetry values to the broker

pub mod status_source;
pub mod publisher;

pub use status_source::StatusSource;
pub use publisher::Publisher;
