// # upsmq-core
//
// Core library for the UPS to MQTT telemetry bridge.
//
// ## Architecture Overview
//
// This library provides the core functionality for bridging UPS status
// into retained MQTT topics:
// - **StatusSource**: Trait for reading raw UPS status text
// - **Publisher**: Trait for delivering telemetry values to the broker
// - **parser**: Turns raw `key: value` text into a StatusSnapshot
// - **ChangeCache**: Tracks the last published value per field
// - **BridgeEngine**: Orchestrates the poll → parse → diff → publish loop
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Poll-Driven**: One pipeline pass per fixed interval, never overlapping
// 3. **Minimal Republish**: Only fields whose value changed go out
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod parser;
pub mod detector;
pub mod topic;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{StatusSource, Publisher};
pub use engine::{BridgeEngine, CycleStats, EngineEvent};
pub use parser::{StatusSnapshot, parse_status};
pub use detector::{CacheEntry, ChangeCache};
pub use topic::TopicScheme;
pub use config::BridgeConfig;
pub use error::{Error, Result};
