// # Publisher Trait
//
// Defines the interface for delivering telemetry values to the broker.
//
// ## Implementations
//
// - MQTT via rumqttc: `upsmq-publisher-mqtt` crate
//
// ## Responsibilities
//
// A publisher hands one payload to the transport and reports whether
// the transport accepted it. Publishers must not diff values, consult
// the change cache, or retry: the engine re-reports a failed field on
// the next cycle, which is all the retry this system does.

use async_trait::async_trait;

/// Trait for telemetry publisher implementations
///
/// # Delivery Semantics
///
/// Implementations publish retained messages at least once, so a
/// subscriber joining late still sees the last known value of every
/// field. `publish()` resolves when the transport has accepted the
/// message; delivery beyond that point is the broker's concern and the
/// pipeline never blocks on it.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one retained message
    ///
    /// # Parameters
    ///
    /// - `topic`: full topic path for the field
    /// - `payload`: the field value, verbatim
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the transport accepted the message
    /// - `Err(Error)`: the message was not accepted; the caller keeps
    ///   the field marked as unpublished
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), crate::Error>;

    /// Get the publisher name (for logging/debugging)
    fn publisher_name(&self) -> &'static str;
}
