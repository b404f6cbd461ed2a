// # Status Source Trait
//
// Defines the interface for reading raw UPS status text.
//
// ## Implementations
//
// - upsc subprocess: `upsmq-status-upsc` crate
// - Future: native NUT protocol client, SNMP
//
// ## Responsibilities
//
// A source produces one raw dump per call and nothing more. Sources
// must not retry, sleep, or schedule: cycle timing and failure policy
// belong to the engine. A source that cannot produce readable output
// returns `Error::SourceUnavailable` and lets the engine decide.

use async_trait::async_trait;

/// Trait for UPS status source implementations
///
/// One `fetch()` call corresponds to one polling cycle.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch one raw status dump
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: raw `key: value` text, one field per line
    /// - `Err(Error)`: the source could not produce a readable dump
    ///   this cycle
    async fn fetch(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &str;
}
