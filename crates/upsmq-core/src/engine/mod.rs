//! Core bridge engine
//!
//! The BridgeEngine is responsible for:
//! - Polling the status source on a fixed interval
//! - Parsing raw status text into a snapshot
//! - Diffing the snapshot against the last published values
//! - Publishing changed fields as retained messages
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    raw text    ┌──────────────┐
//! │ StatusSource │───────────────▶│ BridgeEngine │
//! └──────────────┘                └──────────────┘
//!                                        │
//!                   ┌────────────────────┼────────────────────┐
//!                   │                    │                    │
//!                   ▼                    ▼                    ▼
//!           ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!           │ ChangeCache │      │  Publisher  │      │   Events    │
//!           │ (diff)      │      │ (retained)  │      │  (notify)   │
//!           └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch raw status text from the source
//! 2. Parse it into a snapshot (device model + fields)
//! 3. Diff the snapshot against the cache
//! 4. Publish each changed field; commit it to the cache on success
//! 5. Sleep until the next cycle

use crate::config::BridgeConfig;
use crate::detector::ChangeCache;
use crate::error::Result;
use crate::parser::parse_status;
use crate::topic::TopicScheme;
use crate::traits::{Publisher, StatusSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted by the BridgeEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        poll_interval_secs: u64,
    },

    /// One field went out as a retained message
    FieldPublished {
        field: String,
        value: String,
        topic: String,
    },

    /// One field failed to publish (re-reported next cycle)
    PublishFailed {
        field: String,
        error: String,
    },

    /// One polling cycle finished
    CycleCompleted {
        changed: usize,
        published: usize,
        failed: usize,
    },

    /// One polling cycle was abandoned before publishing
    CycleSkipped {
        reason: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Outcome of one polling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    /// Fields the diff reported as changed
    pub changed: usize,
    /// Fields published and committed to the cache
    pub published: usize,
    /// Fields whose publish failed (left uncached)
    pub failed: usize,
}

/// Core bridge engine
///
/// The engine orchestrates the entire poll → parse → diff → publish
/// flow. It runs one cycle at a time on a single task; cycles never
/// overlap, and the change cache is a plain owned value with no
/// locking.
///
/// ## Lifecycle
///
/// 1. Create with [`BridgeEngine::new()`]
/// 2. Start with [`BridgeEngine::run()`]
/// 3. Engine runs until a shutdown signal is received
/// 4. Drop to cleanup
///
/// ## Failure Containment
///
/// Nothing a cycle does is fatal to the engine:
/// - Source and parse failures abandon the current cycle; the loop
///   sleeps and tries again at the next interval, with no backoff.
/// - A per-field publish failure leaves that field out of the cache
///   (so it is re-reported next cycle) and the remaining fields still
///   go out.
pub struct BridgeEngine {
    /// Source of raw status text
    source: Box<dyn StatusSource>,

    /// Transport for retained telemetry messages
    publisher: Box<dyn Publisher>,

    /// Last successfully published value per field
    cache: ChangeCache,

    /// Topic layout for published fields
    topics: TopicScheme,

    /// Pause between polling cycles
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl BridgeEngine {
    /// Create a new bridge engine
    ///
    /// # Parameters
    ///
    /// - `source`: status source implementation
    /// - `publisher`: publisher implementation
    /// - `config`: bridge configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events
    pub fn new(
        source: Box<dyn StatusSource>,
        publisher: Box<dyn Publisher>,
        config: BridgeConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let topics = TopicScheme::new(&config.mqtt.base_topic, &config.ups.location)?;
        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            source,
            publisher,
            cache: ChangeCache::new(),
            topics,
            poll_interval: Duration::from_secs(config.general.poll_interval_secs),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine
    ///
    /// Polls immediately, then keeps cycling until a shutdown signal
    /// is received.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown
    /// - `Err(Error)`: fatal error (cycle failures are not fatal)
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    async fn run_internal(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            poll_interval_secs: self.poll_interval.as_secs(),
        });
        info!(
            "Bridge started: source={}, publisher={}, interval={:?}",
            self.source.source_name(),
            self.publisher.publisher_name(),
            self.poll_interval
        );

        if let Some(mut rx) = shutdown_rx {
            // Controlled mode: wait for the provided shutdown signal
            loop {
                self.run_cycle().await;

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}

                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for ctrl-c
            loop {
                self.run_cycle().await;

                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}

                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Run one cycle, containing its errors
    ///
    /// Source and parse failures abandon the cycle; the loop stays
    /// alive and retries at the next interval.
    async fn run_cycle(&mut self) {
        match self.poll_once().await {
            Ok(stats) => {
                debug!(
                    "Cycle complete: {} changed, {} published, {} failed",
                    stats.changed, stats.published, stats.failed
                );
                self.emit_event(EngineEvent::CycleCompleted {
                    changed: stats.changed,
                    published: stats.published,
                    failed: stats.failed,
                });
            }
            Err(e) => {
                warn!("Cycle abandoned: {}", e);
                self.emit_event(EngineEvent::CycleSkipped {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Run one polling cycle
    ///
    /// Fetches, parses, diffs, and publishes. Per-field publish
    /// failures are contained: the failed field stays out of the cache
    /// and the remaining fields still go out. Source and parse
    /// failures abort the cycle with nothing published.
    ///
    /// Public so embedders can drive their own schedule; the bridge
    /// daemon uses [`BridgeEngine::run()`] instead.
    pub async fn poll_once(&mut self) -> Result<CycleStats> {
        let raw = self.source.fetch().await?;
        let snapshot = parse_status(&raw)?;
        let changed = self.cache.diff(&snapshot);

        debug!(
            "Snapshot: model={}, fields={}, changed={}",
            snapshot.model,
            snapshot.fields.len(),
            changed.len()
        );

        let mut stats = CycleStats {
            changed: changed.len(),
            ..Default::default()
        };

        for (field, value) in changed {
            let topic = self.topics.field_topic(&snapshot.model, &field);

            match self.publisher.publish(&topic, &value).await {
                Ok(()) => {
                    info!("Published {} = {} ({})", field, value, topic);
                    self.cache.commit(field.clone(), value.clone());
                    stats.published += 1;
                    self.emit_event(EngineEvent::FieldPublished {
                        field,
                        value,
                        topic,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to publish {} via {}: {}",
                        field,
                        self.publisher.publisher_name(),
                        e
                    );
                    stats.failed += 1;
                    self.emit_event(EngineEvent::PublishFailed {
                        field,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(stats)
    }

    /// Last published values, as the engine sees them
    pub fn cache(&self) -> &ChangeCache {
        &self.cache
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging a warning if the channel is full
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing \
                event_channel_capacity or draining the receiver faster."
            );
        }
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// Contract tests and embedders that manage their own signals use
    /// this; the daemon bridges SIGTERM/SIGINT into the channel. Plain
    /// `run()` covers the ctrl-c case.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
