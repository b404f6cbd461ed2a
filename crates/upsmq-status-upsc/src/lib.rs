// # upsc Status Source
//
// This crate reads UPS status by spawning the NUT `upsc` client and
// capturing its output.
//
// ## Purpose
//
// `upsc` is the standard NUT query tool and is present wherever a NUT
// server runs. Spawning it once per cycle keeps this crate free of NUT
// protocol details and picks up server-side configuration changes
// without restarts.
//
// ## Architecture
//
// One `fetch()` call spawns one short-lived process. The engine owns
// all timing; this crate never sleeps or retries. Anything that keeps
// a dump from being read (spawn failure, non-zero exit, empty or
// non-UTF-8 output) maps to `Error::SourceUnavailable`.

use tokio::process::Command;
use tracing::debug;

use upsmq_core::error::{Error, Result};
use upsmq_core::traits::StatusSource;

/// Default client binary
const DEFAULT_PROGRAM: &str = "upsc";

/// Status source backed by the `upsc` command line client
pub struct UpscSource {
    /// Binary to spawn
    program: String,

    /// UPS addressed as `name` or `name@host`
    target: String,

    /// Display name for logs
    name: String,
}

impl UpscSource {
    /// Create a source for one UPS target
    ///
    /// # Parameters
    ///
    /// - `target`: the UPS as `upsc` expects it, either a bare name
    ///   for the local server or `name@host` for a remote one
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        let name = format!("{DEFAULT_PROGRAM} {target}");

        Self {
            program: DEFAULT_PROGRAM.to_string(),
            target,
            name,
        }
    }

    /// Override the spawned binary
    ///
    /// Tests substitute a harmless command here; production keeps the
    /// default.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self.name = format!("{} {}", self.program, self.target);
        self
    }

    /// The `upsc` target this source queries
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait::async_trait]
impl StatusSource for UpscSource {
    async fn fetch(&self) -> Result<String> {
        debug!("Executing: {} {}", self.program, self.target);

        let output = Command::new(&self.program)
            .arg(&self.target)
            .output()
            .await
            .map_err(|e| {
                Error::source_unavailable(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::source_unavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let raw = String::from_utf8(output.stdout).map_err(|e| {
            Error::source_unavailable(format!(
                "{} produced non-UTF-8 output: {}",
                self.program, e
            ))
        })?;

        if raw.trim().is_empty() {
            return Err(Error::source_unavailable(format!(
                "{} produced no output",
                self.program
            )));
        }

        Ok(raw)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
