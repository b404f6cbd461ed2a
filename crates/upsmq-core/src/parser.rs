//! Parsing of raw UPS status text
//!
//! `upsc` prints one `key: value` pair per line. This module turns one
//! such dump into a [`StatusSnapshot`]: the device model plus the
//! normalized telemetry fields, in input order.
//!
//! ## Normalization
//!
//! - Field keys have `.` replaced by `_` so they can serve as topic
//!   segments (`battery.charge` becomes `battery_charge`).
//! - The model value additionally has spaces replaced by `_`
//!   (`Back-UPS RS 1000G` becomes `Back-UPS_RS_1000G`).
//!
//! Values are trimmed but otherwise published verbatim.

use crate::error::{Error, Result};

/// Key of the line that names the device
const MODEL_KEY: &str = "ups.model";

/// One parsed status dump
///
/// Lives for the duration of a single polling cycle; nothing here is
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Normalized device model, used as a topic segment
    pub model: String,

    /// Normalized `(field, value)` pairs in input order
    ///
    /// The `ups.model` line names the device and is not part of this
    /// list.
    pub fields: Vec<(String, String)>,
}

impl StatusSnapshot {
    /// Look up a field value by its normalized name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse one raw status dump into a snapshot
///
/// A line is eligible when it is non-blank and contains a `:`; all
/// other lines are silently skipped. Eligible lines split on the FIRST
/// `:` only, so values containing colons stay intact:
/// `battery.charge: 100: OK` yields field `battery_charge` with value
/// `100: OK`.
///
/// # Returns
///
/// - `Ok(StatusSnapshot)`: the dump named a device model
/// - `Err(Error::MissingModel)`: no `ups.model` line was present
pub fn parse_status(raw: &str) -> Result<StatusSnapshot> {
    let mut model = None;
    let mut fields = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() || !line.contains(':') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == MODEL_KEY {
            // First model line wins; upsc emits at most one
            if model.is_none() {
                model = Some(normalize_model(value));
            }
            continue;
        }

        fields.push((normalize_key(key), value.to_string()));
    }

    let model = model.ok_or(Error::MissingModel)?;
    Ok(StatusSnapshot { model, fields })
}

/// Make a field key usable as a topic segment
fn normalize_key(key: &str) -> String {
    key.replace('.', "_")
}

/// Make the model value usable as a topic segment
fn normalize_model(value: &str) -> String {
    value.replace(' ', "_").replace('.', "_")
}
