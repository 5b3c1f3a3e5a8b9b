//! Span configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What keying does when two rows carry the same key value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeys {
    /// The later row replaces the earlier one; the key keeps its first position.
    #[default]
    LastWins,
    /// Keying fails, naming the duplicated key.
    Reject,
}

impl std::str::FromStr for DuplicateKeys {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-wins" | "last_wins" | "lastwins" => Ok(DuplicateKeys::LastWins),
            "reject" => Ok(DuplicateKeys::Reject),
            other => Err(Error::Config(format!(
                "unknown duplicate-key policy '{}' (expected 'last-wins' or 'reject')",
                other
            ))),
        }
    }
}

/// Upper bound on the capacity reserved up front for a keyed map.
pub const MAX_KEYED_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanConfig {
    /// Duplicate handling when a span is keyed or reduced into a map.
    pub duplicate_keys: DuplicateKeys,

    /// Initial capacity for keyed maps; 0 lets the map grow on demand.
    /// Reservations are capped at [`MAX_KEYED_CAPACITY`].
    pub keyed_capacity_hint: usize,

    /// Emit a trace event for every record that crosses a verification boundary.
    pub trace_records: bool,
}

impl Default for SpanConfig {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeys::LastWins,
            keyed_capacity_hint: 0,
            trace_records: false,
        }
    }
}

impl SpanConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `MOSDEX_DUPLICATE_KEYS`: `last-wins` or `reject`
    /// - `MOSDEX_KEYED_CAPACITY`: initial keyed map capacity
    /// - `MOSDEX_TRACE_RECORDS`: `1`/`true` to trace every record
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("MOSDEX_DUPLICATE_KEYS") {
            if let Ok(v) = s.parse::<DuplicateKeys>() {
                cfg.duplicate_keys = v;
            }
        }

        if let Ok(s) = std::env::var("MOSDEX_KEYED_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.keyed_capacity_hint = v;
            }
        }

        if let Ok(s) = std::env::var("MOSDEX_TRACE_RECORDS") {
            cfg.trace_records = matches!(s.trim(), "1" | "true" | "TRUE" | "yes");
        }

        cfg
    }

    /// Capacity to reserve for a keyed map, capped at [`MAX_KEYED_CAPACITY`].
    pub fn keyed_capacity(&self) -> usize {
        self.keyed_capacity_hint.min(MAX_KEYED_CAPACITY)
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn with_trace_records(mut self, on: bool) -> Self {
        self.trace_records = on;
        self
    }
}
