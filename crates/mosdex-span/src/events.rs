//! Tracing hooks.
//!
//! Compiled to no-ops without the `tracing` feature.

use mosdex_core::prelude::{Container, Schema, SpanConfig};

#[cfg(feature = "tracing")]
pub(crate) fn stage(event: &'static str, span: &str, schema: &Schema) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let fingerprint = schema
        .fingerprint()
        .map(|h| h.short())
        .unwrap_or_default();
    tracing::debug!(%event, %span, fields = schema.len(), %fingerprint, "span stage");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn stage(_event: &'static str, _span: &str, _schema: &Schema) {}

#[cfg(feature = "tracing")]
pub(crate) fn materialized(event: &'static str, span: &str, rows: usize) {
    tracing::debug!(%event, %span, rows, "span materialized");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn materialized(_event: &'static str, _span: &str, _rows: usize) {}

#[cfg(feature = "tracing")]
pub(crate) fn key_overwritten(span: &str, field: &str, key: &mosdex_core::Scalar) {
    tracing::warn!(%span, %field, %key, "duplicate key, keeping the later row");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn key_overwritten(_span: &str, _field: &str, _key: &mosdex_core::Scalar) {}

#[cfg(feature = "tracing")]
pub(crate) fn record(config: &SpanConfig, context: &str, row: &Container) {
    if config.trace_records {
        tracing::trace!(%context, %row, "record");
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn record(_config: &SpanConfig, _context: &str, _row: &Container) {}
