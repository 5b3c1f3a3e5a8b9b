//! Span construction from external sources.
//!
//! `create*` copies the caller's rows; `wrap*` takes ownership of them without
//! copying. Reusable spans are verified eagerly, stream spans as rows flow.

use indexmap::IndexMap;
use mosdex_core::prelude::{Container, Scalar, Schema, SpanConfig};

use crate::error::{Result, SpanError};
use crate::events;
use crate::span::{key_of, Repr, Span};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpanFactory {
    config: SpanConfig,
}

impl SpanFactory {
    pub fn new(config: SpanConfig) -> Self {
        Self { config }
    }

    /// Factory configured from `MOSDEX_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(SpanConfig::from_env())
    }

    pub fn config(&self) -> &SpanConfig {
        &self.config
    }

    /// No fields, no rows; the neutral element of `union`.
    pub fn empty(&self) -> Span<'static> {
        Span::with_config(self.config)
    }

    /// Single-pass span over `rows`. Each row is verified against `schema`
    /// when it is pulled.
    pub fn stream<'a, I>(&self, name: impl Into<String>, schema: Schema, rows: I) -> Span<'a>
    where
        I: IntoIterator<Item = Container>,
        I::IntoIter: 'a,
    {
        let name = name.into();
        let config = self.config;
        let context = format!("span '{}'", name);
        let target = schema.clone();
        let rows = rows.into_iter().map(move |row| -> Result<Container> {
            row.verify_in(&target, &context)?;
            events::record(&config, &context, &row);
            Ok(row)
        });
        Span::lazy(name, schema, Box::new(rows), config)
    }

    /// Collection span holding copies of `rows`.
    pub fn create(
        &self,
        name: impl Into<String>,
        schema: Schema,
        rows: &[Container],
    ) -> Result<Span<'static>> {
        self.wrap(name, schema, rows.to_vec())
    }

    /// Collection span that takes ownership of `rows`.
    pub fn wrap(
        &self,
        name: impl Into<String>,
        schema: Schema,
        rows: Vec<Container>,
    ) -> Result<Span<'static>> {
        let name = name.into();
        let context = format!("span '{}'", name);
        for row in &rows {
            row.verify_in(&schema, &context)?;
        }
        events::materialized("wrap", &name, rows.len());
        Ok(Span {
            name,
            schema,
            repr: Repr::Collection(rows),
            config: self.config,
        })
    }

    /// Keyed span holding a copy of `map`.
    pub fn create_keyed(
        &self,
        name: impl Into<String>,
        schema: Schema,
        key_field: &str,
        map: &IndexMap<Scalar, Container>,
    ) -> Result<Span<'static>> {
        self.wrap_keyed(name, schema, key_field, map.clone())
    }

    /// Keyed span that takes ownership of `map`. Every entry's key must equal
    /// its row's `key_field` value.
    pub fn wrap_keyed(
        &self,
        name: impl Into<String>,
        schema: Schema,
        key_field: &str,
        map: IndexMap<Scalar, Container>,
    ) -> Result<Span<'static>> {
        let name = name.into();
        if key_field.is_empty() || !schema.contains_field(key_field) {
            return Err(SpanError::Contract(format!(
                "cannot key span '{}' on '{}': not in schema {}",
                name, key_field, schema
            )));
        }
        let context = format!("span '{}'", name);
        for (key, row) in &map {
            row.verify_in(&schema, &context)?;
            let actual = key_of(row, key_field)?;
            if &actual != key {
                return Err(SpanError::Contract(format!(
                    "span '{}': map key {} does not match row's '{}' value {}",
                    name, key, key_field, actual
                )));
            }
        }
        events::materialized("wrap_keyed", &name, map.len());
        Ok(Span {
            name,
            schema,
            repr: Repr::Indexed {
                key_field: key_field.to_string(),
                map,
            },
            config: self.config,
        })
    }

    /// Fresh stream span over copies of a reusable span's rows.
    pub fn copy<'s>(&self, span: &'s Span<'_>) -> Result<Span<'s>> {
        span.view()
    }

    /// Union of all `spans`, folded left to right from the empty span.
    pub fn union<'a, I>(&self, spans: I) -> Result<Span<'a>>
    where
        I: IntoIterator<Item = Span<'a>>,
    {
        spans
            .into_iter()
            .try_fold(Span::with_config(self.config), |acc, span| acc.union(span))
    }
}
