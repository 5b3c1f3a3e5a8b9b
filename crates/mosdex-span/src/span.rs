//! The span type, its representations, conversions, and terminal operations.
//!
//! State machine: lazy --persist()--> collection --key(f)--> keyed. There is
//! no way back to lazy; `view()` produces a *copy* as a fresh lazy span.

use indexmap::IndexMap;
use mosdex_core::prelude::{Container, Scalar, Schema, SpanConfig};
use mosdex_core::DuplicateKeys;

use crate::error::{Result, SpanError};
use crate::events;

/// Pull-based row source behind a lazy span.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Container>> + 'a>;

pub(crate) enum Repr<'a> {
    Lazy(RowIter<'a>),
    Collection(Vec<Container>),
    Indexed {
        key_field: String,
        map: IndexMap<Scalar, Container>,
    },
}

impl Repr<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Repr::Lazy(_) => "stream",
            Repr::Collection(_) => "collection",
            Repr::Indexed { .. } => "keyed",
        }
    }
}

/// A named, schema-bound sequence of containers.
pub struct Span<'a> {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) repr: Repr<'a>,
    pub(crate) config: SpanConfig,
}

impl<'a> Span<'a> {
    /// The neutral element of `union`: no fields, no rows.
    pub fn empty() -> Self {
        Self::with_config(SpanConfig::default())
    }

    pub(crate) fn with_config(config: SpanConfig) -> Self {
        Self {
            name: String::new(),
            schema: Schema::empty(),
            repr: Repr::Collection(Vec::new()),
            config,
        }
    }

    pub(crate) fn lazy(name: String, schema: Schema, rows: RowIter<'a>, config: SpanConfig) -> Self {
        Self {
            name,
            schema,
            repr: Repr::Lazy(rows),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &SpanConfig {
        &self.config
    }

    /// Collection- or map-backed (reusable).
    pub fn is_persistent(&self) -> bool {
        !matches!(self.repr, Repr::Lazy(_))
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self.repr, Repr::Indexed { .. })
    }

    /// Key field of a keyed span.
    pub fn key_field(&self) -> Option<&str> {
        match &self.repr {
            Repr::Indexed { key_field, .. } => Some(key_field),
            _ => None,
        }
    }

    /// Drain a lazy span into a collection. Reusable spans are returned as is.
    pub fn persist(self) -> Result<Span<'a>> {
        match self.repr {
            Repr::Lazy(rows) => {
                let rows = rows.collect::<Result<Vec<_>>>()?;
                events::materialized("persist", &self.name, rows.len());
                Ok(Span {
                    name: self.name,
                    schema: self.schema,
                    repr: Repr::Collection(rows),
                    config: self.config,
                })
            }
            repr => Ok(Span { repr, ..self }),
        }
    }

    /// Materialize into a map keyed on `key_field`'s value.
    ///
    /// Fails if `key_field` is empty or not in the schema. Duplicate key
    /// values follow [`SpanConfig::duplicate_keys`].
    pub fn key(self, key_field: &str) -> Result<Span<'a>> {
        if key_field.is_empty() {
            return Err(SpanError::Contract(format!(
                "cannot key span '{}' on an empty field name",
                self.name
            )));
        }
        if !self.schema.contains_field(key_field) {
            return Err(SpanError::Contract(format!(
                "cannot key span '{}' on '{}': not in schema {}",
                self.name, key_field, self.schema
            )));
        }
        if self.key_field() == Some(key_field) {
            return Ok(self);
        }

        let name = self.name.clone();
        let schema = self.schema.clone();
        let config = self.config;
        let mut map = IndexMap::with_capacity(config.keyed_capacity());
        for row in self.into_rows() {
            let row = row?;
            let key = key_of(&row, key_field)?;
            insert_keyed(&mut map, key, row, &name, key_field, config.duplicate_keys)?;
        }
        events::materialized("key", &name, map.len());
        Ok(Span {
            name,
            schema,
            repr: Repr::Indexed {
                key_field: key_field.to_string(),
                map,
            },
            config,
        })
    }

    /// A fresh lazy span over copies of this span's rows.
    pub fn view(&self) -> Result<Span<'_>> {
        let rows: RowIter<'_> = match &self.repr {
            Repr::Lazy(_) => return Err(self.stream_misuse("view()")),
            Repr::Collection(rows) => Box::new(rows.iter().cloned().map(Ok)),
            Repr::Indexed { map, .. } => Box::new(map.values().cloned().map(Ok)),
        };
        Ok(Span::lazy(self.name.clone(), self.schema.clone(), rows, self.config))
    }

    pub fn count(&self) -> Result<usize> {
        match &self.repr {
            Repr::Lazy(_) => Err(self.stream_misuse("count()")),
            Repr::Collection(rows) => Ok(rows.len()),
            Repr::Indexed { map, .. } => Ok(map.len()),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.count().map(|n| n == 0)
    }

    /// Borrowing iteration over a reusable span.
    pub fn iter(&self) -> Result<Box<dyn Iterator<Item = &Container> + '_>> {
        match &self.repr {
            Repr::Lazy(_) => Err(self.stream_misuse("iter()")),
            Repr::Collection(rows) => Ok(Box::new(rows.iter())),
            Repr::Indexed { map, .. } => Ok(Box::new(map.values())),
        }
    }

    /// O(1) lookup on a keyed span.
    pub fn get(&self, key: &Scalar) -> Result<Option<&Container>> {
        Ok(self.get_as_map()?.get(key))
    }

    pub fn get_as_map(&self) -> Result<&IndexMap<Scalar, Container>> {
        match &self.repr {
            Repr::Indexed { map, .. } => Ok(map),
            other => Err(SpanError::Contract(format!(
                "span '{}' is {}-backed; key() it before using it as a map",
                self.name,
                other.kind()
            ))),
        }
    }

    /// Copy of the rows of a reusable span.
    pub fn to_vec(&self) -> Result<Vec<Container>> {
        Ok(self.iter()?.cloned().collect())
    }

    /// Drain any span into its rows, stopping at the first error.
    pub fn collect(self) -> Result<Vec<Container>> {
        self.into_rows().collect()
    }

    /// Drain a keyed span into its map.
    pub fn into_map(self) -> Result<IndexMap<Scalar, Container>> {
        match self.repr {
            Repr::Indexed { map, .. } => Ok(map),
            other => Err(SpanError::Contract(format!(
                "span '{}' is {}-backed; key() it before using it as a map",
                self.name,
                other.kind()
            ))),
        }
    }

    pub fn for_each<F: FnMut(Container)>(self, mut f: F) -> Result<()> {
        for row in self.into_rows() {
            f(row?);
        }
        Ok(())
    }

    /// The span's rows as a pull-based source that ends after the first error.
    pub fn into_rows(self) -> RowIter<'a> {
        let rows: RowIter<'a> = match self.repr {
            Repr::Lazy(rows) => rows,
            Repr::Collection(rows) => Box::new(rows.into_iter().map(Ok)),
            Repr::Indexed { map, .. } => Box::new(map.into_values().map(Ok)),
        };
        Box::new(StopOnError { inner: Some(rows) })
    }

    fn stream_misuse(&self, op: &str) -> SpanError {
        SpanError::Contract(format!(
            "{} on stream-backed span '{}'; persist() it first",
            op, self.name
        ))
    }
}

impl<'a> IntoIterator for Span<'a> {
    type Item = Result<Container>;
    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_rows()
    }
}

impl std::fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Span");
        d.field("name", &self.name)
            .field("schema", &self.schema.to_string())
            .field("repr", &self.repr.kind());
        if let Some(key) = self.key_field() {
            d.field("key_field", &key);
        }
        if let Ok(n) = self.count() {
            d.field("rows", &n);
        }
        d.finish()
    }
}

/// Ends iteration after yielding the first error.
struct StopOnError<'a> {
    inner: Option<RowIter<'a>>,
}

impl Iterator for StopOnError<'_> {
    type Item = Result<Container>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.as_mut()?.next();
        match item {
            Some(Ok(row)) => Some(Ok(row)),
            Some(Err(e)) => {
                self.inner = None;
                Some(Err(e))
            }
            None => {
                self.inner = None;
                None
            }
        }
    }
}

/// Key value of a verified row.
pub(crate) fn key_of(row: &Container, key_field: &str) -> Result<Scalar> {
    row.get(key_field).cloned().ok_or_else(|| {
        SpanError::Invariant(format!(
            "verified row lacks key field '{}': {}",
            key_field, row
        ))
    })
}

pub(crate) fn insert_keyed(
    map: &mut IndexMap<Scalar, Container>,
    key: Scalar,
    row: Container,
    span: &str,
    key_field: &str,
    policy: DuplicateKeys,
) -> Result<()> {
    if map.contains_key(&key) {
        match policy {
            DuplicateKeys::Reject => {
                return Err(SpanError::DuplicateKey {
                    span: span.to_string(),
                    field: key_field.to_string(),
                    key: key.to_string(),
                })
            }
            DuplicateKeys::LastWins => events::key_overwritten(span, key_field, &key),
        }
    }
    map.insert(key, row);
    Ok(())
}
