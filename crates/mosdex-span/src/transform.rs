//! Row-wise transformations and union.

use mosdex_core::prelude::{Container, Schema};
use mosdex_operators::{MapOperator, Rename};

use crate::error::{Result, SpanError};
use crate::events;
use crate::span::{Repr, RowIter, Span};

impl<'a> Span<'a> {
    /// Project onto `names` (kept in schema order). Unknown names fail.
    pub fn select<S: AsRef<str>>(self, names: &[S]) -> Result<Span<'a>> {
        let schema = self.schema.select(names)?;
        self.reshape(schema, "select")
    }

    /// Drop `names`; absent names are ignored.
    pub fn delete<S: AsRef<str>>(self, names: &[S]) -> Result<Span<'a>> {
        let schema = self.schema.delete(names);
        self.reshape(schema, "delete")
    }

    pub fn rename_field(self, old: &str, new: &str) -> Result<Span<'a>> {
        self.map(Rename::new(old, new))
    }

    /// Keep rows for which `pred` holds. Schema unchanged.
    pub fn filter<P>(self, mut pred: P) -> Span<'a>
    where
        P: FnMut(&Container) -> bool + 'a,
    {
        let name = self.name.clone();
        let schema = self.schema.clone();
        let config = self.config;
        let rows = self.into_rows().filter(move |row| match row {
            Ok(row) => pred(row),
            Err(_) => true,
        });
        Span::lazy(name, schema, Box::new(rows), config)
    }

    /// Call `f` on every row as it flows past. Data unchanged.
    pub fn inspect<F>(self, mut f: F) -> Span<'a>
    where
        F: FnMut(&Container) + 'a,
    {
        let name = self.name.clone();
        let schema = self.schema.clone();
        let config = self.config;
        let rows = self.into_rows().inspect(move |row| {
            if let Ok(row) = row {
                f(row);
            }
        });
        Span::lazy(name, schema, Box::new(rows), config)
    }

    /// Plan `op` against this span's schema once, then apply it to every row,
    /// verifying each result against the planned output schema.
    pub fn map<M>(self, mut op: M) -> Result<Span<'a>>
    where
        M: MapOperator + 'a,
    {
        let op_name = op.name();
        let plan = op
            .plan(&self.schema)
            .map_err(SpanError::operator(op_name))?;
        events::stage(op_name, &self.name, &plan.output);

        let name = self.name.clone();
        let config = self.config;
        let schema = plan.output.clone();
        let context = format!("span '{}' after {}", name, op_name);
        let rows = self.into_rows().map(move |row| -> Result<Container> {
            let out = op
                .apply(&plan, row?)
                .map_err(SpanError::operator(op_name))?;
            out.verify_in(&plan.output, &context)?;
            events::record(&config, &context, &out);
            Ok(out)
        });
        Ok(Span::lazy(name, schema, Box::new(rows), config))
    }

    /// Concatenate two spans with equal schemas. An empty schema on either
    /// side is a wildcard that adopts the other side's schema.
    ///
    /// Keyed spans on the same key field merge their maps (a later row under
    /// the same key wins); two reusable spans concatenate into a collection;
    /// anything involving a lazy span concatenates lazily.
    pub fn union(self, other: Span<'a>) -> Result<Span<'a>> {
        if is_identity(&other) {
            return Ok(self);
        }
        if is_identity(&self) {
            return Ok(other);
        }
        let schema = union_schema(&self, &other)?;
        events::stage("union", &self.name, &schema);
        let left = self.conformed(&schema)?;
        let right = other.conformed(&schema)?;

        let Span {
            name,
            repr: left_repr,
            config,
            ..
        } = left;
        let repr = match (left_repr, right.repr) {
            (
                Repr::Indexed {
                    key_field,
                    mut map,
                },
                Repr::Indexed {
                    key_field: other_key,
                    map: other_map,
                },
            ) if key_field == other_key => {
                map.extend(other_map);
                Repr::Indexed { key_field, map }
            }
            (l, r) if is_reusable(&l) && is_reusable(&r) => {
                Repr::Collection(repr_rows(l).chain(repr_rows(r)).collect::<Result<_>>()?)
            }
            (l, r) => Repr::Lazy(Box::new(repr_rows(l).chain(repr_rows(r)))),
        };
        Ok(Span {
            name,
            schema,
            repr,
            config,
        })
    }

    /// Project every row onto `schema` (a subset of the current fields).
    fn reshape(self, schema: Schema, op: &'static str) -> Result<Span<'a>> {
        events::stage(op, &self.name, &schema);
        let name = self.name.clone();
        let config = self.config;
        let context = format!("span '{}' after {}", name, op);
        let target = schema.clone();
        let rows = self.into_rows().map(move |row| -> Result<Container> {
            let out = row?.conform(&target);
            out.verify_in(&target, &context)?;
            events::record(&config, &context, &out);
            Ok(out)
        });
        Ok(Span::lazy(name, schema, Box::new(rows), config))
    }

    /// Re-bind this span to `schema` for a union. Only a span whose own schema
    /// is empty changes; its rows (there should be none) are checked against
    /// the adopted schema.
    fn conformed(self, schema: &Schema) -> Result<Span<'a>> {
        if &self.schema == schema {
            return Ok(self);
        }
        let context = format!("span '{}' in union", self.name);
        match self.repr {
            Repr::Lazy(rows) => {
                let target = schema.clone();
                let rows = rows.map(move |row| -> Result<Container> {
                    let row = row?;
                    row.verify_in(&target, &context)?;
                    Ok(row)
                });
                Ok(Span {
                    schema: schema.clone(),
                    repr: Repr::Lazy(Box::new(rows)),
                    ..self
                })
            }
            repr => {
                for row in repr_values_ref(&repr) {
                    row.verify_in(schema, &context)?;
                }
                Ok(Span {
                    schema: schema.clone(),
                    repr,
                    ..self
                })
            }
        }
    }
}

fn union_schema(left: &Span<'_>, right: &Span<'_>) -> Result<Schema> {
    if left.schema.is_empty() {
        return Ok(right.schema.clone());
    }
    if right.schema.is_empty() || left.schema == right.schema {
        return Ok(left.schema.clone());
    }
    let fp = |s: &Schema| s.fingerprint().map(|h| h.short()).unwrap_or_default();
    Err(SpanError::Structural(mosdex_core::Error::Schema(format!(
        "cannot union span '{}' {} [{}] with span '{}' {} [{}]: fields differ [{}]",
        left.name,
        left.schema,
        fp(&left.schema),
        right.name,
        right.schema,
        fp(&right.schema),
        left.schema.difference(&right.schema).join(", ")
    ))))
}

fn repr_rows<'a>(repr: Repr<'a>) -> RowIter<'a> {
    match repr {
        Repr::Lazy(rows) => rows,
        Repr::Collection(rows) => Box::new(rows.into_iter().map(Ok)),
        Repr::Indexed { map, .. } => Box::new(map.into_values().map(Ok)),
    }
}

/// Empty schema and no rows: the neutral element of union.
fn is_identity(span: &Span<'_>) -> bool {
    span.schema.is_empty() && span.count().map(|n| n == 0).unwrap_or(false)
}

fn is_reusable(repr: &Repr<'_>) -> bool {
    !matches!(repr, Repr::Lazy(_))
}

fn repr_values_ref<'r>(repr: &'r Repr<'_>) -> Box<dyn Iterator<Item = &'r Container> + 'r> {
    match repr {
        Repr::Collection(rows) => Box::new(rows.iter()),
        Repr::Indexed { map, .. } => Box::new(map.values()),
        Repr::Lazy(_) => Box::new(std::iter::empty()),
    }
}
