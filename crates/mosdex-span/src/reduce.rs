//! Grouped reduction.

use indexmap::IndexMap;
use mosdex_core::prelude::{Container, Scalar};
use mosdex_operators::{JoinOperator, Pairing};

use crate::error::{Result, SpanError};
use crate::events;
use crate::span::{key_of, Repr, Span};

impl<'a> Span<'a> {
    /// Group rows by `key_field` and fold each group with `acc`.
    ///
    /// `acc` is planned with this span's schema on both sides. The first row
    /// of a key arrives as `Pairing::RightOnly(row)` (nothing accumulated yet);
    /// every later row as `Pairing::Matched(running, row)`. The result is keyed
    /// on `key_field`, one row per distinct key, in first-appearance order.
    pub fn reduce_by_key<J>(self, key_field: &str, mut acc: J) -> Result<Span<'a>>
    where
        J: JoinOperator,
    {
        if key_field.is_empty() || !self.schema.contains_field(key_field) {
            return Err(SpanError::Contract(format!(
                "cannot reduce span '{}' by '{}': not in schema {}",
                self.name, key_field, self.schema
            )));
        }
        let op_name = acc.name();
        let plan = acc
            .plan(&self.schema, key_field, &self.schema, key_field)
            .map_err(SpanError::operator(op_name))?;
        if !plan.output.contains_field(key_field) {
            return Err(SpanError::Contract(format!(
                "accumulator '{}' output {} drops key field '{}'",
                op_name, plan.output, key_field
            )));
        }
        events::stage(op_name, &self.name, &plan.output);

        let name = self.name.clone();
        let config = self.config;
        let context = format!("span '{}' after {}", name, op_name);
        let mut map: IndexMap<Scalar, Container> =
            IndexMap::with_capacity(config.keyed_capacity());
        for row in self.into_rows() {
            let row = row?;
            let key = key_of(&row, key_field)?;
            let pairing = match map.get_mut(&key) {
                Some(slot) => Pairing::Matched(std::mem::take(slot), row),
                None => Pairing::RightOnly(row),
            };
            let out = acc
                .apply(&plan, pairing)
                .map_err(SpanError::operator(op_name))?;
            out.verify_in(&plan.output, &context)?;
            if out.get(key_field) != Some(&key) {
                return Err(SpanError::Invariant(format!(
                    "accumulator '{}' changed key field '{}' from {} to {}",
                    op_name,
                    key_field,
                    key,
                    out.get(key_field).cloned().unwrap_or(Scalar::Null)
                )));
            }
            events::record(&config, &context, &out);
            map.insert(key, out);
        }
        events::materialized("reduce_by_key", &name, map.len());

        Ok(Span {
            name,
            schema: plan.output,
            repr: Repr::Indexed {
                key_field: key_field.to_string(),
                map,
            },
            config,
        })
    }
}
