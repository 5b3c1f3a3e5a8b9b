//! Left, inner, and outer joins.
//!
//! All three share one preparation step that checks every precondition and
//! plans the operator before a single record flows:
//! 1. the left span has the key field,
//! 2. the right span is keyed (on its own key field if it already was, on the
//!    join key otherwise),
//! 3. the right key type accepts the left key type,
//! 4. the operator plans its output from both schemas.

use std::collections::HashSet;

use indexmap::IndexMap;
use mosdex_core::prelude::{Container, Scalar, SpanConfig};
use mosdex_operators::{JoinOperator, JoinPlan, Pairing, Probed};

use crate::error::{Result, SpanError};
use crate::events;
use crate::span::{key_of, Repr, RowIter, Span};

struct Prepared<'a> {
    name: String,
    config: SpanConfig,
    left: RowIter<'a>,
    right: IndexMap<Scalar, Container>,
    plan: JoinPlan,
}

impl<'a> Span<'a> {
    /// For every row of `self`, in order, pair it with the row of `other`
    /// sharing its `key_field` value (if any) and hand the pairing to `op`.
    /// Output has exactly as many rows as `self`; right rows without a left
    /// partner are not emitted.
    pub fn left_join<J>(self, other: Span<'_>, key_field: &str, mut op: J) -> Result<Span<'a>>
    where
        J: JoinOperator + 'a,
    {
        let op_name = op.name();
        let Prepared {
            name,
            config,
            left,
            right,
            plan,
        } = self.prepare_join(other, key_field, &op)?;

        let schema = plan.output.clone();
        let context = format!("span '{}' after {}", name, op_name);
        let rows = left.map(move |row| -> Result<Container> {
            let left = row?;
            let key = key_of(&left, &plan.left_key)?;
            let pairing = match right.get(&key) {
                Some(r) => Pairing::Matched(left, r.clone()),
                None => Pairing::LeftOnly(left),
            };
            let out = op
                .apply(&plan, pairing)
                .map_err(SpanError::operator(op_name))?;
            out.verify_in(&plan.output, &context)?;
            events::record(&config, &context, &out);
            Ok(out)
        });
        Ok(Span::lazy(name, schema, Box::new(rows), config))
    }

    /// Left join restricted to rows whose key found a right partner.
    pub fn inner_join<J>(self, other: Span<'_>, key_field: &str, op: J) -> Result<Span<'a>>
    where
        J: JoinOperator + 'a,
    {
        let probed = Probed::new(op);
        let probe = probed.probe();
        Ok(self.left_join(other, key_field, probed)?.filter(probe.inner()))
    }

    /// Full outer join, keyed on `key_field`: one row per key found on either
    /// side. Keys present on both sides are combined by `op` into a single row.
    pub fn outer_join<J>(self, other: Span<'_>, key_field: &str, op: J) -> Result<Span<'a>>
    where
        J: JoinOperator + 'a,
    {
        self.outer_join_rows(other, key_field, op)?.key(key_field)
    }

    /// The rows of [`outer_join`](Self::outer_join) as a lazy span, before
    /// keying: every left row (combined with its partner or widened alone), in
    /// order, then every right row that no left row claimed. Useful for putting
    /// a peek (e.g. an unmatched-key report) in front of the keying step.
    pub fn outer_join_rows<J>(self, other: Span<'_>, key_field: &str, op: J) -> Result<Span<'a>>
    where
        J: JoinOperator + 'a,
    {
        let op_name = op.name();
        let Prepared {
            name,
            config,
            left,
            right,
            plan,
        } = self.prepare_join(other, key_field, &op)?;
        if !plan.output.contains_field(&plan.left_key) {
            return Err(SpanError::JoinPrecondition(format!(
                "outer join of span '{}': operator '{}' output {} drops key field '{}'",
                name, op_name, plan.output, plan.left_key
            )));
        }

        let schema = plan.output.clone();
        let rows = OuterRows {
            left: Some(left),
            right,
            right_only: None,
            matched: HashSet::new(),
            context: format!("span '{}' after {}", name, op_name),
            op_name,
            op,
            plan,
            config,
        };
        Ok(Span::lazy(name, schema, Box::new(rows), config))
    }

    fn prepare_join<J: JoinOperator>(
        self,
        other: Span<'_>,
        key_field: &str,
        op: &J,
    ) -> Result<Prepared<'a>> {
        if !self.schema.contains_field(key_field) {
            return Err(SpanError::JoinPrecondition(format!(
                "left span '{}' has no key field '{}' in {}",
                self.name, key_field, self.schema
            )));
        }
        let other = if other.is_keyed() {
            other
        } else {
            if !other.schema.contains_field(key_field) {
                return Err(SpanError::JoinPrecondition(format!(
                    "right span '{}' has no key field '{}' in {}",
                    other.name, key_field, other.schema
                )));
            }
            other.key(key_field)?
        };
        let right_key = other.key_field().unwrap_or(key_field).to_string();

        let left_type = self.schema.data_type(key_field);
        let right_type = other.schema.data_type(&right_key);
        match (left_type, right_type) {
            (Some(l), Some(r)) if r.is_assignable_from(l) => {}
            _ => {
                return Err(SpanError::JoinPrecondition(format!(
                    "key types incompatible: left '{}.{}' is {}, right '{}.{}' is {}",
                    self.name,
                    key_field,
                    left_type.map(|t| t.to_string()).unwrap_or_default(),
                    other.name,
                    right_key,
                    right_type.map(|t| t.to_string()).unwrap_or_default()
                )))
            }
        }

        let plan = op
            .plan(&self.schema, key_field, &other.schema, &right_key)
            .map_err(SpanError::operator(op.name()))?;
        events::stage(op.name(), &self.name, &plan.output);

        let right = match other.repr {
            Repr::Indexed { map, .. } => map,
            _ => {
                return Err(SpanError::Invariant(format!(
                    "right span '{}' not keyed after key()",
                    other.name
                )))
            }
        };
        let name = self.name.clone();
        let config = self.config;
        Ok(Prepared {
            name,
            config,
            left: self.into_rows(),
            right,
            plan,
        })
    }
}

/// Two-phase row source for outer joins: left rows first, then right rows
/// never claimed by a left row.
struct OuterRows<'a, J> {
    left: Option<RowIter<'a>>,
    right: IndexMap<Scalar, Container>,
    right_only: Option<indexmap::map::IntoIter<Scalar, Container>>,
    matched: HashSet<Scalar>,
    context: String,
    op_name: &'static str,
    op: J,
    plan: JoinPlan,
    config: SpanConfig,
}

impl<J: JoinOperator> OuterRows<'_, J> {
    fn emit(&mut self, pairing: Pairing) -> Result<Container> {
        let out = self
            .op
            .apply(&self.plan, pairing)
            .map_err(SpanError::operator(self.op_name))?;
        out.verify_in(&self.plan.output, &self.context)?;
        events::record(&self.config, &self.context, &out);
        Ok(out)
    }

    fn combine_left(&mut self, left: Container) -> Result<Container> {
        let key = key_of(&left, &self.plan.left_key)?;
        let pairing = match self.right.get(&key) {
            Some(right) => {
                let right = right.clone();
                self.matched.insert(key);
                Pairing::Matched(left, right)
            }
            None => Pairing::LeftOnly(left),
        };
        self.emit(pairing)
    }
}

impl<J: JoinOperator> Iterator for OuterRows<'_, J> {
    type Item = Result<Container>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(left) = self.left.as_mut() {
            match left.next() {
                Some(Ok(row)) => return Some(self.combine_left(row)),
                Some(Err(e)) => {
                    self.left = None;
                    self.right.clear();
                    return Some(Err(e));
                }
                None => {
                    self.left = None;
                    self.right_only = Some(std::mem::take(&mut self.right).into_iter());
                }
            }
        }
        let next = {
            let rest = self.right_only.as_mut()?;
            let matched = &self.matched;
            rest.find(|(key, _)| !matched.contains(key))
        };
        let (_, right) = next?;
        Some(self.emit(Pairing::RightOnly(right)))
    }
}
