//! Closure-backed accumulator for `reduce_by_key`.
//!
//! The first row of a key seeds the accumulation; every later row is combined
//! with the running value. A reduction never presents a running value without
//! an incoming row, so receiving `Unmatched::Left` is an invariant break.

use mosdex_core::prelude::{Container, Schema};

use crate::plan::JoinPlan;
use crate::traits::{JoinOperator, OpError, Unmatched};

type DeriveFn = Box<dyn Fn(&Schema, &str) -> Result<Schema, OpError>>;

pub struct Fold<S, C> {
    derive: Option<DeriveFn>,
    seed: S,
    combine: C,
}

impl<S, C> Fold<S, C>
where
    S: FnMut(&JoinPlan, Container) -> Result<Container, OpError>,
    C: FnMut(&JoinPlan, Container, Container) -> Result<Container, OpError>,
{
    /// `seed(plan, first_row)` starts a key's accumulation and
    /// `combine(plan, running, next)` folds in each later row. The output
    /// schema defaults to the input schema.
    pub fn new(seed: S, combine: C) -> Self {
        Self {
            derive: None,
            seed,
            combine,
        }
    }

    /// Derive the output schema from `(input, key)` instead of reusing the input.
    pub fn with_output<D>(mut self, derive: D) -> Self
    where
        D: Fn(&Schema, &str) -> Result<Schema, OpError> + 'static,
    {
        self.derive = Some(Box::new(derive));
        self
    }
}

impl<S, C> JoinOperator for Fold<S, C>
where
    S: FnMut(&JoinPlan, Container) -> Result<Container, OpError>,
    C: FnMut(&JoinPlan, Container, Container) -> Result<Container, OpError>,
{
    fn name(&self) -> &'static str {
        "fold"
    }

    fn plan(
        &self,
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
    ) -> Result<JoinPlan, OpError> {
        let output = match &self.derive {
            Some(derive) => derive(left, left_key)?,
            None => left.clone(),
        };
        Ok(JoinPlan::new(left, left_key, right, right_key, output))
    }

    fn on_key_match(
        &mut self,
        plan: &JoinPlan,
        running: Container,
        next: Container,
    ) -> Result<Container, OpError> {
        (self.combine)(plan, running, next)
    }

    fn no_key_match(&mut self, plan: &JoinPlan, side: Unmatched) -> Result<Container, OpError> {
        match side {
            Unmatched::Right(first) => (self.seed)(plan, first),
            Unmatched::Left(_) => Err(OpError::Invariant(format!(
                "fold on '{}': running value without an incoming row",
                plan.left_key
            ))),
        }
    }
}

impl<S, C> std::fmt::Debug for Fold<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fold")
            .field("derives_output", &self.derive.is_some())
            .finish()
    }
}
