//! Pass-through operators with a per-record side effect.
//!
//! Used for observability (logging, statistics, key reports) without changing
//! what flows through the pipeline.

use mosdex_core::prelude::{Container, Schema};

use crate::plan::MapPlan;
use crate::traits::{MapOperator, OpError};

/// Identity operator that calls `f` on every record.
pub struct Peek<F> {
    f: F,
}

impl<F: FnMut(&Container)> Peek<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

/// Shorthand for [`Peek::new`].
pub fn peek<F: FnMut(&Container)>(f: F) -> Peek<F> {
    Peek::new(f)
}

impl<F: FnMut(&Container)> MapOperator for Peek<F> {
    fn name(&self) -> &'static str {
        "peek"
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        Ok(MapPlan::identity(input))
    }

    fn apply(&mut self, _plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        (self.f)(&row);
        Ok(row)
    }
}

/// An operator followed by a side effect on each of its outputs.
pub struct Inspect<M, F> {
    inner: M,
    f: F,
}

impl<M, F> MapOperator for Inspect<M, F>
where
    M: MapOperator,
    F: FnMut(&Container),
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        self.inner.plan(input)
    }

    fn apply(&mut self, plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        let out = self.inner.apply(plan, row)?;
        (self.f)(&out);
        Ok(out)
    }
}

pub trait MapOperatorExt: MapOperator + Sized {
    /// Same schema and data as `self`, plus `f` called on every output record.
    fn peek<F: FnMut(&Container)>(self, f: F) -> Inspect<Self, F> {
        Inspect { inner: self, f }
    }
}

impl<M: MapOperator> MapOperatorExt for M {}
