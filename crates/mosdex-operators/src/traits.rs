//! Operator traits + common interfaces.
//!
//! A span calls `plan(...)` once to obtain the operator's output schema, then
//! invokes `apply(...)` per record, passing the plan back in. Operators may
//! keep private per-pipeline state (`&mut self`), so an instance belongs to a
//! single pipeline at a time.

use mosdex_core::prelude::{Container, Schema};

use crate::plan::{JoinPlan, MapPlan};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),

    /// A state the operator contract rules out was reached anyway
    /// (e.g. a reduction asked to seed from an absent value).
    #[error("operator invariant broken: {0}")]
    Invariant(String),

    #[error(transparent)]
    Schema(#[from] mosdex_core::Error),
}

/// 1-arg operator: one container in, one container out.
pub trait MapOperator {
    /// Human-readable operator name (stable), used in logs and errors.
    fn name(&self) -> &'static str {
        "map"
    }

    /// Derive the output schema. The output may reuse any subset of the input
    /// fields and add new ones.
    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError>;

    /// Transform one record. The result must have exactly `plan.output`'s fields;
    /// the span verifies it.
    fn apply(&mut self, plan: &MapPlan, row: Container) -> Result<Container, OpError>;
}

impl<M: MapOperator + ?Sized> MapOperator for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        (**self).plan(input)
    }

    fn apply(&mut self, plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        (**self).apply(plan, row)
    }
}

impl<M: MapOperator + ?Sized> MapOperator for &mut M {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        (**self).plan(input)
    }

    fn apply(&mut self, plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        (**self).apply(plan, row)
    }
}

/// Which side of a pairing is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotPresent {
    Left,
    Right,
    Neither,
}

impl NotPresent {
    pub fn as_str(self) -> &'static str {
        match self {
            NotPresent::Left => "left",
            NotPresent::Right => "right",
            NotPresent::Neither => "neither",
        }
    }
}

impl std::fmt::Display for NotPresent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of a 2-arg operator for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Pairing {
    /// Both sides carry the key.
    Matched(Container, Container),
    /// Only the left side carries the key.
    LeftOnly(Container),
    /// Only the right side carries the key.
    RightOnly(Container),
}

impl Pairing {
    pub fn keys_match(&self) -> bool {
        matches!(self, Pairing::Matched(..))
    }

    pub fn not_present(&self) -> NotPresent {
        match self {
            Pairing::Matched(..) => NotPresent::Neither,
            Pairing::LeftOnly(_) => NotPresent::Right,
            Pairing::RightOnly(_) => NotPresent::Left,
        }
    }
}

/// The single present side handed to [`JoinOperator::no_key_match`].
#[derive(Debug, Clone, PartialEq)]
pub enum Unmatched {
    /// Left row with no right partner.
    Left(Container),
    /// Right row with no left partner.
    Right(Container),
}

impl Unmatched {
    pub fn row(&self) -> &Container {
        match self {
            Unmatched::Left(c) | Unmatched::Right(c) => c,
        }
    }

    pub fn into_row(self) -> Container {
        match self {
            Unmatched::Left(c) | Unmatched::Right(c) => c,
        }
    }
}

/// 2-arg operator used by joins and reductions.
///
/// For `reduce_by_key`, the left value is the running accumulation (shaped
/// like `plan.output`) and the right value is the next input row; the first
/// row of every key arrives as `Unmatched::Right`.
pub trait JoinOperator {
    fn name(&self) -> &'static str {
        "join"
    }

    /// Derive the output schema from both inputs and their key fields.
    /// [`JoinPlan::merged`] is the usual starting point.
    fn plan(
        &self,
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
    ) -> Result<JoinPlan, OpError>;

    /// Both sides present. Must produce a record matching `plan.output`.
    fn on_key_match(
        &mut self,
        plan: &JoinPlan,
        left: Container,
        right: Container,
    ) -> Result<Container, OpError>;

    /// One side present. Fields that would have come from the absent side get
    /// a default (usually `Null`); the present side's fields and the merge key
    /// are carried over.
    fn no_key_match(&mut self, plan: &JoinPlan, side: Unmatched) -> Result<Container, OpError>;

    fn apply(&mut self, plan: &JoinPlan, pairing: Pairing) -> Result<Container, OpError> {
        match pairing {
            Pairing::Matched(left, right) => self.on_key_match(plan, left, right),
            Pairing::LeftOnly(left) => self.no_key_match(plan, Unmatched::Left(left)),
            Pairing::RightOnly(right) => self.no_key_match(plan, Unmatched::Right(right)),
        }
    }
}

impl<J: JoinOperator + ?Sized> JoinOperator for Box<J> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn plan(
        &self,
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
    ) -> Result<JoinPlan, OpError> {
        (**self).plan(left, left_key, right, right_key)
    }

    fn on_key_match(
        &mut self,
        plan: &JoinPlan,
        left: Container,
        right: Container,
    ) -> Result<Container, OpError> {
        (**self).on_key_match(plan, left, right)
    }

    fn no_key_match(&mut self, plan: &JoinPlan, side: Unmatched) -> Result<Container, OpError> {
        (**self).no_key_match(plan, side)
    }

    fn apply(&mut self, plan: &JoinPlan, pairing: Pairing) -> Result<Container, OpError> {
        (**self).apply(plan, pairing)
    }
}

impl<J: JoinOperator + ?Sized> JoinOperator for &mut J {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn plan(
        &self,
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
    ) -> Result<JoinPlan, OpError> {
        (**self).plan(left, left_key, right, right_key)
    }

    fn on_key_match(
        &mut self,
        plan: &JoinPlan,
        left: Container,
        right: Container,
    ) -> Result<Container, OpError> {
        (**self).on_key_match(plan, left, right)
    }

    fn no_key_match(&mut self, plan: &JoinPlan, side: Unmatched) -> Result<Container, OpError> {
        (**self).no_key_match(plan, side)
    }

    fn apply(&mut self, plan: &JoinPlan, pairing: Pairing) -> Result<Container, OpError> {
        (**self).apply(plan, pairing)
    }
}
