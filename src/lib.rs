#![forbid(unsafe_code)]
//! mosdex: schema-checked spans and operators for building optimization
//! model objects from tabular data.
//!
//! This crate only re-exports the workspace members; see `mosdex-core` for
//! records and schemas, `mosdex-operators` for operator contracts, and
//! `mosdex-span` for the span algorithms.

pub use mosdex_core;
pub use mosdex_operators;
pub use mosdex_span;

pub mod prelude {
    pub use mosdex_core::prelude::*;
    pub use mosdex_operators::{
        add_constant, peek, AddField, FnMap, Fold, JoinOperator, JoinPlan, MapOperator,
        MapOperatorExt, MapPlan, MatchProbe, MergeJoin, NotPresent, OpError, Pairing, Probed,
        Project, Rename, Unmatched, UnmatchedKeys,
    };
    pub use mosdex_span::{Span, SpanError, SpanFactory};
}
