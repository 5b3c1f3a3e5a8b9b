#![forbid(unsafe_code)]
//! mosdex-operators: the transformation objects spans are parameterized by.
//!
//! Design intent:
//! - Every operator is two-phase. `plan(...)` derives the output schema from
//!   the input schema(s) and returns an immutable plan; `apply(...)` then
//!   transforms records and is handed that plan on every call. A span plans
//!   an operator exactly once per transformation, before any record flows.
//! - `MapOperator` is the 1-arg (map) shape, `JoinOperator` the 2-arg
//!   (join/reduce) shape. Joins see a [`Pairing`], so "neither side present"
//!   cannot be expressed.
//! - Post-hoc match introspection (`keys_match`, `not_present`, inner-join
//!   filtering, unmatched-key reports) lives in [`probe`], outside the
//!   operators themselves.
//! - Pure and synchronous; no threads, no I/O.

pub mod fold;
pub mod join;
pub mod map;
pub mod peek;
pub mod plan;
pub mod probe;
pub mod traits;

pub use fold::Fold;
pub use join::MergeJoin;
pub use map::{add_constant, AddField, FnMap, Project, Rename};
pub use peek::{peek, Inspect, MapOperatorExt, Peek};
pub use plan::{JoinPlan, MapPlan};
pub use probe::{MatchProbe, Probed, UnmatchedKeys, UnmatchedKeysPeek};
pub use traits::{JoinOperator, MapOperator, NotPresent, OpError, Pairing, Unmatched};
