//! Reusable 2-arg operators for joins.

pub mod merge;

pub use merge::MergeJoin;
