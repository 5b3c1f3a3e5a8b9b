#![forbid(unsafe_code)]
//! mosdex-core: schemas, scalar values, and containers for the span engine.
//!
//! Everything here is pure data. Spans and operators live in
//! `mosdex-span` and `mosdex-operators`; this crate only knows how a single
//! record is shaped and how to check it against a [`Schema`].

pub mod config;
pub mod container;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod schema;
pub mod types;

pub use config::{DuplicateKeys, SpanConfig, MAX_KEYED_CAPACITY};
pub use container::Container;
pub use error::{Error, Result};
pub use schema::{DataType, Field, Schema};
pub use types::{Opaque, Scalar};
