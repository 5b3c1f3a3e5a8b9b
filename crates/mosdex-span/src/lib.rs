#![forbid(unsafe_code)]
//! mosdex-span: schema-bound record sequences and the algorithms over them.
//!
//! A [`Span`] is a named sequence of containers sharing one [`Schema`], held
//! in one of three representations:
//! - lazy: a single-pass, pull-evaluated iterator; consuming it moves the span,
//!   so reuse after consumption does not compile,
//! - collection: an owned `Vec`, reusable (`count`, `iter`, `view`),
//! - keyed: an insertion-ordered map from a key field's value to its row.
//!
//! Transformations take the span by value and return a new span. Every
//! record crossing a transformation boundary is verified against the schema
//! the transformation derived.
//!
//! [`Schema`]: mosdex_core::Schema

mod events;
pub mod error;
pub mod factory;
mod join;
mod reduce;
pub mod span;
mod transform;

pub use error::{Result, SpanError};
pub use factory::SpanFactory;
pub use span::{RowIter, Span};
