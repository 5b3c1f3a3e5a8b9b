//! Convenient re-exports for downstream crates.

pub use crate::config::{DuplicateKeys, SpanConfig, MAX_KEYED_CAPACITY};
pub use crate::container::Container;
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Opaque, Scalar};
