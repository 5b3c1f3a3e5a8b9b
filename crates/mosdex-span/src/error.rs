use mosdex_operators::OpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpanError>;

#[derive(Debug, Error)]
pub enum SpanError {
    /// A record or schema disagreed with the schema it had to match.
    #[error(transparent)]
    Structural(#[from] mosdex_core::Error),

    #[error("operator '{op}' failed: {source}")]
    Operator {
        op: &'static str,
        #[source]
        source: OpError,
    },

    /// An operation the span's current representation does not support, or a
    /// bad argument to a span operation.
    #[error("contract misuse: {0}")]
    Contract(String),

    /// Join inputs rejected before any record was processed.
    #[error("join precondition failed: {0}")]
    JoinPrecondition(String),

    #[error("duplicate key {key} in field '{field}' of span '{span}'")]
    DuplicateKey {
        span: String,
        field: String,
        key: String,
    },

    #[error("invariant broken: {0}")]
    Invariant(String),
}

impl SpanError {
    pub(crate) fn operator(op: &'static str) -> impl Fn(OpError) -> SpanError {
        move |source| SpanError::Operator { op, source }
    }
}
