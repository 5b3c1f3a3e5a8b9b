use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A container disagrees with the schema it was checked against.
    #[error("Schema violation in {context}: {}", describe_violation(.missing, .extra, .mistyped))]
    Structural {
        context: String,
        missing: Vec<String>,
        extra: Vec<String>,
        mistyped: Vec<String>,
    },

    /// A schema derivation referenced fields that do not fit (unknown,
    /// duplicated, already present).
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    /// Field names a structural error complains about, in report order.
    pub fn offending_fields(&self) -> Vec<&str> {
        match self {
            Error::Structural {
                missing,
                extra,
                mistyped,
                ..
            } => missing
                .iter()
                .chain(extra)
                .map(String::as_str)
                // mistyped entries read "name (expected .., got ..)"
                .chain(mistyped.iter().map(|m| m.split(" (").next().unwrap_or(m)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn describe_violation(missing: &[String], extra: &[String], mistyped: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing fields [{}]", missing.join(", ")));
    }
    if !extra.is_empty() {
        parts.push(format!("unexpected fields [{}]", extra.join(", ")));
    }
    if !mistyped.is_empty() {
        parts.push(format!("mistyped fields [{}]", mistyped.join(", ")));
    }
    parts.join("; ")
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
