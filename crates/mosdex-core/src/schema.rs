//! Logical schema types. Pure data.
//!
//! A [`Schema`] is the ordered field layout every [`Container`] in a span must
//! match. Schemas are never mutated in place; every derivation (`select`,
//! `delete`, `merge`, `rename_field`) hands back a new value.
//!
//! [`Container`]: crate::container::Container

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{hash_serde, Hash256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int64,
    Float64,
    Utf8,
    /// Handle to an object owned by an external collaborator (solver variable,
    /// expression, constraint row, ...).
    Opaque,
    /// Accepts a value of any type.
    Any,
}

impl DataType {
    /// Whether a value of type `actual` may be stored in a field declared as `self`.
    ///
    /// No numeric widening: `Int64` is not assignable to `Float64`.
    pub fn is_assignable_from(self, actual: DataType) -> bool {
        self == DataType::Any || self == actual
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Boolean => "Boolean",
            DataType::Int64 => "Int64",
            DataType::Float64 => "Float64",
            DataType::Utf8 => "Utf8",
            DataType::Opaque => "Opaque",
            DataType::Any => "Any",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered, immutable field layout. Two schemas are equal iff they have the
/// same field names, in the same order, with the same types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema; field names must be unique.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut dups = Vec::new();
        for (i, f) in fields.iter().enumerate() {
            if fields[..i].iter().any(|g| g.name == f.name) && !dups.contains(&f.name) {
                dups.push(f.name.clone());
            }
        }
        if !dups.is_empty() {
            return Err(Error::Schema(format!(
                "duplicate field names [{}]",
                dups.join(", ")
            )));
        }
        Ok(Self { fields })
    }

    /// Convenience constructor from `(name, type)` pairs.
    pub fn from_pairs<'s, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'s str, DataType)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, dt)| Field::new(name, dt))
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.field(name).map(|f| f.data_type)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Keep only `names`, in schema order. Every name must exist.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let unknown: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !self.contains_field(n))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::Schema(format!(
                "cannot select unknown fields [{}]",
                unknown.join(", ")
            )));
        }
        let fields = self
            .fields
            .iter()
            .filter(|f| names.iter().any(|n| n.as_ref() == f.name))
            .cloned()
            .collect();
        Ok(Self { fields })
    }

    /// Drop `names`; names that are not present are ignored.
    pub fn delete<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|f| !names.iter().any(|n| n.as_ref() == f.name))
            .cloned()
            .collect();
        Self { fields }
    }

    /// Right-biased merge: `self`'s fields keep their position but take
    /// `other`'s type on a name clash; `other`'s new fields are appended.
    pub fn merge(&self, other: &Schema) -> Self {
        let mut fields: Vec<Field> = self
            .fields
            .iter()
            .map(|f| other.field(&f.name).unwrap_or(f).clone())
            .collect();
        for f in &other.fields {
            if !self.contains_field(&f.name) {
                fields.push(f.clone());
            }
        }
        Self { fields }
    }

    /// Append `field`, or retype it in place if the name already exists.
    pub fn with_field(&self, field: Field) -> Self {
        self.merge(&Schema {
            fields: vec![field],
        })
    }

    pub fn rename_field(&self, old: &str, new: &str) -> Result<Self> {
        if !self.contains_field(old) {
            return Err(Error::Schema(format!(
                "cannot rename unknown field '{}'",
                old
            )));
        }
        if old != new && self.contains_field(new) {
            return Err(Error::Schema(format!(
                "cannot rename '{}' to existing field '{}'",
                old, new
            )));
        }
        let fields = self
            .fields
            .iter()
            .map(|f| {
                if f.name == old {
                    Field::new(new, f.data_type)
                } else {
                    f.clone()
                }
            })
            .collect();
        Ok(Self { fields })
    }

    /// Stable content hash, used to tell schemas apart in logs and errors.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }

    /// Fields of `self` that `other` lacks or types differently, plus fields
    /// only `other` has. Used to explain a schema mismatch.
    pub fn difference(&self, other: &Schema) -> Vec<String> {
        let mut diff: Vec<String> = self
            .fields
            .iter()
            .filter(|f| other.field(&f.name) != Some(*f))
            .map(|f| f.name.clone())
            .collect();
        for f in &other.fields {
            if !self.contains_field(&f.name) {
                diff.push(f.name.clone());
            }
        }
        if diff.is_empty() && self != other {
            // same fields, different order
            diff = self.field_names().map(str::to_string).collect();
        }
        diff
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.data_type)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> Schema {
        Schema::from_pairs([
            ("Column", DataType::Utf8),
            ("LowerBound", DataType::Float64),
            ("UpperBound", DataType::Float64),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Schema::from_pairs([("a", DataType::Utf8), ("a", DataType::Int64)]).unwrap_err();
        assert!(err.to_string().contains("duplicate field names [a]"));
    }

    #[test]
    fn test_select_keeps_schema_order() {
        let s = ship().select(&["UpperBound", "Column"]).unwrap();
        let names: Vec<&str> = s.field_names().collect();
        assert_eq!(names, vec!["Column", "UpperBound"]);
    }

    #[test]
    fn test_select_unknown_field_names_it() {
        let err = ship().select(&["Column", "Cost"]).unwrap_err();
        assert!(err.to_string().contains("Cost"));
    }

    #[test]
    fn test_delete_ignores_absent() {
        let s = ship().delete(&["LowerBound", "Nope"]);
        assert_eq!(s.len(), 2);
        assert!(!s.contains_field("LowerBound"));
    }

    #[test]
    fn test_merge_is_right_biased() {
        let left = Schema::from_pairs([("Column", DataType::Utf8), ("Value", DataType::Float64)])
            .unwrap();
        let right = Schema::from_pairs([("Value", DataType::Any), ("Row", DataType::Utf8)]).unwrap();
        let merged = left.merge(&right);
        assert_eq!(
            merged,
            Schema::from_pairs([
                ("Column", DataType::Utf8),
                ("Value", DataType::Any),
                ("Row", DataType::Utf8),
            ])
            .unwrap()
        );
        // inputs untouched
        assert_eq!(left.data_type("Value"), Some(DataType::Float64));
    }

    #[test]
    fn test_rename_field() {
        let s = ship().rename_field("Column", "Name").unwrap();
        assert_eq!(s.index_of("Name"), Some(0));
        assert!(ship().rename_field("Missing", "X").is_err());
        assert!(ship().rename_field("Column", "UpperBound").is_err());
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Schema::from_pairs([("x", DataType::Utf8), ("y", DataType::Utf8)]).unwrap();
        let b = Schema::from_pairs([("y", DataType::Utf8), ("x", DataType::Utf8)]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.difference(&b), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_assignability() {
        assert!(DataType::Any.is_assignable_from(DataType::Opaque));
        assert!(DataType::Utf8.is_assignable_from(DataType::Utf8));
        assert!(!DataType::Float64.is_assignable_from(DataType::Int64));
    }
}
