//! Containers: ordered, immutable name -> value tuples.
//!
//! A container becomes a *record* once it has been checked against a schema
//! with [`Container::verify`]. Spans call `verify` on every row that crosses a
//! transformation boundary, so a container that passed through a span is known
//! to have exactly the fields its schema declares.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::Scalar;

/// Equality is positional: two containers are equal only when they hold the
/// same fields in the same order with equal values, like [`Schema`].
#[derive(Debug, Clone, Default, Eq)]
pub struct Container {
    values: IndexMap<String, Scalar>,
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len() && self.values.iter().eq(other.values.iter())
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Scalar>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Scalar::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Scalar::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Scalar::as_i64)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy with `name` set to `value` (appended if new, replaced in place otherwise).
    pub fn with(&self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        let mut values = self.values.clone();
        values.insert(name.into(), value.into());
        Self { values }
    }

    /// Copy holding only `names`. Unknown names are ignored.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| names.iter().any(|n| n.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { values }
    }

    /// Copy without `names`. Unknown names are ignored.
    pub fn delete<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| !names.iter().any(|n| n.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { values }
    }

    /// Right-biased merge, mirroring [`Schema::merge`].
    pub fn merge(&self, other: &Container) -> Self {
        let mut values = self.values.clone();
        for (k, v) in &other.values {
            values.insert(k.clone(), v.clone());
        }
        Self { values }
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
        let values = self
            .values
            .iter()
            .map(|(k, v)| {
                let k = if k == old { new.to_string() } else { k.clone() };
                (k, v.clone())
            })
            .collect();
        Ok(Self { values })
    }

    /// Lay the container out in `schema` order: fields the schema lacks are
    /// dropped, fields the container lacks become `Null`.
    pub fn conform(&self, schema: &Schema) -> Self {
        let values = schema
            .field_names()
            .map(|name| {
                let v = self.values.get(name).cloned().unwrap_or(Scalar::Null);
                (name.to_string(), v)
            })
            .collect();
        Self { values }
    }

    /// Check this container against `schema`: exactly the schema's field set,
    /// and every non-null value assignable to its declared type.
    pub fn verify(&self, schema: &Schema) -> Result<()> {
        self.verify_in(schema, "record")
    }

    /// Like [`verify`](Self::verify), with `context` naming where the check ran
    /// (span name, operator name) in the error.
    pub fn verify_in(&self, schema: &Schema, context: &str) -> Result<()> {
        let mut missing = Vec::new();
        let mut mistyped = Vec::new();
        for field in schema.fields() {
            match self.values.get(&field.name) {
                None => missing.push(field.name.clone()),
                Some(v) if !v.fits(field.data_type) => mistyped.push(format!(
                    "{} (expected {}, got {})",
                    field.name,
                    field.data_type,
                    v.data_type()
                        .map(|dt| dt.to_string())
                        .unwrap_or_else(|| "null".to_string())
                )),
                Some(_) => {}
            }
        }
        let extra: Vec<String> = self
            .values
            .keys()
            .filter(|k| !schema.contains_field(k))
            .cloned()
            .collect();
        if missing.is_empty() && extra.is_empty() && mistyped.is_empty() {
            return Ok(());
        }
        Err(Error::Structural {
            context: context.to_string(),
            missing,
            extra,
            mistyped,
        })
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.values)?)
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Container {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn balance_schema() -> Schema {
        Schema::from_pairs([
            ("Row", DataType::Utf8),
            ("Column", DataType::Utf8),
            ("Coefficient", DataType::Float64),
        ])
        .unwrap()
    }

    fn term() -> Container {
        Container::from_pairs([
            ("Row", Scalar::from("balance_PITT")),
            ("Column", Scalar::from("ship_PITT_NE")),
            ("Coefficient", Scalar::F64(1.0)),
        ])
    }

    #[test]
    fn test_verify_accepts_matching_record() {
        term().verify(&balance_schema()).unwrap();
        term()
            .with("Coefficient", Scalar::Null)
            .verify(&balance_schema())
            .unwrap();
    }

    #[test]
    fn test_verify_reports_every_offender() {
        let bad = term()
            .delete(&["Row"])
            .with("Extra", 3i64)
            .with("Coefficient", "one");
        let err = bad.verify_in(&balance_schema(), "balance_shipFrom").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("balance_shipFrom"));
        assert!(msg.contains("missing fields [Row]"));
        assert!(msg.contains("unexpected fields [Extra]"));
        assert!(msg.contains("Coefficient (expected Float64, got Utf8)"));
        assert_eq!(err.offending_fields().len(), 3);
    }

    #[test]
    fn test_derivations_do_not_mutate() {
        let original = term();
        let renamed = original.rename_field("Column", "Variable").unwrap();
        assert!(original.contains_field("Column"));
        assert!(renamed.contains_field("Variable"));
        assert_eq!(renamed.field_names().nth(1), Some("Variable"));
    }

    #[test]
    fn test_conform_fills_nulls_in_schema_order() {
        let schema = Schema::from_pairs([
            ("Coefficient", DataType::Float64),
            ("Name", DataType::Utf8),
        ])
        .unwrap();
        let c = term().conform(&schema);
        assert_eq!(c.field_names().collect::<Vec<_>>(), vec!["Coefficient", "Name"]);
        assert_eq!(c.get("Name"), Some(&Scalar::Null));
        c.verify(&schema).unwrap();
    }

    #[test]
    fn test_equality_follows_field_order() {
        let reordered = Container::from_pairs([
            ("Column", Scalar::from("ship_PITT_NE")),
            ("Row", Scalar::from("balance_PITT")),
            ("Coefficient", Scalar::F64(1.0)),
        ]);
        assert_ne!(term(), reordered);
        assert_eq!(term(), reordered.conform(&balance_schema()));
    }

    #[test]
    fn test_to_json() {
        let json = term().to_json().unwrap();
        assert_eq!(json["Column"], serde_json::json!({"Str": "ship_PITT_NE"}));
    }
}
