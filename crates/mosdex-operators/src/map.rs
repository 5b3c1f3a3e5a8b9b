//! Reusable map operators: closure-backed maps, renames, projections, and
//! added fields.

use mosdex_core::prelude::{Container, DataType, Field, Scalar, Schema};

use crate::plan::MapPlan;
use crate::traits::{MapOperator, OpError};

/// Map operator built from two closures: one derives the output schema, the
/// other transforms a record.
///
/// ```ignore
/// let product = FnMap::new(
///     |input: &Schema| Ok(input.delete(&["Coefficient"]).with_field(Field::new("Expression", DataType::Utf8))),
///     |_plan: &MapPlan, row: Container| { ... },
/// );
/// ```
pub struct FnMap<S, F> {
    name: &'static str,
    derive: S,
    row: F,
}

impl<S, F> FnMap<S, F>
where
    S: Fn(&Schema) -> Result<Schema, OpError>,
    F: FnMut(&MapPlan, Container) -> Result<Container, OpError>,
{
    pub fn new(derive: S, row: F) -> Self {
        Self {
            name: "fn_map",
            derive,
            row,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<S, F> MapOperator for FnMap<S, F>
where
    S: Fn(&Schema) -> Result<Schema, OpError>,
    F: FnMut(&MapPlan, Container) -> Result<Container, OpError>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        let output = (self.derive)(input)?;
        Ok(MapPlan::new(input.clone(), output))
    }

    fn apply(&mut self, plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        (self.row)(plan, row)
    }
}

impl<S, F> std::fmt::Debug for FnMap<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMap").field("name", &self.name).finish()
    }
}

/// Rename one field; position and type are kept.
#[derive(Debug, Clone)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl Rename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl MapOperator for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        let output = input.rename_field(&self.from, &self.to)?;
        Ok(MapPlan::new(input.clone(), output))
    }

    fn apply(&mut self, _plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        Ok(row.rename_field(&self.from, &self.to)?)
    }
}

/// Keep only the listed fields (in input order).
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub fields: Vec<String>,
}

impl Project {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl MapOperator for Project {
    fn name(&self) -> &'static str {
        "project"
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        if self.fields.is_empty() {
            return Err(OpError::Plan("project needs at least one field".into()));
        }
        let output = input.select(&self.fields)?;
        Ok(MapPlan::new(input.clone(), output))
    }

    fn apply(&mut self, plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        Ok(row.conform(&plan.output))
    }
}

/// Append one new field whose value is computed from each record.
pub struct AddField<F> {
    field: Field,
    value: F,
}

impl<F> AddField<F>
where
    F: FnMut(&Container) -> Scalar,
{
    pub fn new(name: impl Into<String>, data_type: DataType, value: F) -> Self {
        Self {
            field: Field::new(name, data_type),
            value,
        }
    }
}

/// [`AddField`] carrying the same value on every record.
pub fn add_constant(
    name: impl Into<String>,
    data_type: DataType,
    value: impl Into<Scalar>,
) -> AddField<impl FnMut(&Container) -> Scalar> {
    let value = value.into();
    AddField::new(name, data_type, move |_: &Container| value.clone())
}

impl<F> MapOperator for AddField<F>
where
    F: FnMut(&Container) -> Scalar,
{
    fn name(&self) -> &'static str {
        "add_field"
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        if input.contains_field(&self.field.name) {
            return Err(OpError::Plan(format!(
                "add_field: '{}' already exists in {}",
                self.field.name, input
            )));
        }
        Ok(MapPlan::new(input.clone(), input.with_field(self.field.clone())))
    }

    fn apply(&mut self, _plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        let value = (self.value)(&row);
        Ok(row.with(self.field.name.clone(), value))
    }
}

impl<F> std::fmt::Debug for AddField<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddField").field("field", &self.field).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship_schema() -> Schema {
        Schema::from_pairs([
            ("Column", DataType::Utf8),
            ("LowerBound", DataType::Float64),
            ("UpperBound", DataType::Float64),
        ])
        .unwrap()
    }

    fn ship_row() -> Container {
        Container::from_pairs([
            ("Column", Scalar::from("ship_PITT_NE")),
            ("LowerBound", Scalar::F64(0.0)),
            ("UpperBound", Scalar::F64(250.0)),
        ])
    }

    #[test]
    fn test_fn_map_plans_and_applies() {
        let mut op = FnMap::new(
            |input: &Schema| -> Result<Schema, OpError> {
                Ok(input.with_field(Field::new("Width", DataType::Float64)))
            },
            |_plan: &MapPlan, row: Container| -> Result<Container, OpError> {
                let lo = row.get_f64("LowerBound").unwrap_or(0.0);
                let hi = row.get_f64("UpperBound").unwrap_or(0.0);
                Ok(row.with("Width", hi - lo))
            },
        )
        .named("width");
        let plan = op.plan(&ship_schema()).unwrap();
        assert_eq!(op.name(), "width");
        let out = op.apply(&plan, ship_row()).unwrap();
        out.verify(&plan.output).unwrap();
        assert_eq!(out.get_f64("Width"), Some(250.0));
    }

    #[test]
    fn test_rename() {
        let mut op = Rename::new("Column", "Name");
        let plan = op.plan(&ship_schema()).unwrap();
        let out = op.apply(&plan, ship_row()).unwrap();
        out.verify(&plan.output).unwrap();
        assert_eq!(out.get_str("Name"), Some("ship_PITT_NE"));
        assert!(Rename::new("Nope", "X").plan(&ship_schema()).is_err());
    }

    #[test]
    fn test_project() {
        let mut op = Project::new(["UpperBound", "Column"]);
        let plan = op.plan(&ship_schema()).unwrap();
        let out = op.apply(&plan, ship_row()).unwrap();
        out.verify(&plan.output).unwrap();
        assert_eq!(out.len(), 2);
        assert!(Project::default().plan(&ship_schema()).is_err());
    }

    #[test]
    fn test_add_field() {
        let mut op = AddField::new("Width", DataType::Float64, |row: &Container| {
            let lo = row.get_f64("LowerBound").unwrap_or(0.0);
            let hi = row.get_f64("UpperBound").unwrap_or(0.0);
            Scalar::F64(hi - lo)
        });
        let plan = op.plan(&ship_schema()).unwrap();
        let out = op.apply(&plan, ship_row()).unwrap();
        out.verify(&plan.output).unwrap();
        assert_eq!(out.get_f64("Width"), Some(250.0));
        assert!(AddField::new("Column", DataType::Utf8, |_: &Container| Scalar::Null)
            .plan(&ship_schema())
            .is_err());
    }

    #[test]
    fn test_add_constant_is_type_checked_by_verify() {
        let mut op = add_constant("Sense", DataType::Utf8, 1_i64);
        let plan = op.plan(&ship_schema()).unwrap();
        let out = op.apply(&plan, ship_row()).unwrap();
        assert!(out.verify(&plan.output).is_err());

        let mut op = add_constant("Sense", DataType::Utf8, "min");
        let plan = op.plan(&ship_schema()).unwrap();
        let out = op.apply(&plan, ship_row()).unwrap();
        out.verify(&plan.output).unwrap();
        assert_eq!(out.get_str("Sense"), Some("min"));
    }
}
