//! Shared fixtures: a small transshipment model.
//!
//! Plants ship to warehouses, warehouses ship to customers. Every arc is a
//! `ship_<FROM>_<TO>` column with bounds; every node has a balance row.

#![allow(dead_code)]

use mosdex_core::prelude::{Container, DataType, Scalar, Schema};
use mosdex_operators::{FnMap, Fold, JoinPlan, MapPlan, OpError};
use mosdex_span::{Span, SpanFactory};

pub const ARCS: &[(&str, f64)] = &[
    ("ship_PITT_NE", 250.0),
    ("ship_PITT_SE", 250.0),
    ("ship_NE_ATL", 150.0),
    ("ship_NE_BOS", 150.0),
    ("ship_SE_ATL", 150.0),
    ("ship_SE_BOS", 150.0),
];

pub fn ship_schema() -> Schema {
    Schema::from_pairs([
        ("Column", DataType::Utf8),
        ("Name", DataType::Utf8),
        ("Variable", DataType::Any),
        ("LB", DataType::Float64),
        ("UB", DataType::Float64),
    ])
    .expect("ship schema")
}

pub fn ship_rows() -> Vec<Container> {
    ARCS.iter()
        .map(|(column, ub)| {
            Container::from_pairs([
                ("Column", Scalar::from(*column)),
                ("Name", Scalar::from(*column)),
                ("Variable", Scalar::from(format!("var:{}", column))),
                ("LB", Scalar::from(0.0)),
                ("UB", Scalar::from(*ub)),
            ])
        })
        .collect()
}

pub fn term_schema() -> Schema {
    Schema::from_pairs([
        ("Row", DataType::Utf8),
        ("Column", DataType::Utf8),
        ("Coefficient", DataType::Float64),
    ])
    .expect("term schema")
}

pub fn term(row: &str, column: &str, coefficient: f64) -> Container {
    Container::from_pairs([
        ("Row", Scalar::from(row)),
        ("Column", Scalar::from(column)),
        ("Coefficient", Scalar::from(coefficient)),
    ])
}

/// Flow leaving each node: `+1` on every outgoing arc.
pub fn balance_ship_from_rows() -> Vec<Container> {
    ARCS.iter()
        .map(|(column, _)| {
            let from = column.split('_').nth(1).unwrap_or_default();
            term(&format!("balance_{}", from), column, 1.0)
        })
        .collect()
}

/// A term on an arc the model does not have.
pub fn extra_rows() -> Vec<Container> {
    vec![
        term("balance_NE", "ship_NE_ATL", 1.0),
        term("balance_NE", "ship_NE_SE", 1.0),
    ]
}

pub fn factory() -> SpanFactory {
    SpanFactory::default()
}

pub fn ship() -> Span<'static> {
    factory()
        .wrap("ship", ship_schema(), ship_rows())
        .expect("ship span")
}

pub fn balance_ship_from() -> Span<'static> {
    factory()
        .wrap("balance_shipFrom", term_schema(), balance_ship_from_rows())
        .expect("balance span")
}

pub fn extra() -> Span<'static> {
    factory()
        .wrap("extra", term_schema(), extra_rows())
        .expect("extra span")
}

pub fn expression_schema() -> Schema {
    Schema::from_pairs([
        ("Row", DataType::Utf8),
        ("Column", DataType::Utf8),
        ("Expression", DataType::Utf8),
    ])
    .expect("expression schema")
}

/// Map operator turning a joined `(Row, Column, Coefficient, Name, ...)` row
/// into a textual `coefficient*name` product. Unmatched rows get `Null`.
pub fn product() -> FnMap<
    impl Fn(&Schema) -> Result<Schema, OpError>,
    impl FnMut(&MapPlan, Container) -> Result<Container, OpError>,
> {
    FnMap::new(
        |_input: &Schema| -> Result<Schema, OpError> { Ok(expression_schema()) },
        |plan: &MapPlan, row: Container| -> Result<Container, OpError> {
            let expression = match (row.get("Coefficient"), row.get_str("Name")) {
                (Some(coefficient), Some(name)) if !coefficient.is_null() => {
                    Scalar::from(format!("{}*{}", coefficient, name))
                }
                _ => Scalar::Null,
            };
            Ok(row.with("Expression", expression).conform(&plan.output))
        },
    )
    .named("product")
}

/// Accumulator summing `Expression` text per key: `a + b + ...`. Output keeps
/// only the key and `Expression`.
pub fn add() -> Fold<
    impl FnMut(&JoinPlan, Container) -> Result<Container, OpError>,
    impl FnMut(&JoinPlan, Container, Container) -> Result<Container, OpError>,
> {
    Fold::new(
        |plan: &JoinPlan, first: Container| -> Result<Container, OpError> {
            Ok(first.conform(&plan.output))
        },
        |plan: &JoinPlan, running: Container, next: Container| -> Result<Container, OpError> {
            let sum = format!(
                "{} + {}",
                running.get_str("Expression").unwrap_or_default(),
                next.get_str("Expression").unwrap_or_default()
            );
            Ok(running.with("Expression", sum).conform(&plan.output))
        },
    )
    .with_output(|input: &Schema, key: &str| -> Result<Schema, OpError> {
        Ok(input.select(&[key, "Expression"])?)
    })
}

pub fn int_schema() -> Schema {
    Schema::from_pairs([("id", DataType::Int64), ("value", DataType::Utf8)])
        .expect("int schema")
}

pub fn int_rows(n: i64) -> Vec<Container> {
    (0..n)
        .map(|i| {
            Container::from_pairs([
                ("id", Scalar::from(i)),
                ("value", Scalar::from(format!("v{}", i))),
            ])
        })
        .collect()
}
