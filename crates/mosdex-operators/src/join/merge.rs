//! Merge join operator.
//!
//! Output layout is `left.merge(right.delete(right_key))`. A matched pair is
//! merged right-biased; an unmatched row keeps its own fields and gets `Null`
//! for everything the missing side would have supplied. A right-only row moves
//! its key value into the left key field so every output row carries the key.

use mosdex_core::prelude::{Container, Schema};

use crate::plan::JoinPlan;
use crate::traits::{JoinOperator, OpError, Unmatched};

#[derive(Debug, Default, Clone)]
pub struct MergeJoin {
    /// Extra fields to drop from the output after merging (e.g. a coefficient
    /// that downstream operators have no use for).
    pub drop: Vec<String>,
}

impl MergeJoin {
    pub fn dropping<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            drop: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl JoinOperator for MergeJoin {
    fn name(&self) -> &'static str {
        "join_merge"
    }

    fn plan(
        &self,
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
    ) -> Result<JoinPlan, OpError> {
        if self.drop.iter().any(|f| f == left_key) {
            return Err(OpError::Plan(format!(
                "merge join cannot drop its key field '{}'",
                left_key
            )));
        }
        let plan = JoinPlan::merged(left, left_key, right, right_key);
        let output = plan.output.delete(&self.drop);
        #[cfg(feature = "tracing")]
        tracing::debug!(left_key, right_key, output = %output, "planned merge join");
        Ok(plan.with_output(output))
    }

    fn on_key_match(
        &mut self,
        plan: &JoinPlan,
        left: Container,
        right: Container,
    ) -> Result<Container, OpError> {
        let merged = left.merge(&right.delete(&[plan.right_key.as_str()]));
        Ok(merged.delete(&self.drop))
    }

    fn no_key_match(&mut self, plan: &JoinPlan, side: Unmatched) -> Result<Container, OpError> {
        match side {
            Unmatched::Left(left) => Ok(left.conform(&plan.output)),
            Unmatched::Right(right) => {
                let key = right.get(&plan.right_key).cloned().ok_or_else(|| {
                    OpError::Exec(format!(
                        "right row lacks key field '{}'",
                        plan.right_key
                    ))
                })?;
                let carried = right
                    .delete(&[plan.right_key.as_str()])
                    .with(plan.left_key.clone(), key);
                Ok(carried.conform(&plan.output))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Pairing;
    use mosdex_core::prelude::{DataType, Scalar};

    fn plan(op: &MergeJoin) -> JoinPlan {
        let left = Schema::from_pairs([
            ("Row", DataType::Utf8),
            ("Column", DataType::Utf8),
            ("Coefficient", DataType::Float64),
        ])
        .unwrap();
        let right = Schema::from_pairs([
            ("Name", DataType::Utf8),
            ("Variable", DataType::Any),
        ])
        .unwrap()
        .rename_field("Name", "Var")
        .unwrap()
        .with_field(mosdex_core::prelude::Field::new("Key", DataType::Utf8));
        op.plan(&left, "Column", &right, "Key").unwrap()
    }

    #[test]
    fn test_output_layout() {
        let op = MergeJoin::dropping(["Coefficient"]);
        let plan = plan(&op);
        let names: Vec<&str> = plan.output.field_names().collect();
        assert_eq!(names, vec!["Row", "Column", "Var", "Variable"]);
    }

    #[test]
    fn test_match_and_no_match_fill() {
        let mut op = MergeJoin::default();
        let plan = plan(&op);
        let left = Container::from_pairs([
            ("Row", Scalar::from("balance_PITT")),
            ("Column", Scalar::from("ship_PITT_NE")),
            ("Coefficient", Scalar::F64(1.0)),
        ]);
        let right = Container::from_pairs([
            ("Var", Scalar::from("ship_PITT_NE")),
            ("Variable", Scalar::from("x1")),
            ("Key", Scalar::from("ship_PITT_NE")),
        ]);

        let matched = op
            .apply(&plan, Pairing::Matched(left.clone(), right.clone()))
            .unwrap();
        matched.verify(&plan.output).unwrap();
        assert_eq!(matched.get_str("Variable"), Some("x1"));

        let left_only = op.apply(&plan, Pairing::LeftOnly(left)).unwrap();
        left_only.verify(&plan.output).unwrap();
        assert_eq!(left_only.get("Variable"), Some(&Scalar::Null));

        let right_only = op.apply(&plan, Pairing::RightOnly(right)).unwrap();
        right_only.verify(&plan.output).unwrap();
        assert_eq!(right_only.get_str("Column"), Some("ship_PITT_NE"));
        assert_eq!(right_only.get("Row"), Some(&Scalar::Null));
    }

    #[test]
    fn test_cannot_drop_key() {
        let op = MergeJoin::dropping(["Column"]);
        let left = Schema::from_pairs([("Column", DataType::Utf8)]).unwrap();
        assert!(op.plan(&left, "Column", &left, "Column").is_err());
    }
}
