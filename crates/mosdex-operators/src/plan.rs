//! Operator plans: the schemas an operator committed to before records flow.
//!
//! Plans are plain values. Once a span has a plan it never asks the operator
//! for another one, so an operator cannot change its result schema midway.

use mosdex_core::prelude::Schema;
use serde::{Deserialize, Serialize};

/// Plan for a 1-arg operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPlan {
    pub input: Schema,
    pub output: Schema,
}

impl MapPlan {
    pub fn new(input: Schema, output: Schema) -> Self {
        Self { input, output }
    }

    /// Plan whose output is the input, for pass-through operators.
    pub fn identity(input: &Schema) -> Self {
        Self {
            input: input.clone(),
            output: input.clone(),
        }
    }
}

/// Plan for a 2-arg operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPlan {
    pub left: Schema,
    pub left_key: String,
    pub right: Schema,
    pub right_key: String,
    pub output: Schema,
}

impl JoinPlan {
    pub fn new(
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
        output: Schema,
    ) -> Self {
        Self {
            left: left.clone(),
            left_key: left_key.to_string(),
            right: right.clone(),
            right_key: right_key.to_string(),
            output,
        }
    }

    /// The usual join layout: every left field, then the right fields minus
    /// the right key (its value already lives in the left key).
    pub fn merged(left: &Schema, left_key: &str, right: &Schema, right_key: &str) -> Self {
        let output = left.merge(&right.delete(&[right_key]));
        Self::new(left, left_key, right, right_key, output)
    }

    /// Same inputs, different output layout.
    pub fn with_output(mut self, output: Schema) -> Self {
        self.output = output;
        self
    }
}
