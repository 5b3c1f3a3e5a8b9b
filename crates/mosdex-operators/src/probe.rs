//! Match introspection for 2-arg operators.
//!
//! [`Probed`] wraps a join operator and publishes, after every `apply`, whether
//! the keys matched and which side was absent. Readers hold a [`MatchProbe`]
//! handle to the same state. Spans are pull-based, so a consumer directly
//! downstream of the join sees the probe state for the record it was just
//! handed. The state is single-threaded and only meaningful right after the
//! apply that set it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexSet;
use mosdex_core::prelude::{Container, Scalar, Schema};

use crate::plan::{JoinPlan, MapPlan};
use crate::traits::{JoinOperator, MapOperator, NotPresent, OpError, Pairing, Unmatched};

#[derive(Debug, Default)]
struct ProbeState {
    last: Cell<Option<NotPresent>>,
    key_field: RefCell<Option<String>>,
}

/// Shared view of the last pairing a [`Probed`] operator applied.
#[derive(Debug, Clone, Default)]
pub struct MatchProbe {
    state: Rc<ProbeState>,
}

impl MatchProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff both sides were present in the last applied pairing.
    pub fn keys_match(&self) -> bool {
        self.state.last.get() == Some(NotPresent::Neither)
    }

    /// Absent side of the last applied pairing; `None` before the first apply.
    pub fn not_present(&self) -> Option<NotPresent> {
        self.state.last.get()
    }

    /// Output field holding the merge key, known once the join is planned.
    pub fn key_field(&self) -> Option<String> {
        self.state.key_field.borrow().clone()
    }

    /// Predicate keeping only records whose keys matched; filtering a left
    /// join with it yields the inner join.
    pub fn inner(&self) -> impl FnMut(&Container) -> bool + 'static {
        let probe = self.clone();
        move |_| probe.keys_match()
    }

    /// Peeking operator that records the merge key of every unmatched record
    /// into `report`: left-only keys under `left`, right-only keys under `right`.
    pub fn unmatched_keys<'r>(&self, report: &'r mut UnmatchedKeys) -> UnmatchedKeysPeek<'r> {
        UnmatchedKeysPeek {
            probe: self.clone(),
            report,
        }
    }

    fn record(&self, not_present: NotPresent) {
        self.state.last.set(Some(not_present));
    }

    fn set_key_field(&self, key: &str) {
        *self.state.key_field.borrow_mut() = Some(key.to_string());
    }
}

/// Join operator wrapper that reports each pairing to a [`MatchProbe`].
#[derive(Debug)]
pub struct Probed<J> {
    inner: J,
    probe: MatchProbe,
}

impl<J: JoinOperator> Probed<J> {
    pub fn new(inner: J) -> Self {
        Self {
            inner,
            probe: MatchProbe::new(),
        }
    }

    pub fn probe(&self) -> MatchProbe {
        self.probe.clone()
    }

    pub fn into_inner(self) -> J {
        self.inner
    }
}

impl<J: JoinOperator> JoinOperator for Probed<J> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn plan(
        &self,
        left: &Schema,
        left_key: &str,
        right: &Schema,
        right_key: &str,
    ) -> Result<JoinPlan, OpError> {
        let plan = self.inner.plan(left, left_key, right, right_key)?;
        self.probe.set_key_field(&plan.left_key);
        Ok(plan)
    }

    fn on_key_match(
        &mut self,
        plan: &JoinPlan,
        left: Container,
        right: Container,
    ) -> Result<Container, OpError> {
        self.probe.record(NotPresent::Neither);
        self.inner.on_key_match(plan, left, right)
    }

    fn no_key_match(&mut self, plan: &JoinPlan, side: Unmatched) -> Result<Container, OpError> {
        self.probe.record(match side {
            Unmatched::Left(_) => NotPresent::Right,
            Unmatched::Right(_) => NotPresent::Left,
        });
        self.inner.no_key_match(plan, side)
    }

    fn apply(&mut self, plan: &JoinPlan, pairing: Pairing) -> Result<Container, OpError> {
        self.probe.record(pairing.not_present());
        self.inner.apply(plan, pairing)
    }
}

/// Keys seen without a partner, each set in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmatchedKeys {
    left: IndexSet<Scalar>,
    right: IndexSet<Scalar>,
}

impl UnmatchedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left-side keys that found no right partner.
    pub fn left(&self) -> &IndexSet<Scalar> {
        &self.left
    }

    /// Right-side keys that found no left partner.
    pub fn right(&self) -> &IndexSet<Scalar> {
        &self.right
    }

    /// Lookup by side name, `"left"` or `"right"`.
    pub fn get(&self, side: &str) -> Option<&IndexSet<Scalar>> {
        match side {
            "left" => Some(&self.left),
            "right" => Some(&self.right),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// File `key` under the side that had it, given which side was absent.
    pub fn record(&mut self, key: Scalar, not_present: NotPresent) {
        match not_present {
            NotPresent::Right => {
                self.left.insert(key);
            }
            NotPresent::Left => {
                self.right.insert(key);
            }
            NotPresent::Neither => {}
        }
    }
}

/// Operator returned by [`MatchProbe::unmatched_keys`].
#[derive(Debug)]
pub struct UnmatchedKeysPeek<'r> {
    probe: MatchProbe,
    report: &'r mut UnmatchedKeys,
}

impl MapOperator for UnmatchedKeysPeek<'_> {
    fn name(&self) -> &'static str {
        "unmatched_keys"
    }

    fn plan(&self, input: &Schema) -> Result<MapPlan, OpError> {
        let key = self.probe.key_field().ok_or_else(|| {
            OpError::Plan("unmatched_keys: the probed join has not been planned yet".into())
        })?;
        if !input.contains_field(&key) {
            return Err(OpError::Plan(format!(
                "unmatched_keys: join output lacks key field '{}'",
                key
            )));
        }
        Ok(MapPlan::identity(input))
    }

    fn apply(&mut self, _plan: &MapPlan, row: Container) -> Result<Container, OpError> {
        if let Some(not_present) = self.probe.not_present() {
            if not_present != NotPresent::Neither {
                let key = self.probe.key_field().unwrap_or_default();
                let value = row.get(&key).cloned().unwrap_or(Scalar::Null);
                #[cfg(feature = "tracing")]
                tracing::trace!(key = %key, value = %value, absent = %not_present, "unmatched key");
                self.report.record(value, not_present);
            }
        }
        Ok(row)
    }
}
