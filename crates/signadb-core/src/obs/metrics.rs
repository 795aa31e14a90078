//! Process-local metrics state.

use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

thread_local! {
    static STATE: RefCell<MetricsState> = RefCell::new(MetricsState::default());
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsState) -> R) -> R {
    STATE.with_borrow_mut(f)
}

pub(crate) fn report() -> MetricsReport {
    STATE.with_borrow(|m| MetricsReport {
        entities: m.entities.clone(),
        counters: m.counters,
        transitions: m.transitions,
        reconcile: m.reconcile,
    })
}

pub(crate) fn reset() {
    STATE.with_borrow_mut(|m| *m = MetricsState::default());
}

///
/// MetricsState
///

#[derive(Debug, Default)]
pub(crate) struct MetricsState {
    pub entities: BTreeMap<String, EntityOps>,
    pub counters: CounterOps,
    pub transitions: TransitionOps,
    pub reconcile: ReconcileOps,
}

///
/// EntityOps
///

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct EntityOps {
    pub inserts: u64,
    pub updates: u64,
    pub discards: u64,
    pub undiscards: u64,
    pub deletes: u64,
}

///
/// CounterOps
///

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CounterOps {
    pub batches: u64,
    pub adjusted: u64,
    pub recounted: u64,
}

///
/// TransitionOps
///

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct TransitionOps {
    pub applied: u64,
    pub noops: u64,
    pub invalid: u64,
}

///
/// ReconcileOps
///

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ReconcileOps {
    pub runs: u64,
    pub rows_updated: u64,
}

///
/// MetricsReport
///
/// Point-in-time snapshot for observability surfaces.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricsReport {
    pub entities: BTreeMap<String, EntityOps>,
    pub counters: CounterOps,
    pub transitions: TransitionOps,
    pub reconcile: ReconcileOps,
}
