//! Metrics sink boundary.
//!
//! This module is the only bridge between engine logic and the global
//! metrics state. Tests install a scoped override to observe events without
//! mutating process-local counters.

use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// MutationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutationKind {
    Insert,
    Update,
    Discard,
    Undiscard,
    Delete,
}

///
/// EngineEvent
///

#[derive(Clone, Copy, Debug)]
pub enum EngineEvent {
    Mutation {
        entity: &'static str,
        kind: MutationKind,
    },
    CounterBatch {
        adjusted: u64,
        recounted: u64,
    },
    Transition {
        operation: &'static str,
        changed: bool,
    },
    InvalidTransition {
        operation: &'static str,
    },
    ReconcileRun {
        table: &'static str,
        rows_updated: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: EngineEvent);
}

/// GlobalMetricsSink
/// Default process-local sink writing into the global metrics state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: EngineEvent) {
        metrics::with_state_mut(|m| match event {
            EngineEvent::Mutation { entity, kind } => {
                let entry = m.entities.entry(entity.to_string()).or_default();
                match kind {
                    MutationKind::Insert => entry.inserts = entry.inserts.saturating_add(1),
                    MutationKind::Update => entry.updates = entry.updates.saturating_add(1),
                    MutationKind::Discard => entry.discards = entry.discards.saturating_add(1),
                    MutationKind::Undiscard => {
                        entry.undiscards = entry.undiscards.saturating_add(1);
                    }
                    MutationKind::Delete => entry.deletes = entry.deletes.saturating_add(1),
                }
            }
            EngineEvent::CounterBatch {
                adjusted,
                recounted,
            } => {
                m.counters.batches = m.counters.batches.saturating_add(1);
                m.counters.adjusted = m.counters.adjusted.saturating_add(adjusted);
                m.counters.recounted = m.counters.recounted.saturating_add(recounted);
            }
            EngineEvent::Transition { changed, .. } => {
                m.transitions.applied = m.transitions.applied.saturating_add(1);
                if !changed {
                    m.transitions.noops = m.transitions.noops.saturating_add(1);
                }
            }
            EngineEvent::InvalidTransition { .. } => {
                m.transitions.invalid = m.transitions.invalid.saturating_add(1);
            }
            EngineEvent::ReconcileRun { rows_updated, .. } => {
                m.reconcile.runs = m.reconcile.runs.saturating_add(1);
                m.reconcile.rows_updated = m.reconcile.rows_updated.saturating_add(rows_updated);
            }
        });
    }
}

/// Record an event through the override, or the global sink when none is
/// installed.
pub(crate) fn record(event: EngineEvent) {
    SINK_OVERRIDE.with_borrow(|sink| match sink {
        // SAFETY: the pointer is valid for the lifetime of the ScopedSink
        // guard that installed it; the guard removes it on drop.
        Some(ptr) => unsafe { (**ptr).record(event) },
        None => GlobalMetricsSink.record(event),
    });
}

///
/// ScopedSink
///
/// RAII guard routing all events on this thread to a caller-provided sink.
///

pub struct ScopedSink<'a> {
    _sink: &'a dyn MetricsSink,
}

impl<'a> ScopedSink<'a> {
    pub fn install(sink: &'a dyn MetricsSink) -> Self {
        let ptr: *const dyn MetricsSink = sink;
        // Lifetime is erased going into the thread-local; the Drop impl
        // guarantees removal before 'a ends.
        let ptr: *const (dyn MetricsSink + 'static) = unsafe { std::mem::transmute(ptr) };
        SINK_OVERRIDE.with_borrow_mut(|slot| *slot = Some(ptr));
        Self { _sink: sink }
    }
}

impl Drop for ScopedSink<'_> {
    fn drop(&mut self) {
        SINK_OVERRIDE.with_borrow_mut(|slot| *slot = None);
    }
}
