//! Facade crate for the signadb engine.
//!
//! ## Crate layout
//! - `core`: runtime data model, stores, hierarchy, counters, lifecycle,
//!   requirements, reconciliation, and observability.
//!
//! The `prelude` module mirrors the surface used by embedding code: the
//! domain vocabulary plus the handful of subsystem entry points.

pub use signadb_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::{
    db::Db,
    error::InternalError,
    lifecycle::{Transition, TransitionError},
    reconcile::ReconcileReport,
};

///
/// Prelude
/// domain vocabulary plus the subsystem entry points
///

pub mod prelude {
    pub use crate::core::{
        db::Db,
        hierarchy, lifecycle,
        obs::{self, EngineEvent, MetricsSink},
        prelude::*,
        reconcile, requirements,
    };
}
