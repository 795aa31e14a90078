//! Entity model: territories, organizations, and the workflow entities that
//! move between them. Counter columns live directly on the owning structs,
//! maintained exclusively by the [`counter`](crate::counter) engine.

pub mod code;
pub mod id;
pub mod office;
pub mod organization;
pub mod package;
pub mod report;
pub mod territory;
pub mod transmission;
pub mod user;

use chrono::{DateTime, Utc};
use std::fmt::Display;

///
/// EntityKind
///
/// Implemented by every stored entity. `NAME` is the stable table name used
/// in errors, metrics, and reconciliation reports.
///

pub trait EntityKind: Clone {
    type Id: Copy + Ord + Display;

    const NAME: &'static str;

    fn id(&self) -> Self::Id;
}

///
/// Discardable
///
/// Soft deletion. A discarded row stays in its store but is excluded from
/// every counter predicate and every uniqueness check among live rows.
///

pub trait Discardable {
    fn discarded_at(&self) -> Option<DateTime<Utc>>;

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>);

    fn is_discarded(&self) -> bool {
        self.discarded_at().is_some()
    }
}
