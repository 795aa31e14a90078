//! Write pipeline plumbing.
//!
//! Every mutation follows the same two phases: a fallible, read-only
//! `prepare` (validation plus counter planning against the pre-write state)
//! and an infallible `apply` (row write, then counter batch). Nothing is
//! written until prepare has fully succeeded, so a failed mutation leaves
//! the stores untouched.

use crate::{
    counter::{CounterBatch, CounterOp},
    db::Db,
    error::InternalError,
    obs::sink::{self, EngineEvent, MutationKind},
};

/// Commit one row mutation together with its counter batch.
pub(crate) fn commit(
    db: &mut Db,
    entity: &'static str,
    kind: MutationKind,
    ops: Vec<CounterOp>,
    write_row: impl FnOnce(&mut Db),
) -> Result<(), InternalError> {
    let batch = CounterBatch::prepare(db, ops)?;

    write_row(db);
    batch.apply(db);

    sink::record(EngineEvent::Mutation { entity, kind });

    Ok(())
}
