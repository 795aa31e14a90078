//! Report state machine.
//!
//! Every operation is re-entrant: invoking a transition the row already
//! satisfies returns success with `changed = false` and leaves the row
//! byte-identical, `updated_at` included. Only the explicitly incompatible
//! origins fail, and a failure writes nothing.
//!
//! Successful transitions route the updated row through the write pipeline,
//! so the state change and its counter deltas land as one atomic step.

#[cfg(test)]
mod tests;

use crate::{
    db::Db,
    error::InternalError,
    hierarchy,
    model::{
        id::{OfficeId, PackageId, ReportId, TransmissionId},
        report::{Report, ReportState, ResolutionMotif},
    },
    obs::sink::{self, EngineEvent},
    requirements,
};
use chrono::Utc;
use thiserror::Error as ThisError;

///
/// Transition
///
/// Successful outcome. `changed = false` marks a re-entrant no-op.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transition {
    pub changed: bool,
}

///
/// TransitionError
///

#[derive(Debug, ThisError)]
pub enum TransitionError {
    /// The operation has no valid origin in the row's current state.
    /// Attaches to the `state` field; user-facing, never fatal.
    #[error("invalid transition: {operation} from {state}")]
    InvalidTransition {
        operation: &'static str,
        state: ReportState,
    },

    /// A required field or association is absent.
    #[error("missing required field: {field}")]
    Missing { field: String },

    #[error(transparent)]
    Internal(#[from] InternalError),
}

type Result<T> = std::result::Result<T, TransitionError>;

/// Fetch, mutate through the closure, commit when changed. The closure
/// returns whether the row changed; errors leave the store untouched.
fn step(
    db: &mut Db,
    id: ReportId,
    operation: &'static str,
    f: impl FnOnce(&Db, &mut Report) -> Result<bool>,
) -> Result<Transition> {
    let old = db
        .reports()
        .get(&id)
        .cloned()
        .ok_or_else(|| InternalError::store_not_found(format!("reports: {id}")))?;

    let mut new = old.clone();
    let changed = match f(db, &mut new) {
        Ok(changed) => changed,
        Err(err) => {
            if matches!(err, TransitionError::InvalidTransition { .. }) {
                sink::record(EngineEvent::InvalidTransition { operation });
            }
            return Err(err);
        }
    };

    if changed {
        new.updated_at = Utc::now();
        db.write_report(&old, new)?;
    }

    sink::record(EngineEvent::Transition { operation, changed });
    Ok(Transition { changed })
}

const fn invalid(operation: &'static str, state: ReportState) -> TransitionError {
    TransitionError::InvalidTransition { operation, state }
}

// ======================================================================
// Collectivity-side operations
// ======================================================================

/// draft → ready, guarded by the requirements service: every required field
/// for the report's form type and anomalies must be present.
pub fn complete(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "complete", |_, report| match report.state {
        ReportState::Ready => Ok(false),
        ReportState::Draft => {
            let missing = requirements::missing_fields(report);
            if let Some(field) = missing.first() {
                return Err(TransitionError::Missing {
                    field: field.to_string(),
                });
            }
            report.state = ReportState::Ready;
            report.completed_at = Some(Utc::now());
            Ok(true)
        }
        state => Err(invalid("complete", state)),
    })
}

/// ready → draft.
pub fn uncomplete(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "uncomplete", |_, report| match report.state {
        ReportState::Draft => Ok(false),
        ReportState::Ready => {
            report.state = ReportState::Draft;
            report.completed_at = None;
            Ok(true)
        }
        state => Err(invalid("uncomplete", state)),
    })
}

// ======================================================================
// DDFIP-side operations
// ======================================================================

/// transmitted → acknowledged. Later states are already past
/// acknowledgement and no-op.
pub fn acknowledge(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "acknowledge", |_, report| match report.state {
        ReportState::Transmitted => {
            report.state = ReportState::Acknowledged;
            report.acknowledged_at = Some(Utc::now());
            Ok(true)
        }
        ReportState::Draft | ReportState::Ready => Err(invalid("acknowledge", report.state)),
        _ => Ok(false),
    })
}

/// transmitted/acknowledged → accepted.
pub fn accept(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "accept", |_, report| match report.state {
        ReportState::Transmitted | ReportState::Acknowledged => {
            report.state = ReportState::Accepted;
            report.accepted_at = Some(Utc::now());
            Ok(true)
        }
        ReportState::Draft | ReportState::Ready => Err(invalid("accept", report.state)),
        _ => Ok(false),
    })
}

/// Dispatch to an office. Re-assigning an already-assigned report only moves
/// `office_id`; `assigned_at` keeps its original stamp.
pub fn assign(db: &mut Db, id: ReportId, office_id: OfficeId) -> Result<Transition> {
    step(db, id, "assign", |db, report| {
        if !db.offices().contains(&office_id) {
            return Err(TransitionError::Missing {
                field: "office".to_string(),
            });
        }

        match report.state {
            ReportState::Assigned => {
                if report.office_id == Some(office_id) {
                    Ok(false)
                } else {
                    report.office_id = Some(office_id);
                    Ok(true)
                }
            }
            ReportState::Transmitted
            | ReportState::Acknowledged
            | ReportState::Accepted
            | ReportState::Applicable
            | ReportState::Inapplicable => {
                report.state = ReportState::Assigned;
                report.office_id = Some(office_id);
                if report.assigned_at.is_none() {
                    report.assigned_at = Some(Utc::now());
                }
                Ok(true)
            }
            state => Err(invalid("assign", state)),
        }
    })
}

/// assigned → accepted, clearing the office. Fails once resolved or decided.
pub fn unassign(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "unassign", |_, report| match report.state {
        ReportState::Assigned => {
            report.state = ReportState::Accepted;
            report.assigned_at = None;
            report.office_id = None;
            Ok(true)
        }
        ReportState::Transmitted | ReportState::Acknowledged | ReportState::Accepted => Ok(false),
        state => Err(invalid("unassign", state)),
    })
}

/// Record a denial note on an assigned or accepted report. Denying again
/// only updates the response.
pub fn deny(db: &mut Db, id: ReportId, reponse: Option<String>) -> Result<Transition> {
    step(db, id, "deny", |_, report| match report.state {
        ReportState::Accepted | ReportState::Assigned => {
            let mut changed = false;
            if report.denied_at.is_none() {
                report.denied_at = Some(Utc::now());
                changed = true;
            }
            if report.reponse != reponse {
                report.reponse = reponse;
                changed = true;
            }
            Ok(changed)
        }
        state => Err(invalid("deny", state)),
    })
}

pub fn undeny(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "undeny", |_, report| {
        if report.state == ReportState::Acknowledged || report.denied_at.is_none() {
            return Ok(false);
        }
        report.denied_at = None;
        Ok(true)
    })
}

// ======================================================================
// Office-side operations
// ======================================================================

/// Office motion on an assigned report. Re-resolving with the other motif
/// switches the state and keeps the original timestamp.
pub fn resolve(db: &mut Db, id: ReportId, motif: ResolutionMotif) -> Result<Transition> {
    let target = match motif {
        ResolutionMotif::Applicable => ReportState::Applicable,
        ResolutionMotif::Inapplicable => ReportState::Inapplicable,
    };

    step(db, id, "resolve", |_, report| match report.state {
        ReportState::Assigned => {
            report.state = target;
            report.resolution_motif = Some(motif);
            report.resolved_at = Some(Utc::now());
            Ok(true)
        }
        ReportState::Applicable | ReportState::Inapplicable => {
            if report.state == target {
                Ok(false)
            } else {
                report.state = target;
                report.resolution_motif = Some(motif);
                Ok(true)
            }
        }
        state => Err(invalid("resolve", state)),
    })
}

// ======================================================================
// Decisions
// ======================================================================

/// Final DDFIP decision, taken once the report sits with an office:
/// assigned or resolved. A previously rejected report may be approved
/// directly; the rejection is cleared.
pub fn approve(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "approve", |_, report| match report.state {
        ReportState::Approved => Ok(false),
        ReportState::Assigned
        | ReportState::Applicable
        | ReportState::Inapplicable
        | ReportState::Rejected => {
            report.state = ReportState::Approved;
            report.approved_at = Some(Utc::now());
            report.rejected_at = None;
            Ok(true)
        }
        state => Err(invalid("approve", state)),
    })
}

/// approved → assigned. Fails from any other decided or pre-decision state.
pub fn unapprove(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "unapprove", |_, report| match report.state {
        ReportState::Approved => {
            report.state = ReportState::Assigned;
            report.approved_at = None;
            Ok(true)
        }
        ReportState::Assigned => Ok(false),
        state => Err(invalid("unapprove", state)),
    })
}

/// Mirror of `approve`.
pub fn reject(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "reject", |_, report| match report.state {
        ReportState::Rejected => Ok(false),
        ReportState::Assigned
        | ReportState::Applicable
        | ReportState::Inapplicable
        | ReportState::Approved => {
            report.state = ReportState::Rejected;
            report.rejected_at = Some(Utc::now());
            report.approved_at = None;
            Ok(true)
        }
        state => Err(invalid("reject", state)),
    })
}

/// rejected → assigned. Fails if the report is currently approved.
pub fn unreject(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "unreject", |_, report| match report.state {
        ReportState::Rejected => {
            report.state = ReportState::Assigned;
            report.rejected_at = None;
            Ok(true)
        }
        ReportState::Assigned => Ok(false),
        state => Err(invalid("unreject", state)),
    })
}

/// Collectivity withdrawal, valid from any unresolved transmitted state.
pub fn cancel(db: &mut Db, id: ReportId) -> Result<Transition> {
    step(db, id, "cancel", |_, report| match report.state {
        ReportState::Canceled => Ok(false),
        ReportState::Transmitted
        | ReportState::Acknowledged
        | ReportState::Accepted
        | ReportState::Assigned => {
            report.state = ReportState::Canceled;
            report.canceled_at = Some(Utc::now());
            Ok(true)
        }
        state => Err(invalid("cancel", state)),
    })
}

// ======================================================================
// Package transmission
// ======================================================================

/// Transmit a package: stamp its `transmitted_at`, then move every ready
/// member report into `transmitted`, stamping the report, assigning its
/// `"{package reference}-{ordinal}"` reference, and routing it to the DDFIP
/// covering its commune. Drafts have not passed the completeness gate and
/// stay behind. Re-transmitting an already-transmitted package is a no-op.
pub fn transmit_package(db: &mut Db, id: PackageId) -> Result<Transition> {
    let package = db
        .packages()
        .get(&id)
        .cloned()
        .ok_or_else(|| InternalError::store_not_found(format!("packages: {id}")))?;

    if package.is_transmitted() {
        sink::record(EngineEvent::Transition {
            operation: "transmit",
            changed: false,
        });
        return Ok(Transition { changed: false });
    }

    let now = Utc::now();

    let mut new_package = package.clone();
    new_package.transmitted_at = Some(now);
    db.write_package(&package, new_package)?;

    let members: Vec<ReportId> = db
        .reports()
        .iter()
        .filter(|r| r.package_id == Some(id))
        .filter(|r| r.state == ReportState::Ready)
        .map(|r| r.id)
        .collect();

    for (ordinal, report_id) in members.into_iter().enumerate() {
        let old = db
            .reports()
            .get(&report_id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found(format!("reports: {report_id}")))?;

        let mut new = old.clone();
        new.state = ReportState::Transmitted;
        new.transmitted_at = Some(now);
        new.reference = Some(format!("{}-{}", package.reference, ordinal + 1));
        new.ddfip_id = new
            .code_insee
            .as_ref()
            .and_then(|code| hierarchy::ddfip_covering(db, code))
            .map(|ddfip| ddfip.id);
        new.updated_at = now;

        db.write_report(&old, new)?;
    }

    sink::record(EngineEvent::Transition {
        operation: "transmit",
        changed: true,
    });
    Ok(Transition { changed: true })
}

/// Complete a transmission batch: stamp its `completed_at` and transmit
/// every package holding reports of the batch.
pub fn complete_transmission(db: &mut Db, id: TransmissionId) -> Result<Transition> {
    let transmission = db
        .transmissions()
        .get(&id)
        .cloned()
        .ok_or_else(|| InternalError::store_not_found(format!("transmissions: {id}")))?;

    if transmission.is_completed() {
        return Ok(Transition { changed: false });
    }

    let mut packages: Vec<PackageId> = db
        .reports()
        .iter()
        .filter(|r| r.transmission_id == Some(id))
        .filter_map(|r| r.package_id)
        .collect();
    packages.sort_unstable();
    packages.dedup();

    let mut completed = transmission;
    completed.completed_at = Some(Utc::now());
    db.write_transmission(completed)?;

    for package_id in packages {
        transmit_package(db, package_id)?;
    }

    Ok(Transition { changed: true })
}
