//! Counter effects of report mutations.
//!
//! A report's counter footprint is the set of slots it currently counts
//! toward. Planning is a footprint diff between the OLD and NEW rows: every
//! slot leaving the footprint gets −1, every slot entering it gets +1, and
//! coalescing cancels the untouched ones. State transitions, soft deletion,
//! packaging, routing, and sandbox flags all reduce to the same diff.

use crate::{
    counter::{counts, CounterOp, CounterSlot},
    db::Db,
    model::{
        report::{Report, ReportState},
        Discardable,
    },
};

pub(crate) fn plan(db: &Db, old: Option<&Report>, new: Option<&Report>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(report) = old {
        for slot in footprint(db, report) {
            ops.push(CounterOp::adjust(slot, -1));
        }
    }
    if let Some(report) = new {
        for slot in footprint(db, report) {
            ops.push(CounterOp::adjust(slot, 1));
        }
    }

    ops
}

/// Slots the report currently counts toward. Discarded reports have an
/// empty footprint, which is what makes discard/undiscard and the
/// no-double-decrement rule fall out of the diff.
pub(crate) fn footprint(db: &Db, report: &Report) -> Vec<CounterSlot> {
    let mut slots = Vec::new();

    if report.is_discarded() {
        return slots;
    }

    if let Some(package_id) = report.package_id {
        slots.push(CounterSlot::PackageReports(package_id));

        if report.completed_at.is_some() {
            slots.push(CounterSlot::PackageReportsCompleted(package_id));
        }
        if report.state == ReportState::Approved {
            slots.push(CounterSlot::PackageReportsApproved(package_id));
        }
        if report.state == ReportState::Rejected {
            slots.push(CounterSlot::PackageReportsRejected(package_id));
        }
    }

    if !report.counts_as_transmitted() {
        return slots;
    }

    slots.push(CounterSlot::CollectivityReportsTransmitted(report.collectivity_id));
    if let Some(publisher_id) = report.publisher_id {
        slots.push(CounterSlot::PublisherReportsTransmitted(publisher_id));
    }
    if let Some(ddfip_id) = report.ddfip_id {
        slots.push(CounterSlot::DdfipReports(ddfip_id));
    }
    let dgfip_id = db.live_dgfip().map(|d| d.id);
    if let Some(id) = dgfip_id {
        slots.push(CounterSlot::DgfipReportsTransmitted(id));
    }

    if let Some(office_id) = report.office_id {
        if counts::actively_assigned(report) {
            slots.push(CounterSlot::OfficeReportsAssigned(office_id));
        }
    }

    match report.state {
        ReportState::Approved => {
            slots.push(CounterSlot::CollectivityReportsApproved(report.collectivity_id));
            if let Some(publisher_id) = report.publisher_id {
                slots.push(CounterSlot::PublisherReportsApproved(publisher_id));
            }
            if let Some(ddfip_id) = report.ddfip_id {
                slots.push(CounterSlot::DdfipReportsApproved(ddfip_id));
            }
            if let Some(id) = dgfip_id {
                slots.push(CounterSlot::DgfipReportsApproved(id));
            }
            if let Some(office_id) = report.office_id {
                slots.push(CounterSlot::OfficeReportsApproved(office_id));
            }
        }
        ReportState::Rejected => {
            slots.push(CounterSlot::CollectivityReportsRejected(report.collectivity_id));
            if let Some(publisher_id) = report.publisher_id {
                slots.push(CounterSlot::PublisherReportsRejected(publisher_id));
            }
            if let Some(ddfip_id) = report.ddfip_id {
                slots.push(CounterSlot::DdfipReportsRejected(ddfip_id));
            }
            if let Some(id) = dgfip_id {
                slots.push(CounterSlot::DgfipReportsRejected(id));
            }
            if let Some(office_id) = report.office_id {
                slots.push(CounterSlot::OfficeReportsRejected(office_id));
            }
        }
        _ => {}
    }

    slots
}
