//! Counter effects of package mutations: only the collectivity's
//! transmitted-package tally. Member-report aggregates move when the report
//! rows themselves are stamped at transmit time.

use crate::{
    counter::{CounterOp, CounterSlot},
    db::Db,
    model::{package::Package, Discardable},
};

pub(crate) fn plan(_db: &Db, old: Option<&Package>, new: Option<&Package>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(package) = old.filter(|p| counted(p)) {
        ops.push(CounterOp::adjust(
            CounterSlot::CollectivityPackagesTransmitted(package.collectivity_id),
            -1,
        ));
    }
    if let Some(package) = new.filter(|p| counted(p)) {
        ops.push(CounterOp::adjust(
            CounterSlot::CollectivityPackagesTransmitted(package.collectivity_id),
            1,
        ));
    }

    ops
}

fn counted(package: &Package) -> bool {
    !package.is_discarded() && package.out_of_sandbox()
}
