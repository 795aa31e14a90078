//! Counter effects of DDFIP mutations: departement/region rollups plus the
//! DDFIP's own departement-scoped collectivity aggregate.

use crate::{
    counter::{CounterOp, CounterSlot},
    db::Db,
    hierarchy,
    model::{organization::Ddfip, Discardable},
};

pub(crate) fn plan(db: &Db, old: Option<&Ddfip>, new: Option<&Ddfip>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(ddfip) = old.filter(|d| !d.is_discarded()) {
        push_side(db, ddfip, -1, &mut ops);
    }
    if let Some(ddfip) = new.filter(|d| !d.is_discarded()) {
        push_side(db, ddfip, 1, &mut ops);
        ops.push(CounterOp::recount(CounterSlot::DdfipCollectivities(ddfip.id)));
    }

    ops
}

fn push_side(db: &Db, ddfip: &Ddfip, delta: i64, ops: &mut Vec<CounterOp>) {
    if let Some(dep) = hierarchy::departement_by_code(db, &ddfip.code_departement) {
        ops.push(CounterOp::adjust(CounterSlot::DepartementDdfips(dep.id), delta));

        if let Some(region) = hierarchy::region_of_departement(db, dep) {
            ops.push(CounterOp::recount(CounterSlot::RegionDdfips(region.id)));
        }
    }
}
