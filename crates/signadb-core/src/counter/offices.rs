//! Counter effects of office mutations and of the two office join tables.
//! The commune ↔ office join is distinct-counted on both sides and keyed by
//! a soft `code_insee` reference, so both sides recount instead of adjusting.

use crate::{
    counter::{CounterOp, CounterSlot},
    db::Db,
    hierarchy,
    model::{
        office::{Office, OfficeCommune, OfficeUser},
        Discardable,
    },
};

pub(crate) fn office_plan(db: &Db, old: Option<&Office>, new: Option<&Office>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(office) = old.filter(|o| !o.is_discarded()) {
        ops.push(CounterOp::adjust(CounterSlot::DdfipOffices(office.ddfip_id), -1));
    }
    if let Some(office) = new.filter(|o| !o.is_discarded()) {
        ops.push(CounterOp::adjust(CounterSlot::DdfipOffices(office.ddfip_id), 1));
        ops.push(CounterOp::recount(CounterSlot::OfficeCommunes(office.id)));
        ops.push(CounterOp::recount(CounterSlot::OfficeUsers(office.id)));
    }

    // A liveness flip re-evaluates the commune side of the join: discarded
    // offices stop counting toward offices_count.
    let old_live = old.is_some_and(|o| !o.is_discarded());
    let new_live = new.is_some_and(|o| !o.is_discarded());

    if old_live != new_live {
        if let Some(office) = old.or(new) {
            push_covered_commune_recounts(db, office, &mut ops);
        }
    }

    ops
}

fn push_covered_commune_recounts(db: &Db, office: &Office, ops: &mut Vec<CounterOp>) {
    for join in db
        .office_communes()
        .iter()
        .filter(|j| j.office_id == office.id)
    {
        if let Some(commune) = hierarchy::commune_by_code(db, &join.code_insee) {
            ops.push(CounterOp::recount(CounterSlot::CommuneOffices(commune.id)));
        }
    }
}

pub(crate) fn office_commune_plan(
    db: &Db,
    old: Option<&OfficeCommune>,
    new: Option<&OfficeCommune>,
) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    for join in [old, new].into_iter().flatten() {
        ops.push(CounterOp::recount(CounterSlot::OfficeCommunes(join.office_id)));

        if let Some(commune) = hierarchy::commune_by_code(db, &join.code_insee) {
            ops.push(CounterOp::recount(CounterSlot::CommuneOffices(commune.id)));
        }
    }

    ops
}

pub(crate) fn office_user_plan(
    db: &Db,
    old: Option<&OfficeUser>,
    new: Option<&OfficeUser>,
) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(join) = old.filter(|j| user_is_live(db, j)) {
        ops.push(CounterOp::adjust(CounterSlot::OfficeUsers(join.office_id), -1));
    }
    if let Some(join) = new.filter(|j| user_is_live(db, j)) {
        ops.push(CounterOp::adjust(CounterSlot::OfficeUsers(join.office_id), 1));
    }

    ops
}

fn user_is_live(db: &Db, join: &OfficeUser) -> bool {
    db.users()
        .get(&join.user_id)
        .is_some_and(|user| !user.is_discarded())
}
