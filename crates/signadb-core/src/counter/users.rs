//! Counter effects of user mutations: `users_count` on the owning
//! organization, plus office membership rollups when liveness changes.

use crate::{
    counter::{CounterOp, CounterSlot},
    db::Db,
    model::{organization::OrganizationRef, user::User, Discardable},
};

const fn users_slot(organization: OrganizationRef) -> CounterSlot {
    match organization {
        OrganizationRef::Collectivity(id) => CounterSlot::CollectivityUsers(id),
        OrganizationRef::Publisher(id) => CounterSlot::PublisherUsers(id),
        OrganizationRef::Ddfip(id) => CounterSlot::DdfipUsers(id),
        OrganizationRef::Dgfip(id) => CounterSlot::DgfipUsers(id),
    }
}

pub(crate) fn plan(db: &Db, old: Option<&User>, new: Option<&User>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(user) = old.filter(|u| !u.is_discarded()) {
        ops.push(CounterOp::adjust(users_slot(user.organization), -1));
    }
    if let Some(user) = new.filter(|u| !u.is_discarded()) {
        ops.push(CounterOp::adjust(users_slot(user.organization), 1));
    }

    // Office membership counts live users; a liveness flip or a hard delete
    // changes every joined office's users_count.
    let old_live = old.is_some_and(|u| !u.is_discarded());
    let new_live = new.is_some_and(|u| !u.is_discarded());

    if old_live != new_live {
        if let Some(user) = old.or(new) {
            for join in db.office_users().iter().filter(|j| j.user_id == user.id) {
                ops.push(CounterOp::recount(CounterSlot::OfficeUsers(join.office_id)));
            }
        }
    }

    ops
}
