//! Counter effects of collectivity mutations. The publisher side is a
//! direct ±1; the territorial side fans out to every ancestor whose
//! descendant-expanded rollup includes the collectivity's territory, and is
//! recounted rather than adjusted.

use crate::{
    counter::{CounterOp, CounterSlot},
    db::Db,
    hierarchy,
    model::{organization::Collectivity, territory::TerritoryRef, Discardable},
};

pub(crate) fn plan(db: &Db, old: Option<&Collectivity>, new: Option<&Collectivity>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(coll) = old.filter(|c| !c.is_discarded()) {
        if let Some(publisher_id) = coll.publisher_id {
            ops.push(CounterOp::adjust(
                CounterSlot::PublisherCollectivities(publisher_id),
                -1,
            ));
        }
        push_territory_recounts(db, coll.territory, &mut ops);
    }

    if let Some(coll) = new.filter(|c| !c.is_discarded()) {
        if let Some(publisher_id) = coll.publisher_id {
            ops.push(CounterOp::adjust(
                CounterSlot::PublisherCollectivities(publisher_id),
                1,
            ));
        }
        push_territory_recounts(db, coll.territory, &mut ops);
    }

    ops
}

/// Rollup slots covering a territory: the territory itself plus every
/// ancestor whose expansion reaches it, plus the DDFIPs of the departements
/// involved. Over-emitting is harmless; recounts are idempotent.
pub(crate) fn push_territory_recounts(db: &Db, territory: TerritoryRef, ops: &mut Vec<CounterOp>) {
    match territory {
        TerritoryRef::Commune(id) => {
            ops.push(CounterOp::recount(CounterSlot::CommuneCollectivities(id)));

            if let Some(commune) = db.communes().get(&id) {
                if let Some(epci) = hierarchy::epci_of(db, commune) {
                    ops.push(CounterOp::recount(CounterSlot::EpciCollectivities(epci.id)));
                }
                if let Some(dep) = hierarchy::departement_of(db, commune) {
                    push_departement_recounts(db, dep.id, ops);
                }
            }
        }
        TerritoryRef::Epci(id) => {
            ops.push(CounterOp::recount(CounterSlot::EpciCollectivities(id)));

            if let Some(epci) = db.epcis().get(&id) {
                for dep in hierarchy::departements_of_epci(db, epci) {
                    push_departement_recounts(db, dep.id, ops);
                }
            }
        }
        TerritoryRef::Departement(id) => push_departement_recounts(db, id, ops),
        TerritoryRef::Region(id) => {
            ops.push(CounterOp::recount(CounterSlot::RegionCollectivities(id)));
        }
    }
}

fn push_departement_recounts(db: &Db, id: crate::model::id::DepartementId, ops: &mut Vec<CounterOp>) {
    ops.push(CounterOp::recount(CounterSlot::DepartementCollectivities(id)));

    if let Some(dep) = db.departements().get(&id) {
        if let Some(region) = hierarchy::region_of_departement(db, dep) {
            ops.push(CounterOp::recount(CounterSlot::RegionCollectivities(region.id)));
        }
        for ddfip in hierarchy::ddfips_of_departement(db, dep) {
            ops.push(CounterOp::recount(CounterSlot::DdfipCollectivities(ddfip.id)));
        }
    }
}
