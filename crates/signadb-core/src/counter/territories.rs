//! Counter effects of territory mutations.
//!
//! A commune is the pivot of the hierarchy: moving one cascades to its EPCI,
//! its departement and region, the collectivity rollups derived from all of
//! them, and the office join keyed by its `code_insee`. Direct memberships
//! are ±1 adjusts; everything derived through the commune set is recounted.

use crate::{
    counter::{CounterOp, CounterSlot},
    db::Db,
    hierarchy,
    model::{
        code::{CodeDepartement, CodeInsee, CodeRegion, Siren},
        territory::{Commune, Departement, Epci, Region},
    },
};

// ======================================================================
// Communes
// ======================================================================

pub(crate) fn commune_plan(db: &Db, old: Option<&Commune>, new: Option<&Commune>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(commune) = old {
        ops.push(CounterOp::recount(CounterSlot::CommuneCollectivities(commune.id)));
        push_commune_side(db, commune, -1, &mut ops);
    }
    if let Some(commune) = new {
        ops.push(CounterOp::recount(CounterSlot::CommuneCollectivities(commune.id)));
        ops.push(CounterOp::recount(CounterSlot::CommuneOffices(commune.id)));
        push_commune_side(db, commune, 1, &mut ops);
    }

    // The office join is keyed by code_insee; edits to the code re-evaluate
    // both sides of the join.
    let old_code = old.map(|c| &c.code_insee);
    let new_code = new.map(|c| &c.code_insee);
    if old_code != new_code {
        for code in old_code.into_iter().chain(new_code) {
            push_office_join_recounts(db, code, &mut ops);
        }
    }

    ops
}

fn push_commune_side(db: &Db, commune: &Commune, delta: i64, ops: &mut Vec<CounterOp>) {
    if let Some(epci) = commune
        .siren_epci
        .as_ref()
        .and_then(|siren| find_epci(db, siren))
    {
        ops.push(CounterOp::adjust(CounterSlot::EpciCommunes(epci.id), delta));
        ops.push(CounterOp::recount(CounterSlot::EpciCollectivities(epci.id)));
    }

    if let Some(dep) = hierarchy::departement_by_code(db, &commune.code_departement) {
        ops.push(CounterOp::adjust(CounterSlot::DepartementCommunes(dep.id), delta));
        ops.push(CounterOp::recount(CounterSlot::DepartementEpcis(dep.id)));
        ops.push(CounterOp::recount(CounterSlot::DepartementCollectivities(dep.id)));

        for ddfip in hierarchy::ddfips_of_departement(db, dep) {
            ops.push(CounterOp::recount(CounterSlot::DdfipCollectivities(ddfip.id)));
        }

        if let Some(region) = hierarchy::region_of_departement(db, dep) {
            ops.push(CounterOp::recount(CounterSlot::RegionCommunes(region.id)));
            ops.push(CounterOp::recount(CounterSlot::RegionEpcis(region.id)));
            ops.push(CounterOp::recount(CounterSlot::RegionCollectivities(region.id)));
        }
    }
}

fn push_office_join_recounts(db: &Db, code: &CodeInsee, ops: &mut Vec<CounterOp>) {
    for join in db.office_communes().iter().filter(|j| j.code_insee == *code) {
        ops.push(CounterOp::recount(CounterSlot::OfficeCommunes(join.office_id)));
    }
    if let Some(commune) = hierarchy::commune_by_code(db, code) {
        ops.push(CounterOp::recount(CounterSlot::CommuneOffices(commune.id)));
    }
}

// ======================================================================
// EPCIs
// ======================================================================

pub(crate) fn epci_plan(db: &Db, old: Option<&Epci>, new: Option<&Epci>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    // Communes may reference the SIREN before the EPCI row exists, so both
    // insert and delete re-derive the membership-dependent aggregates.
    for epci in [old, new].into_iter().flatten() {
        ops.push(CounterOp::recount(CounterSlot::EpciCommunes(epci.id)));
        ops.push(CounterOp::recount(CounterSlot::EpciCollectivities(epci.id)));
        push_membership_recounts(db, &epci.siren, &mut ops);
    }

    ops
}

fn push_membership_recounts(db: &Db, siren: &Siren, ops: &mut Vec<CounterOp>) {
    let member_codes: std::collections::BTreeSet<&CodeDepartement> = db
        .communes()
        .iter()
        .filter(|c| c.siren_epci.as_ref() == Some(siren))
        .map(|c| &c.code_departement)
        .collect();

    for code in member_codes {
        if let Some(dep) = hierarchy::departement_by_code(db, code) {
            ops.push(CounterOp::recount(CounterSlot::DepartementEpcis(dep.id)));
            ops.push(CounterOp::recount(CounterSlot::DepartementCollectivities(dep.id)));

            for ddfip in hierarchy::ddfips_of_departement(db, dep) {
                ops.push(CounterOp::recount(CounterSlot::DdfipCollectivities(ddfip.id)));
            }

            if let Some(region) = hierarchy::region_of_departement(db, dep) {
                ops.push(CounterOp::recount(CounterSlot::RegionEpcis(region.id)));
                ops.push(CounterOp::recount(CounterSlot::RegionCollectivities(region.id)));
            }
        }
    }
}

// ======================================================================
// Departements
// ======================================================================

pub(crate) fn departement_plan(
    db: &Db,
    old: Option<&Departement>,
    new: Option<&Departement>,
) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    if let Some(dep) = old {
        if let Some(region) = find_region(db, &dep.code_region) {
            ops.push(CounterOp::adjust(CounterSlot::RegionDepartements(region.id), -1));
            push_region_rollups(region.id, &mut ops);
        }
    }
    if let Some(dep) = new {
        // Communes and DDFIPs may pre-reference the code.
        ops.push(CounterOp::recount(CounterSlot::DepartementCommunes(dep.id)));
        ops.push(CounterOp::recount(CounterSlot::DepartementEpcis(dep.id)));
        ops.push(CounterOp::recount(CounterSlot::DepartementDdfips(dep.id)));
        ops.push(CounterOp::recount(CounterSlot::DepartementCollectivities(dep.id)));

        if let Some(region) = find_region(db, &dep.code_region) {
            ops.push(CounterOp::adjust(CounterSlot::RegionDepartements(region.id), 1));
            push_region_rollups(region.id, &mut ops);
        }
    }

    // A departement appearing, disappearing, or changing codes re-scopes the
    // DDFIPs attached to either code.
    for dep in [old, new].into_iter().flatten() {
        for ddfip in db
            .ddfips()
            .iter_live()
            .filter(|d| d.code_departement == dep.code_departement)
        {
            ops.push(CounterOp::recount(CounterSlot::DdfipCollectivities(ddfip.id)));
        }
    }

    ops
}

fn push_region_rollups(id: crate::model::id::RegionId, ops: &mut Vec<CounterOp>) {
    ops.push(CounterOp::recount(CounterSlot::RegionCommunes(id)));
    ops.push(CounterOp::recount(CounterSlot::RegionEpcis(id)));
    ops.push(CounterOp::recount(CounterSlot::RegionDdfips(id)));
    ops.push(CounterOp::recount(CounterSlot::RegionCollectivities(id)));
}

// ======================================================================
// Regions
// ======================================================================

pub(crate) fn region_plan(_db: &Db, old: Option<&Region>, new: Option<&Region>) -> Vec<CounterOp> {
    let mut ops = Vec::new();

    // Departements may pre-reference the region code; rebuild everything the
    // row derives on insert or code change. Deletion leaves nothing to fix.
    if let Some(region) = new {
        if old.map(|r| &r.code_region) != Some(&region.code_region) || old.is_none() {
            ops.push(CounterOp::recount(CounterSlot::RegionDepartements(region.id)));
            push_region_rollups(region.id, &mut ops);
        }
    }

    ops
}

fn find_epci<'a>(db: &'a Db, siren: &Siren) -> Option<&'a Epci> {
    db.epcis().find(|epci| epci.siren == *siren)
}

fn find_region<'a>(db: &'a Db, code: &CodeRegion) -> Option<&'a Region> {
    db.regions().find(|region| region.code_region == *code)
}
