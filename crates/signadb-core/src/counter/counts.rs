//! Ground-truth count queries.
//!
//! One authoritative definition per counter column, shared by the scoped
//! recount path of the incremental engine and by bulk reconciliation, so the
//! two can never drift apart. Every function tolerates dangling codes and
//! returns 0 rather than erroring.

use crate::{
    db::Db,
    hierarchy,
    model::{
        id::{CollectivityId, DdfipId, OfficeId, PackageId, PublisherId},
        organization::OrganizationRef,
        report::{Report, ReportState},
        territory::{Commune, Departement, Epci, Region, TerritoryRef},
        Discardable,
    },
};
use std::collections::BTreeSet;

#[allow(clippy::cast_possible_truncation)]
fn as_count(n: usize) -> u32 {
    n as u32
}

// ======================================================================
// Territory counters
// ======================================================================

#[must_use]
pub fn commune_collectivities(db: &Db, commune: &Commune) -> u32 {
    as_count(hierarchy::collectivities_on(db, TerritoryRef::Commune(commune.id)).len())
}

#[must_use]
pub fn commune_offices(db: &Db, commune: &Commune) -> u32 {
    let offices: BTreeSet<OfficeId> = db
        .office_communes()
        .iter()
        .filter(|join| join.code_insee == commune.code_insee)
        .filter(|join| {
            db.offices()
                .get(&join.office_id)
                .is_some_and(|office| !office.is_discarded())
        })
        .map(|join| join.office_id)
        .collect();

    as_count(offices.len())
}

#[must_use]
pub fn epci_communes(db: &Db, epci: &Epci) -> u32 {
    as_count(hierarchy::communes_of_epci(db, epci).len())
}

#[must_use]
pub fn epci_collectivities(db: &Db, epci: &Epci) -> u32 {
    as_count(hierarchy::collectivities_on(db, TerritoryRef::Epci(epci.id)).len())
}

#[must_use]
pub fn departement_communes(db: &Db, departement: &Departement) -> u32 {
    as_count(hierarchy::communes_of_departement(db, departement).len())
}

#[must_use]
pub fn departement_epcis(db: &Db, departement: &Departement) -> u32 {
    as_count(hierarchy::epcis_of_departement(db, departement).len())
}

#[must_use]
pub fn departement_ddfips(db: &Db, departement: &Departement) -> u32 {
    as_count(hierarchy::ddfips_of_departement(db, departement).len())
}

#[must_use]
pub fn departement_collectivities(db: &Db, departement: &Departement) -> u32 {
    as_count(hierarchy::collectivities_on(db, TerritoryRef::Departement(departement.id)).len())
}

#[must_use]
pub fn region_departements(db: &Db, region: &Region) -> u32 {
    as_count(hierarchy::departements_of_region(db, region).len())
}

#[must_use]
pub fn region_communes(db: &Db, region: &Region) -> u32 {
    as_count(hierarchy::communes_of_region(db, region).len())
}

#[must_use]
pub fn region_epcis(db: &Db, region: &Region) -> u32 {
    as_count(hierarchy::epcis_of_region(db, region).len())
}

#[must_use]
pub fn region_ddfips(db: &Db, region: &Region) -> u32 {
    as_count(hierarchy::ddfips_of_region(db, region).len())
}

#[must_use]
pub fn region_collectivities(db: &Db, region: &Region) -> u32 {
    as_count(hierarchy::collectivities_on(db, TerritoryRef::Region(region.id)).len())
}

// ======================================================================
// Organization membership counters
// ======================================================================

#[must_use]
pub fn organization_users(db: &Db, organization: OrganizationRef) -> u32 {
    as_count(
        db.users()
            .iter_live()
            .filter(|user| user.organization == organization)
            .count(),
    )
}

#[must_use]
pub fn publisher_collectivities(db: &Db, publisher_id: PublisherId) -> u32 {
    as_count(
        db.collectivities()
            .iter_live()
            .filter(|coll| coll.publisher_id == Some(publisher_id))
            .count(),
    )
}

/// Live collectivities registered anywhere within the DDFIP's departement.
#[must_use]
pub fn ddfip_collectivities(db: &Db, ddfip_id: DdfipId) -> u32 {
    let Some(ddfip) = db.ddfips().get(&ddfip_id) else {
        return 0;
    };
    let Some(departement) = hierarchy::departement_by_code(db, &ddfip.code_departement) else {
        return 0;
    };

    as_count(hierarchy::collectivities_on(db, TerritoryRef::Departement(departement.id)).len())
}

#[must_use]
pub fn ddfip_offices(db: &Db, ddfip_id: DdfipId) -> u32 {
    as_count(
        db.offices()
            .iter_live()
            .filter(|office| office.ddfip_id == ddfip_id)
            .count(),
    )
}

/// Join rows of the office whose `code_insee` matches an existing commune,
/// distinct per commune.
#[must_use]
pub fn office_communes(db: &Db, office_id: OfficeId) -> u32 {
    let codes: BTreeSet<_> = db
        .office_communes()
        .iter()
        .filter(|join| join.office_id == office_id)
        .filter(|join| hierarchy::commune_by_code(db, &join.code_insee).is_some())
        .map(|join| join.code_insee.clone())
        .collect();

    as_count(codes.len())
}

#[must_use]
pub fn office_users(db: &Db, office_id: OfficeId) -> u32 {
    as_count(
        db.office_users()
            .iter()
            .filter(|join| join.office_id == office_id)
            .filter(|join| {
                db.users()
                    .get(&join.user_id)
                    .is_some_and(|user| !user.is_discarded())
            })
            .count(),
    )
}

// ======================================================================
// Report counters
// ======================================================================

fn live_reports(db: &Db) -> impl Iterator<Item = &Report> {
    db.reports().iter_live()
}

/// Reports sitting with an office: assigned and not yet moved to a terminal
/// decision.
pub(crate) const fn actively_assigned(report: &Report) -> bool {
    report.assigned_at.is_some()
        && matches!(
            report.state,
            ReportState::Assigned | ReportState::Applicable | ReportState::Inapplicable
        )
}

#[must_use]
pub fn collectivity_reports_transmitted(db: &Db, id: CollectivityId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.collectivity_id == id && r.counts_as_transmitted())
            .count(),
    )
}

#[must_use]
pub fn collectivity_reports_approved(db: &Db, id: CollectivityId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.collectivity_id == id
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Approved
            })
            .count(),
    )
}

#[must_use]
pub fn collectivity_reports_rejected(db: &Db, id: CollectivityId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.collectivity_id == id
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Rejected
            })
            .count(),
    )
}

#[must_use]
pub fn collectivity_packages_transmitted(db: &Db, id: CollectivityId) -> u32 {
    as_count(
        db.packages()
            .iter_live()
            .filter(|p| p.collectivity_id == id && p.out_of_sandbox())
            .count(),
    )
}

#[must_use]
pub fn publisher_reports_transmitted(db: &Db, id: PublisherId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.publisher_id == Some(id) && r.counts_as_transmitted())
            .count(),
    )
}

#[must_use]
pub fn publisher_reports_approved(db: &Db, id: PublisherId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.publisher_id == Some(id)
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Approved
            })
            .count(),
    )
}

#[must_use]
pub fn publisher_reports_rejected(db: &Db, id: PublisherId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.publisher_id == Some(id)
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Rejected
            })
            .count(),
    )
}

#[must_use]
pub fn ddfip_reports(db: &Db, id: DdfipId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.ddfip_id == Some(id) && r.counts_as_transmitted())
            .count(),
    )
}

#[must_use]
pub fn ddfip_reports_approved(db: &Db, id: DdfipId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.ddfip_id == Some(id)
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Approved
            })
            .count(),
    )
}

#[must_use]
pub fn ddfip_reports_rejected(db: &Db, id: DdfipId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.ddfip_id == Some(id)
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Rejected
            })
            .count(),
    )
}

#[must_use]
pub fn dgfip_reports_transmitted(db: &Db) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.counts_as_transmitted())
            .count(),
    )
}

#[must_use]
pub fn dgfip_reports_approved(db: &Db) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.counts_as_transmitted() && r.state == ReportState::Approved)
            .count(),
    )
}

#[must_use]
pub fn dgfip_reports_rejected(db: &Db) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.counts_as_transmitted() && r.state == ReportState::Rejected)
            .count(),
    )
}

#[must_use]
pub fn office_reports_assigned(db: &Db, id: OfficeId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.office_id == Some(id) && r.counts_as_transmitted() && actively_assigned(r)
            })
            .count(),
    )
}

#[must_use]
pub fn office_reports_approved(db: &Db, id: OfficeId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.office_id == Some(id)
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Approved
            })
            .count(),
    )
}

#[must_use]
pub fn office_reports_rejected(db: &Db, id: OfficeId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| {
                r.office_id == Some(id)
                    && r.counts_as_transmitted()
                    && r.state == ReportState::Rejected
            })
            .count(),
    )
}

#[must_use]
pub fn package_reports(db: &Db, id: PackageId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.package_id == Some(id))
            .count(),
    )
}

#[must_use]
pub fn package_reports_completed(db: &Db, id: PackageId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.package_id == Some(id) && r.completed_at.is_some())
            .count(),
    )
}

#[must_use]
pub fn package_reports_approved(db: &Db, id: PackageId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.package_id == Some(id) && r.state == ReportState::Approved)
            .count(),
    )
}

#[must_use]
pub fn package_reports_rejected(db: &Db, id: PackageId) -> u32 {
    as_count(
        live_reports(db)
            .filter(|r| r.package_id == Some(id) && r.state == ReportState::Rejected)
            .count(),
    )
}
