//! Full-table counter reconciliation.
//!
//! Each `reset_all_*_counters` recomputes every counter column of one table
//! from the same shared [`counts`](crate::counter::counts) queries the
//! incremental engine recounts from, writes only the rows whose values
//! differ, and returns the number of rows updated. Running it twice with no
//! intervening writes updates zero rows the second time; that idempotence is
//! the standing correctness check on the incremental engine.

#[cfg(test)]
mod tests;

use crate::{
    counter::counts,
    db::Db,
    model::{organization::OrganizationRef, Discardable},
    obs::sink::{self, EngineEvent},
};
use serde::Serialize;

fn record(table: &'static str, rows_updated: usize) -> usize {
    sink::record(EngineEvent::ReconcileRun {
        table,
        rows_updated: rows_updated as u64,
    });
    rows_updated
}

pub fn reset_all_communes_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .communes()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::commune_collectivities(db, row),
                    counts::commune_offices(db, row),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [collectivities, offices]) in fresh {
        if let Some(row) = db.communes.get_mut(&id) {
            if row.collectivities_count != collectivities || row.offices_count != offices {
                row.collectivities_count = collectivities;
                row.offices_count = offices;
                updated += 1;
            }
        }
    }

    record("communes", updated)
}

pub fn reset_all_epcis_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .epcis()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::epci_communes(db, row),
                    counts::epci_collectivities(db, row),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [communes, collectivities]) in fresh {
        if let Some(row) = db.epcis.get_mut(&id) {
            if row.communes_count != communes || row.collectivities_count != collectivities {
                row.communes_count = communes;
                row.collectivities_count = collectivities;
                updated += 1;
            }
        }
    }

    record("epcis", updated)
}

pub fn reset_all_departements_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .departements()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::departement_communes(db, row),
                    counts::departement_epcis(db, row),
                    counts::departement_ddfips(db, row),
                    counts::departement_collectivities(db, row),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [communes, epcis, ddfips, collectivities]) in fresh {
        if let Some(row) = db.departements.get_mut(&id) {
            let dirty = row.communes_count != communes
                || row.epcis_count != epcis
                || row.ddfips_count != ddfips
                || row.collectivities_count != collectivities;
            if dirty {
                row.communes_count = communes;
                row.epcis_count = epcis;
                row.ddfips_count = ddfips;
                row.collectivities_count = collectivities;
                updated += 1;
            }
        }
    }

    record("departements", updated)
}

pub fn reset_all_regions_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .regions()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::region_departements(db, row),
                    counts::region_communes(db, row),
                    counts::region_epcis(db, row),
                    counts::region_ddfips(db, row),
                    counts::region_collectivities(db, row),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [departements, communes, epcis, ddfips, collectivities]) in fresh {
        if let Some(row) = db.regions.get_mut(&id) {
            let dirty = row.departements_count != departements
                || row.communes_count != communes
                || row.epcis_count != epcis
                || row.ddfips_count != ddfips
                || row.collectivities_count != collectivities;
            if dirty {
                row.departements_count = departements;
                row.communes_count = communes;
                row.epcis_count = epcis;
                row.ddfips_count = ddfips;
                row.collectivities_count = collectivities;
                updated += 1;
            }
        }
    }

    record("regions", updated)
}

pub fn reset_all_collectivities_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .collectivities()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::organization_users(db, OrganizationRef::Collectivity(row.id)),
                    counts::collectivity_reports_transmitted(db, row.id),
                    counts::collectivity_reports_approved(db, row.id),
                    counts::collectivity_reports_rejected(db, row.id),
                    counts::collectivity_packages_transmitted(db, row.id),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [users, transmitted, approved, rejected, packages]) in fresh {
        if let Some(row) = db.collectivities.get_mut(&id) {
            let dirty = row.users_count != users
                || row.reports_transmitted_count != transmitted
                || row.reports_approved_count != approved
                || row.reports_rejected_count != rejected
                || row.packages_transmitted_count != packages;
            if dirty {
                row.users_count = users;
                row.reports_transmitted_count = transmitted;
                row.reports_approved_count = approved;
                row.reports_rejected_count = rejected;
                row.packages_transmitted_count = packages;
                updated += 1;
            }
        }
    }

    record("collectivities", updated)
}

pub fn reset_all_publishers_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .publishers()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::organization_users(db, OrganizationRef::Publisher(row.id)),
                    counts::publisher_collectivities(db, row.id),
                    counts::publisher_reports_transmitted(db, row.id),
                    counts::publisher_reports_approved(db, row.id),
                    counts::publisher_reports_rejected(db, row.id),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [users, collectivities, transmitted, approved, rejected]) in fresh {
        if let Some(row) = db.publishers.get_mut(&id) {
            let dirty = row.users_count != users
                || row.collectivities_count != collectivities
                || row.reports_transmitted_count != transmitted
                || row.reports_approved_count != approved
                || row.reports_rejected_count != rejected;
            if dirty {
                row.users_count = users;
                row.collectivities_count = collectivities;
                row.reports_transmitted_count = transmitted;
                row.reports_approved_count = approved;
                row.reports_rejected_count = rejected;
                updated += 1;
            }
        }
    }

    record("publishers", updated)
}

pub fn reset_all_ddfips_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .ddfips()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::organization_users(db, OrganizationRef::Ddfip(row.id)),
                    counts::ddfip_collectivities(db, row.id),
                    counts::ddfip_offices(db, row.id),
                    counts::ddfip_reports(db, row.id),
                    counts::ddfip_reports_approved(db, row.id),
                    counts::ddfip_reports_rejected(db, row.id),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [users, collectivities, offices, reports, approved, rejected]) in fresh {
        if let Some(row) = db.ddfips.get_mut(&id) {
            let dirty = row.users_count != users
                || row.collectivities_count != collectivities
                || row.offices_count != offices
                || row.reports_count != reports
                || row.reports_approved_count != approved
                || row.reports_rejected_count != rejected;
            if dirty {
                row.users_count = users;
                row.collectivities_count = collectivities;
                row.offices_count = offices;
                row.reports_count = reports;
                row.reports_approved_count = approved;
                row.reports_rejected_count = rejected;
                updated += 1;
            }
        }
    }

    record("ddfips", updated)
}

pub fn reset_all_dgfips_counters(db: &mut Db) -> usize {
    // Report tallies count toward the live DGFIP only, so they freeze while
    // a row is discarded; undiscard re-derives them. Only `users_count` stays
    // maintained on a discarded row.
    let fresh: Vec<_> = db
        .dgfips()
        .iter()
        .map(|row| {
            (
                row.id,
                row.is_discarded(),
                [
                    counts::organization_users(db, OrganizationRef::Dgfip(row.id)),
                    counts::dgfip_reports_transmitted(db),
                    counts::dgfip_reports_approved(db),
                    counts::dgfip_reports_rejected(db),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, discarded, [users, transmitted, approved, rejected]) in fresh {
        if let Some(row) = db.dgfips.get_mut(&id) {
            let mut dirty = row.users_count != users;
            if !discarded {
                dirty = dirty
                    || row.reports_transmitted_count != transmitted
                    || row.reports_approved_count != approved
                    || row.reports_rejected_count != rejected;
            }
            if dirty {
                row.users_count = users;
                if !discarded {
                    row.reports_transmitted_count = transmitted;
                    row.reports_approved_count = approved;
                    row.reports_rejected_count = rejected;
                }
                updated += 1;
            }
        }
    }

    record("dgfips", updated)
}

pub fn reset_all_offices_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .offices()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::office_communes(db, row.id),
                    counts::office_users(db, row.id),
                    counts::office_reports_assigned(db, row.id),
                    counts::office_reports_approved(db, row.id),
                    counts::office_reports_rejected(db, row.id),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [communes, users, assigned, approved, rejected]) in fresh {
        if let Some(row) = db.offices.get_mut(&id) {
            let dirty = row.communes_count != communes
                || row.users_count != users
                || row.reports_assigned_count != assigned
                || row.reports_approved_count != approved
                || row.reports_rejected_count != rejected;
            if dirty {
                row.communes_count = communes;
                row.users_count = users;
                row.reports_assigned_count = assigned;
                row.reports_approved_count = approved;
                row.reports_rejected_count = rejected;
                updated += 1;
            }
        }
    }

    record("offices", updated)
}

pub fn reset_all_packages_counters(db: &mut Db) -> usize {
    let fresh: Vec<_> = db
        .packages()
        .iter()
        .map(|row| {
            (
                row.id,
                [
                    counts::package_reports(db, row.id),
                    counts::package_reports_completed(db, row.id),
                    counts::package_reports_approved(db, row.id),
                    counts::package_reports_rejected(db, row.id),
                ],
            )
        })
        .collect();

    let mut updated = 0;
    for (id, [reports, completed, approved, rejected]) in fresh {
        if let Some(row) = db.packages.get_mut(&id) {
            let dirty = row.reports_count != reports
                || row.reports_completed_count != completed
                || row.reports_approved_count != approved
                || row.reports_rejected_count != rejected;
            if dirty {
                row.reports_count = reports;
                row.reports_completed_count = completed;
                row.reports_approved_count = approved;
                row.reports_rejected_count = rejected;
                updated += 1;
            }
        }
    }

    record("packages", updated)
}

///
/// ReconcileReport
///
/// Per-table row counts from one full run.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub communes: usize,
    pub epcis: usize,
    pub departements: usize,
    pub regions: usize,
    pub collectivities: usize,
    pub publishers: usize,
    pub ddfips: usize,
    pub dgfips: usize,
    pub offices: usize,
    pub packages: usize,
}

impl ReconcileReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.communes
            + self.epcis
            + self.departements
            + self.regions
            + self.collectivities
            + self.publishers
            + self.ddfips
            + self.dgfips
            + self.offices
            + self.packages
    }
}

/// Run every table in dependency order.
pub fn reset_all_counters(db: &mut Db) -> ReconcileReport {
    ReconcileReport {
        communes: reset_all_communes_counters(db),
        epcis: reset_all_epcis_counters(db),
        departements: reset_all_departements_counters(db),
        regions: reset_all_regions_counters(db),
        collectivities: reset_all_collectivities_counters(db),
        publishers: reset_all_publishers_counters(db),
        ddfips: reset_all_ddfips_counters(db),
        dgfips: reset_all_dgfips_counters(db),
        offices: reset_all_offices_counters(db),
        packages: reset_all_packages_counters(db),
    }
}
