//! Counter maintenance engine.
//!
//! Every mutation is described to the engine as an `(old, new)` row pair —
//! the OLD/NEW rows of the source system's trigger functions. One handler
//! module per child entity plans a batch of [`CounterOp`]s; the write
//! pipeline validates the batch against the pre-write state, writes the row,
//! then applies the batch infallibly.
//!
//! Two op kinds exist on purpose:
//! - [`CounterOp::Adjust`] carries an exact ±N delta for counters whose
//!   membership is a direct single-row predicate. Underflow is detected at
//!   plan time and aborts the whole mutation.
//! - [`CounterOp::Recount`] re-evaluates a transitively derived aggregate
//!   (EPCI membership, descendant-expanded collectivity rollups) from the
//!   shared [`counts`] queries after the row write.

pub mod counts;

pub(crate) mod collectivities;
pub(crate) mod ddfips;
pub(crate) mod offices;
pub(crate) mod packages;
pub(crate) mod reports;
pub(crate) mod territories;
pub(crate) mod users;

#[cfg(test)]
mod tests;

use crate::{
    db::Db,
    error::InternalError,
    model::id::{
        CollectivityId, CommuneId, DdfipId, DepartementId, DgfipId, EpciId, OfficeId, PackageId,
        PublisherId, RegionId,
    },
    obs::sink::{self, EngineEvent},
};
use std::collections::BTreeMap;

///
/// CounterSlot
///
/// Address of one counter column on one row. The engine's only write
/// surface into counter columns.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum CounterSlot {
    CommuneCollectivities(CommuneId),
    CommuneOffices(CommuneId),
    EpciCommunes(EpciId),
    EpciCollectivities(EpciId),
    DepartementCommunes(DepartementId),
    DepartementEpcis(DepartementId),
    DepartementDdfips(DepartementId),
    DepartementCollectivities(DepartementId),
    RegionDepartements(RegionId),
    RegionCommunes(RegionId),
    RegionEpcis(RegionId),
    RegionDdfips(RegionId),
    RegionCollectivities(RegionId),
    CollectivityUsers(CollectivityId),
    CollectivityReportsTransmitted(CollectivityId),
    CollectivityReportsApproved(CollectivityId),
    CollectivityReportsRejected(CollectivityId),
    CollectivityPackagesTransmitted(CollectivityId),
    PublisherUsers(PublisherId),
    PublisherCollectivities(PublisherId),
    PublisherReportsTransmitted(PublisherId),
    PublisherReportsApproved(PublisherId),
    PublisherReportsRejected(PublisherId),
    DdfipUsers(DdfipId),
    DdfipCollectivities(DdfipId),
    DdfipOffices(DdfipId),
    DdfipReports(DdfipId),
    DdfipReportsApproved(DdfipId),
    DdfipReportsRejected(DdfipId),
    DgfipUsers(DgfipId),
    DgfipReportsTransmitted(DgfipId),
    DgfipReportsApproved(DgfipId),
    DgfipReportsRejected(DgfipId),
    OfficeCommunes(OfficeId),
    OfficeUsers(OfficeId),
    OfficeReportsAssigned(OfficeId),
    OfficeReportsApproved(OfficeId),
    OfficeReportsRejected(OfficeId),
    PackageReports(PackageId),
    PackageReportsCompleted(PackageId),
    PackageReportsApproved(PackageId),
    PackageReportsRejected(PackageId),
}

impl CounterSlot {
    /// Current stored value, `None` when the parent row does not exist
    /// (a dangling soft reference; the op is dropped, not an error).
    #[must_use]
    pub fn read(self, db: &Db) -> Option<u32> {
        match self {
            Self::CommuneCollectivities(id) => db.communes().get(&id).map(|r| r.collectivities_count),
            Self::CommuneOffices(id) => db.communes().get(&id).map(|r| r.offices_count),
            Self::EpciCommunes(id) => db.epcis().get(&id).map(|r| r.communes_count),
            Self::EpciCollectivities(id) => db.epcis().get(&id).map(|r| r.collectivities_count),
            Self::DepartementCommunes(id) => db.departements().get(&id).map(|r| r.communes_count),
            Self::DepartementEpcis(id) => db.departements().get(&id).map(|r| r.epcis_count),
            Self::DepartementDdfips(id) => db.departements().get(&id).map(|r| r.ddfips_count),
            Self::DepartementCollectivities(id) => {
                db.departements().get(&id).map(|r| r.collectivities_count)
            }
            Self::RegionDepartements(id) => db.regions().get(&id).map(|r| r.departements_count),
            Self::RegionCommunes(id) => db.regions().get(&id).map(|r| r.communes_count),
            Self::RegionEpcis(id) => db.regions().get(&id).map(|r| r.epcis_count),
            Self::RegionDdfips(id) => db.regions().get(&id).map(|r| r.ddfips_count),
            Self::RegionCollectivities(id) => db.regions().get(&id).map(|r| r.collectivities_count),
            Self::CollectivityUsers(id) => db.collectivities().get(&id).map(|r| r.users_count),
            Self::CollectivityReportsTransmitted(id) => {
                db.collectivities().get(&id).map(|r| r.reports_transmitted_count)
            }
            Self::CollectivityReportsApproved(id) => {
                db.collectivities().get(&id).map(|r| r.reports_approved_count)
            }
            Self::CollectivityReportsRejected(id) => {
                db.collectivities().get(&id).map(|r| r.reports_rejected_count)
            }
            Self::CollectivityPackagesTransmitted(id) => {
                db.collectivities().get(&id).map(|r| r.packages_transmitted_count)
            }
            Self::PublisherUsers(id) => db.publishers().get(&id).map(|r| r.users_count),
            Self::PublisherCollectivities(id) => {
                db.publishers().get(&id).map(|r| r.collectivities_count)
            }
            Self::PublisherReportsTransmitted(id) => {
                db.publishers().get(&id).map(|r| r.reports_transmitted_count)
            }
            Self::PublisherReportsApproved(id) => {
                db.publishers().get(&id).map(|r| r.reports_approved_count)
            }
            Self::PublisherReportsRejected(id) => {
                db.publishers().get(&id).map(|r| r.reports_rejected_count)
            }
            Self::DdfipUsers(id) => db.ddfips().get(&id).map(|r| r.users_count),
            Self::DdfipCollectivities(id) => db.ddfips().get(&id).map(|r| r.collectivities_count),
            Self::DdfipOffices(id) => db.ddfips().get(&id).map(|r| r.offices_count),
            Self::DdfipReports(id) => db.ddfips().get(&id).map(|r| r.reports_count),
            Self::DdfipReportsApproved(id) => {
                db.ddfips().get(&id).map(|r| r.reports_approved_count)
            }
            Self::DdfipReportsRejected(id) => {
                db.ddfips().get(&id).map(|r| r.reports_rejected_count)
            }
            Self::DgfipUsers(id) => db.dgfips().get(&id).map(|r| r.users_count),
            Self::DgfipReportsTransmitted(id) => {
                db.dgfips().get(&id).map(|r| r.reports_transmitted_count)
            }
            Self::DgfipReportsApproved(id) => {
                db.dgfips().get(&id).map(|r| r.reports_approved_count)
            }
            Self::DgfipReportsRejected(id) => {
                db.dgfips().get(&id).map(|r| r.reports_rejected_count)
            }
            Self::OfficeCommunes(id) => db.offices().get(&id).map(|r| r.communes_count),
            Self::OfficeUsers(id) => db.offices().get(&id).map(|r| r.users_count),
            Self::OfficeReportsAssigned(id) => {
                db.offices().get(&id).map(|r| r.reports_assigned_count)
            }
            Self::OfficeReportsApproved(id) => {
                db.offices().get(&id).map(|r| r.reports_approved_count)
            }
            Self::OfficeReportsRejected(id) => {
                db.offices().get(&id).map(|r| r.reports_rejected_count)
            }
            Self::PackageReports(id) => db.packages().get(&id).map(|r| r.reports_count),
            Self::PackageReportsCompleted(id) => {
                db.packages().get(&id).map(|r| r.reports_completed_count)
            }
            Self::PackageReportsApproved(id) => {
                db.packages().get(&id).map(|r| r.reports_approved_count)
            }
            Self::PackageReportsRejected(id) => {
                db.packages().get(&id).map(|r| r.reports_rejected_count)
            }
        }
    }

    /// Write the stored value; silently a no-op when the parent row is gone.
    pub(crate) fn write(self, db: &mut Db, value: u32) {
        match self {
            Self::CommuneCollectivities(id) => {
                if let Some(r) = db.communes.get_mut(&id) {
                    r.collectivities_count = value;
                }
            }
            Self::CommuneOffices(id) => {
                if let Some(r) = db.communes.get_mut(&id) {
                    r.offices_count = value;
                }
            }
            Self::EpciCommunes(id) => {
                if let Some(r) = db.epcis.get_mut(&id) {
                    r.communes_count = value;
                }
            }
            Self::EpciCollectivities(id) => {
                if let Some(r) = db.epcis.get_mut(&id) {
                    r.collectivities_count = value;
                }
            }
            Self::DepartementCommunes(id) => {
                if let Some(r) = db.departements.get_mut(&id) {
                    r.communes_count = value;
                }
            }
            Self::DepartementEpcis(id) => {
                if let Some(r) = db.departements.get_mut(&id) {
                    r.epcis_count = value;
                }
            }
            Self::DepartementDdfips(id) => {
                if let Some(r) = db.departements.get_mut(&id) {
                    r.ddfips_count = value;
                }
            }
            Self::DepartementCollectivities(id) => {
                if let Some(r) = db.departements.get_mut(&id) {
                    r.collectivities_count = value;
                }
            }
            Self::RegionDepartements(id) => {
                if let Some(r) = db.regions.get_mut(&id) {
                    r.departements_count = value;
                }
            }
            Self::RegionCommunes(id) => {
                if let Some(r) = db.regions.get_mut(&id) {
                    r.communes_count = value;
                }
            }
            Self::RegionEpcis(id) => {
                if let Some(r) = db.regions.get_mut(&id) {
                    r.epcis_count = value;
                }
            }
            Self::RegionDdfips(id) => {
                if let Some(r) = db.regions.get_mut(&id) {
                    r.ddfips_count = value;
                }
            }
            Self::RegionCollectivities(id) => {
                if let Some(r) = db.regions.get_mut(&id) {
                    r.collectivities_count = value;
                }
            }
            Self::CollectivityUsers(id) => {
                if let Some(r) = db.collectivities.get_mut(&id) {
                    r.users_count = value;
                }
            }
            Self::CollectivityReportsTransmitted(id) => {
                if let Some(r) = db.collectivities.get_mut(&id) {
                    r.reports_transmitted_count = value;
                }
            }
            Self::CollectivityReportsApproved(id) => {
                if let Some(r) = db.collectivities.get_mut(&id) {
                    r.reports_approved_count = value;
                }
            }
            Self::CollectivityReportsRejected(id) => {
                if let Some(r) = db.collectivities.get_mut(&id) {
                    r.reports_rejected_count = value;
                }
            }
            Self::CollectivityPackagesTransmitted(id) => {
                if let Some(r) = db.collectivities.get_mut(&id) {
                    r.packages_transmitted_count = value;
                }
            }
            Self::PublisherUsers(id) => {
                if let Some(r) = db.publishers.get_mut(&id) {
                    r.users_count = value;
                }
            }
            Self::PublisherCollectivities(id) => {
                if let Some(r) = db.publishers.get_mut(&id) {
                    r.collectivities_count = value;
                }
            }
            Self::PublisherReportsTransmitted(id) => {
                if let Some(r) = db.publishers.get_mut(&id) {
                    r.reports_transmitted_count = value;
                }
            }
            Self::PublisherReportsApproved(id) => {
                if let Some(r) = db.publishers.get_mut(&id) {
                    r.reports_approved_count = value;
                }
            }
            Self::PublisherReportsRejected(id) => {
                if let Some(r) = db.publishers.get_mut(&id) {
                    r.reports_rejected_count = value;
                }
            }
            Self::DdfipUsers(id) => {
                if let Some(r) = db.ddfips.get_mut(&id) {
                    r.users_count = value;
                }
            }
            Self::DdfipCollectivities(id) => {
                if let Some(r) = db.ddfips.get_mut(&id) {
                    r.collectivities_count = value;
                }
            }
            Self::DdfipOffices(id) => {
                if let Some(r) = db.ddfips.get_mut(&id) {
                    r.offices_count = value;
                }
            }
            Self::DdfipReports(id) => {
                if let Some(r) = db.ddfips.get_mut(&id) {
                    r.reports_count = value;
                }
            }
            Self::DdfipReportsApproved(id) => {
                if let Some(r) = db.ddfips.get_mut(&id) {
                    r.reports_approved_count = value;
                }
            }
            Self::DdfipReportsRejected(id) => {
                if let Some(r) = db.ddfips.get_mut(&id) {
                    r.reports_rejected_count = value;
                }
            }
            Self::DgfipUsers(id) => {
                if let Some(r) = db.dgfips.get_mut(&id) {
                    r.users_count = value;
                }
            }
            Self::DgfipReportsTransmitted(id) => {
                if let Some(r) = db.dgfips.get_mut(&id) {
                    r.reports_transmitted_count = value;
                }
            }
            Self::DgfipReportsApproved(id) => {
                if let Some(r) = db.dgfips.get_mut(&id) {
                    r.reports_approved_count = value;
                }
            }
            Self::DgfipReportsRejected(id) => {
                if let Some(r) = db.dgfips.get_mut(&id) {
                    r.reports_rejected_count = value;
                }
            }
            Self::OfficeCommunes(id) => {
                if let Some(r) = db.offices.get_mut(&id) {
                    r.communes_count = value;
                }
            }
            Self::OfficeUsers(id) => {
                if let Some(r) = db.offices.get_mut(&id) {
                    r.users_count = value;
                }
            }
            Self::OfficeReportsAssigned(id) => {
                if let Some(r) = db.offices.get_mut(&id) {
                    r.reports_assigned_count = value;
                }
            }
            Self::OfficeReportsApproved(id) => {
                if let Some(r) = db.offices.get_mut(&id) {
                    r.reports_approved_count = value;
                }
            }
            Self::OfficeReportsRejected(id) => {
                if let Some(r) = db.offices.get_mut(&id) {
                    r.reports_rejected_count = value;
                }
            }
            Self::PackageReports(id) => {
                if let Some(r) = db.packages.get_mut(&id) {
                    r.reports_count = value;
                }
            }
            Self::PackageReportsCompleted(id) => {
                if let Some(r) = db.packages.get_mut(&id) {
                    r.reports_completed_count = value;
                }
            }
            Self::PackageReportsApproved(id) => {
                if let Some(r) = db.packages.get_mut(&id) {
                    r.reports_approved_count = value;
                }
            }
            Self::PackageReportsRejected(id) => {
                if let Some(r) = db.packages.get_mut(&id) {
                    r.reports_rejected_count = value;
                }
            }
        }
    }

    /// Recompute the slot's true value from the shared count queries.
    #[must_use]
    pub fn ground_truth(self, db: &Db) -> u32 {
        match self {
            Self::CommuneCollectivities(id) => db
                .communes()
                .get(&id)
                .map_or(0, |r| counts::commune_collectivities(db, r)),
            Self::CommuneOffices(id) => db
                .communes()
                .get(&id)
                .map_or(0, |r| counts::commune_offices(db, r)),
            Self::EpciCommunes(id) => {
                db.epcis().get(&id).map_or(0, |r| counts::epci_communes(db, r))
            }
            Self::EpciCollectivities(id) => db
                .epcis()
                .get(&id)
                .map_or(0, |r| counts::epci_collectivities(db, r)),
            Self::DepartementCommunes(id) => db
                .departements()
                .get(&id)
                .map_or(0, |r| counts::departement_communes(db, r)),
            Self::DepartementEpcis(id) => db
                .departements()
                .get(&id)
                .map_or(0, |r| counts::departement_epcis(db, r)),
            Self::DepartementDdfips(id) => db
                .departements()
                .get(&id)
                .map_or(0, |r| counts::departement_ddfips(db, r)),
            Self::DepartementCollectivities(id) => db
                .departements()
                .get(&id)
                .map_or(0, |r| counts::departement_collectivities(db, r)),
            Self::RegionDepartements(id) => db
                .regions()
                .get(&id)
                .map_or(0, |r| counts::region_departements(db, r)),
            Self::RegionCommunes(id) => db
                .regions()
                .get(&id)
                .map_or(0, |r| counts::region_communes(db, r)),
            Self::RegionEpcis(id) => {
                db.regions().get(&id).map_or(0, |r| counts::region_epcis(db, r))
            }
            Self::RegionDdfips(id) => {
                db.regions().get(&id).map_or(0, |r| counts::region_ddfips(db, r))
            }
            Self::RegionCollectivities(id) => db
                .regions()
                .get(&id)
                .map_or(0, |r| counts::region_collectivities(db, r)),
            Self::CollectivityUsers(id) => counts::organization_users(
                db,
                crate::model::organization::OrganizationRef::Collectivity(id),
            ),
            Self::CollectivityReportsTransmitted(id) => {
                counts::collectivity_reports_transmitted(db, id)
            }
            Self::CollectivityReportsApproved(id) => counts::collectivity_reports_approved(db, id),
            Self::CollectivityReportsRejected(id) => counts::collectivity_reports_rejected(db, id),
            Self::CollectivityPackagesTransmitted(id) => {
                counts::collectivity_packages_transmitted(db, id)
            }
            Self::PublisherUsers(id) => counts::organization_users(
                db,
                crate::model::organization::OrganizationRef::Publisher(id),
            ),
            Self::PublisherCollectivities(id) => counts::publisher_collectivities(db, id),
            Self::PublisherReportsTransmitted(id) => counts::publisher_reports_transmitted(db, id),
            Self::PublisherReportsApproved(id) => counts::publisher_reports_approved(db, id),
            Self::PublisherReportsRejected(id) => counts::publisher_reports_rejected(db, id),
            Self::DdfipUsers(id) => counts::organization_users(
                db,
                crate::model::organization::OrganizationRef::Ddfip(id),
            ),
            Self::DdfipCollectivities(id) => counts::ddfip_collectivities(db, id),
            Self::DdfipOffices(id) => counts::ddfip_offices(db, id),
            Self::DdfipReports(id) => counts::ddfip_reports(db, id),
            Self::DdfipReportsApproved(id) => counts::ddfip_reports_approved(db, id),
            Self::DdfipReportsRejected(id) => counts::ddfip_reports_rejected(db, id),
            Self::DgfipUsers(id) => counts::organization_users(
                db,
                crate::model::organization::OrganizationRef::Dgfip(id),
            ),
            Self::DgfipReportsTransmitted(_) => counts::dgfip_reports_transmitted(db),
            Self::DgfipReportsApproved(_) => counts::dgfip_reports_approved(db),
            Self::DgfipReportsRejected(_) => counts::dgfip_reports_rejected(db),
            Self::OfficeCommunes(id) => counts::office_communes(db, id),
            Self::OfficeUsers(id) => counts::office_users(db, id),
            Self::OfficeReportsAssigned(id) => counts::office_reports_assigned(db, id),
            Self::OfficeReportsApproved(id) => counts::office_reports_approved(db, id),
            Self::OfficeReportsRejected(id) => counts::office_reports_rejected(db, id),
            Self::PackageReports(id) => counts::package_reports(db, id),
            Self::PackageReportsCompleted(id) => counts::package_reports_completed(db, id),
            Self::PackageReportsApproved(id) => counts::package_reports_approved(db, id),
            Self::PackageReportsRejected(id) => counts::package_reports_rejected(db, id),
        }
    }
}

///
/// CounterOp
///

#[derive(Clone, Copy, Debug)]
pub enum CounterOp {
    /// Exact delta against a directly maintained counter.
    Adjust { slot: CounterSlot, delta: i64 },
    /// Re-derive a transitively computed aggregate after the row write.
    Recount { slot: CounterSlot },
}

impl CounterOp {
    #[must_use]
    pub(crate) const fn adjust(slot: CounterSlot, delta: i64) -> Self {
        Self::Adjust { slot, delta }
    }

    #[must_use]
    pub(crate) const fn recount(slot: CounterSlot) -> Self {
        Self::Recount { slot }
    }
}

///
/// CounterBatch
///
/// Coalesced, pre-validated op set ready to apply. Validation happens
/// against the pre-write state so that `apply` cannot fail.
///

#[derive(Debug, Default)]
pub(crate) struct CounterBatch {
    adjusts: BTreeMap<CounterSlot, i64>,
    recounts: Vec<CounterSlot>,
}

impl CounterBatch {
    /// Coalesce raw ops and check every adjusted slot against underflow.
    /// A would-be negative counter is an engine bug: the mutation aborts
    /// before any write happens.
    pub(crate) fn prepare(db: &Db, ops: Vec<CounterOp>) -> Result<Self, InternalError> {
        let mut adjusts: BTreeMap<CounterSlot, i64> = BTreeMap::new();
        let mut recounts: Vec<CounterSlot> = Vec::new();

        for op in ops {
            match op {
                CounterOp::Adjust { slot, delta } => {
                    *adjusts.entry(slot).or_insert(0) += delta;
                }
                CounterOp::Recount { slot } => {
                    if !recounts.contains(&slot) {
                        recounts.push(slot);
                    }
                }
            }
        }

        adjusts.retain(|_, delta| *delta != 0);

        for (slot, delta) in &adjusts {
            // Dangling parent: the op becomes a no-op at write time.
            let Some(current) = slot.read(db) else {
                continue;
            };

            if i64::from(current) + *delta < 0 {
                return Err(InternalError::counter_invariant(format!(
                    "counter underflow on {slot:?}: {current} {delta:+}"
                )));
            }
        }

        Ok(Self { adjusts, recounts })
    }

    /// Apply the batch. Runs after the row write; infallible.
    pub(crate) fn apply(self, db: &mut Db) {
        let adjusted = self.adjusts.len() as u64;
        let recounted = self.recounts.len() as u64;

        for (slot, delta) in self.adjusts {
            let Some(current) = slot.read(db) else {
                continue;
            };
            // Prepared against the same state; clamp is unreachable but keeps
            // the arithmetic total.
            let next = (i64::from(current) + delta).max(0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            slot.write(db, next as u32);
        }

        for slot in self.recounts {
            let truth = slot.ground_truth(db);
            slot.write(db, truth);
        }

        if adjusted > 0 || recounted > 0 {
            sink::record(EngineEvent::CounterBatch {
                adjusted,
                recounted,
            });
        }
    }

    #[cfg(test)]
    pub(crate) fn adjust_of(&self, slot: CounterSlot) -> Option<i64> {
        self.adjusts.get(&slot).copied()
    }
}
