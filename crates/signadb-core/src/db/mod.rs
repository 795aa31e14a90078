pub mod ops;
pub mod store;
pub mod validate;
pub(crate) mod write;

use crate::model::{
    office::{Office, OfficeCommune, OfficeUser},
    organization::{Collectivity, Ddfip, Dgfip, Publisher},
    package::Package,
    report::Report,
    territory::{Commune, Departement, Epci, Region},
    transmission::Transmission,
    user::User,
    Discardable,
};
use serde::{Deserialize, Serialize};
use store::EntityStore;

///
/// Db
///
/// The full set of entity stores. Reads take `&Db`; every mutation runs
/// under an exclusive `&mut Db` borrow through the write pipeline, so a row
/// write and its counter adjustments are observable only as a single step —
/// the in-process equivalent of the source system's single-transaction
/// trigger guarantee.
///

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Db {
    pub(crate) communes: EntityStore<Commune>,
    pub(crate) epcis: EntityStore<Epci>,
    pub(crate) departements: EntityStore<Departement>,
    pub(crate) regions: EntityStore<Region>,
    pub(crate) collectivities: EntityStore<Collectivity>,
    pub(crate) publishers: EntityStore<Publisher>,
    pub(crate) ddfips: EntityStore<Ddfip>,
    pub(crate) dgfips: EntityStore<Dgfip>,
    pub(crate) users: EntityStore<User>,
    pub(crate) offices: EntityStore<Office>,
    pub(crate) office_communes: EntityStore<OfficeCommune>,
    pub(crate) office_users: EntityStore<OfficeUser>,
    pub(crate) reports: EntityStore<Report>,
    pub(crate) packages: EntityStore<Package>,
    pub(crate) transmissions: EntityStore<Transmission>,
}

impl Db {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ======================================================================
    // Read access
    // ======================================================================

    #[must_use]
    pub const fn communes(&self) -> &EntityStore<Commune> {
        &self.communes
    }

    #[must_use]
    pub const fn epcis(&self) -> &EntityStore<Epci> {
        &self.epcis
    }

    #[must_use]
    pub const fn departements(&self) -> &EntityStore<Departement> {
        &self.departements
    }

    #[must_use]
    pub const fn regions(&self) -> &EntityStore<Region> {
        &self.regions
    }

    #[must_use]
    pub const fn collectivities(&self) -> &EntityStore<Collectivity> {
        &self.collectivities
    }

    #[must_use]
    pub const fn publishers(&self) -> &EntityStore<Publisher> {
        &self.publishers
    }

    #[must_use]
    pub const fn ddfips(&self) -> &EntityStore<Ddfip> {
        &self.ddfips
    }

    #[must_use]
    pub const fn dgfips(&self) -> &EntityStore<Dgfip> {
        &self.dgfips
    }

    #[must_use]
    pub const fn users(&self) -> &EntityStore<User> {
        &self.users
    }

    #[must_use]
    pub const fn offices(&self) -> &EntityStore<Office> {
        &self.offices
    }

    #[must_use]
    pub const fn office_communes(&self) -> &EntityStore<OfficeCommune> {
        &self.office_communes
    }

    #[must_use]
    pub const fn office_users(&self) -> &EntityStore<OfficeUser> {
        &self.office_users
    }

    #[must_use]
    pub const fn reports(&self) -> &EntityStore<Report> {
        &self.reports
    }

    #[must_use]
    pub const fn packages(&self) -> &EntityStore<Package> {
        &self.packages
    }

    #[must_use]
    pub const fn transmissions(&self) -> &EntityStore<Transmission> {
        &self.transmissions
    }

    /// The live DGFIP singleton, if one exists.
    #[must_use]
    pub fn live_dgfip(&self) -> Option<&Dgfip> {
        self.dgfips.iter().find(|row| !row.is_discarded())
    }
}
