//! Core runtime for signadb: the entity model, typed stores, the territorial
//! hierarchy resolver, the counter maintenance engine, the report lifecycle
//! state machine, and the reconciliation path that repairs counters in bulk.
#![warn(unreachable_pub)]

pub mod counter;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod lifecycle;
pub mod model;
pub mod obs;
pub mod reconcile;
pub mod requirements;
pub mod sanitize;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Number of digits in an INSEE commune code (`"64102"`).
pub const CODE_INSEE_LEN: usize = 5;

/// Number of digits in a SIREN organization number.
pub const SIREN_LEN: usize = 9;

///
/// Prelude
///
/// Domain vocabulary only. No errors, stores, executors, or helpers are
/// re-exported here.
///

pub mod prelude {
    pub use crate::model::{
        office::{Office, OfficeCommune, OfficeUser},
        organization::{Collectivity, Ddfip, Dgfip, OrganizationRef, Publisher},
        package::Package,
        report::{Anomaly, FormType, Report, ReportState},
        territory::{Commune, Departement, Epci, Region, TerritoryRef},
        transmission::Transmission,
        user::User,
        Discardable, EntityKind,
    };
}
