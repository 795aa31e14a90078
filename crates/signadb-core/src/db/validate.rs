//! Row validation run before any write.
//!
//! Uniqueness is checked among *live* rows only: discarding a row releases
//! its name/siren/code for reuse, and undiscarding re-contests it. The same
//! rules exist as storage constraints in the source system; here validation
//! is the single enforcement layer.

use crate::{
    db::Db,
    error::InternalError,
    model::{
        office::{Office, OfficeCommune, OfficeUser},
        organization::{Collectivity, Ddfip, Dgfip, OrganizationRef, Publisher},
        package::Package,
        report::{Anomaly, Report},
        territory::{Commune, Departement, Epci, Region, TerritoryRef},
        transmission::Transmission,
        user::User,
        Discardable, EntityKind,
    },
};

fn not_unique(entity: &str, field: &str, value: impl std::fmt::Display) -> InternalError {
    InternalError::validation(format!("{entity}.{field} is not unique: {value}"))
}

fn blank(entity: &str, field: &str) -> InternalError {
    InternalError::validation(format!("{entity}.{field} can't be blank"))
}

fn missing_parent(entity: &str, field: &str, value: impl std::fmt::Display) -> InternalError {
    InternalError::validation(format!("{entity}.{field} refers to a missing row: {value}"))
}

// ======================================================================
// Territories
// ======================================================================

pub(crate) fn commune(db: &Db, row: &Commune) -> Result<(), InternalError> {
    if row.code_insee.as_str().is_empty() {
        return Err(blank(Commune::NAME, "code_insee"));
    }
    if row.code_departement.as_str().is_empty() {
        return Err(blank(Commune::NAME, "code_departement"));
    }
    if db
        .communes()
        .iter()
        .any(|other| other.id != row.id && other.code_insee == row.code_insee)
    {
        return Err(not_unique(Commune::NAME, "code_insee", &row.code_insee));
    }
    Ok(())
}

pub(crate) fn epci(db: &Db, row: &Epci) -> Result<(), InternalError> {
    if row.siren.as_str().is_empty() {
        return Err(blank(Epci::NAME, "siren"));
    }
    if db
        .epcis()
        .iter()
        .any(|other| other.id != row.id && other.siren == row.siren)
    {
        return Err(not_unique(Epci::NAME, "siren", &row.siren));
    }
    Ok(())
}

pub(crate) fn departement(db: &Db, row: &Departement) -> Result<(), InternalError> {
    if row.code_departement.as_str().is_empty() {
        return Err(blank(Departement::NAME, "code_departement"));
    }
    if db
        .departements()
        .iter()
        .any(|other| other.id != row.id && other.code_departement == row.code_departement)
    {
        return Err(not_unique(
            Departement::NAME,
            "code_departement",
            &row.code_departement,
        ));
    }
    Ok(())
}

pub(crate) fn region(db: &Db, row: &Region) -> Result<(), InternalError> {
    if row.code_region.as_str().is_empty() {
        return Err(blank(Region::NAME, "code_region"));
    }
    if db
        .regions()
        .iter()
        .any(|other| other.id != row.id && other.code_region == row.code_region)
    {
        return Err(not_unique(Region::NAME, "code_region", &row.code_region));
    }
    Ok(())
}

// ======================================================================
// Organizations
// ======================================================================

pub(crate) fn collectivity(db: &Db, row: &Collectivity) -> Result<(), InternalError> {
    if row.name.is_empty() {
        return Err(blank(Collectivity::NAME, "name"));
    }
    if row.siren.as_str().is_empty() {
        return Err(blank(Collectivity::NAME, "siren"));
    }
    if !row.is_discarded()
        && db
            .collectivities()
            .iter_live()
            .any(|other| other.id != row.id && other.siren == row.siren)
    {
        return Err(not_unique(Collectivity::NAME, "siren", &row.siren));
    }
    if !territory_exists(db, row.territory) {
        return Err(missing_parent(Collectivity::NAME, "territory", row.territory));
    }
    if let Some(publisher_id) = row.publisher_id {
        if !db.publishers().contains(&publisher_id) {
            return Err(missing_parent(Collectivity::NAME, "publisher", publisher_id));
        }
    }
    Ok(())
}

pub(crate) fn publisher(db: &Db, row: &Publisher) -> Result<(), InternalError> {
    if row.siren.as_str().is_empty() {
        return Err(blank(Publisher::NAME, "siren"));
    }
    if !row.is_discarded()
        && db
            .publishers()
            .iter_live()
            .any(|other| other.id != row.id && other.siren == row.siren)
    {
        return Err(not_unique(Publisher::NAME, "siren", &row.siren));
    }
    Ok(())
}

pub(crate) fn ddfip(db: &Db, row: &Ddfip) -> Result<(), InternalError> {
    if row.name.is_empty() {
        return Err(blank(Ddfip::NAME, "name"));
    }
    if !row.is_discarded()
        && db
            .ddfips()
            .iter_live()
            .any(|other| other.id != row.id && other.name == row.name)
    {
        return Err(not_unique(Ddfip::NAME, "name", &row.name));
    }
    Ok(())
}

/// The DGFIP is a singleton among live rows: inserting a second live row
/// fails, and so does undiscarding one while another live row exists.
pub(crate) fn dgfip(db: &Db, row: &Dgfip) -> Result<(), InternalError> {
    if !row.is_discarded()
        && db
            .dgfips()
            .iter_live()
            .any(|other| other.id != row.id)
    {
        return Err(InternalError::validation(
            "dgfips: a live DGFIP already exists",
        ));
    }
    Ok(())
}

// ======================================================================
// Users & offices
// ======================================================================

pub(crate) fn user(db: &Db, row: &User) -> Result<(), InternalError> {
    if row.email.is_empty() {
        return Err(blank(User::NAME, "email"));
    }
    if !row.is_discarded()
        && db
            .users()
            .iter_live()
            .any(|other| other.id != row.id && other.email == row.email)
    {
        return Err(not_unique(User::NAME, "email", &row.email));
    }
    if !organization_exists(db, row.organization) {
        return Err(missing_parent(User::NAME, "organization", row.organization));
    }
    Ok(())
}

pub(crate) fn office(db: &Db, row: &Office) -> Result<(), InternalError> {
    if row.name.is_empty() {
        return Err(blank(Office::NAME, "name"));
    }
    if !db.ddfips().contains(&row.ddfip_id) {
        return Err(missing_parent(Office::NAME, "ddfip", row.ddfip_id));
    }
    Ok(())
}

pub(crate) fn office_commune(db: &Db, row: &OfficeCommune) -> Result<(), InternalError> {
    if row.code_insee.as_str().is_empty() {
        return Err(blank(OfficeCommune::NAME, "code_insee"));
    }
    if !db.offices().contains(&row.office_id) {
        return Err(missing_parent(OfficeCommune::NAME, "office", row.office_id));
    }
    if db.office_communes().iter().any(|other| {
        other.id != row.id && other.office_id == row.office_id && other.code_insee == row.code_insee
    }) {
        return Err(not_unique(OfficeCommune::NAME, "code_insee", &row.code_insee));
    }
    Ok(())
}

pub(crate) fn office_user(db: &Db, row: &OfficeUser) -> Result<(), InternalError> {
    if !db.offices().contains(&row.office_id) {
        return Err(missing_parent(OfficeUser::NAME, "office", row.office_id));
    }
    if !db.users().contains(&row.user_id) {
        return Err(missing_parent(OfficeUser::NAME, "user", row.user_id));
    }
    if db.office_users().iter().any(|other| {
        other.id != row.id && other.office_id == row.office_id && other.user_id == row.user_id
    }) {
        return Err(not_unique(OfficeUser::NAME, "user", row.user_id));
    }
    Ok(())
}

// ======================================================================
// Workflow entities
// ======================================================================

pub(crate) fn report(db: &Db, row: &Report) -> Result<(), InternalError> {
    if !db.collectivities().contains(&row.collectivity_id) {
        return Err(missing_parent(Report::NAME, "collectivity", row.collectivity_id));
    }
    for anomaly in &row.anomalies {
        if !Anomaly::allowed_for(row.form_type).contains(anomaly) {
            return Err(InternalError::validation(format!(
                "reports.anomalies: {anomaly} is not allowed on {}",
                row.form_type
            )));
        }
    }
    if let Some(reference) = &row.reference {
        if db.reports().iter().any(|other| {
            other.id != row.id && other.reference.as_deref() == Some(reference.as_str())
        }) {
            return Err(not_unique(Report::NAME, "reference", reference));
        }
    }
    Ok(())
}

pub(crate) fn package(db: &Db, row: &Package) -> Result<(), InternalError> {
    if row.reference.is_empty() {
        return Err(blank(Package::NAME, "reference"));
    }
    if !db.collectivities().contains(&row.collectivity_id) {
        return Err(missing_parent(Package::NAME, "collectivity", row.collectivity_id));
    }
    if !row.is_discarded()
        && db
            .packages()
            .iter_live()
            .any(|other| other.id != row.id && other.reference == row.reference)
    {
        return Err(not_unique(Package::NAME, "reference", &row.reference));
    }
    Ok(())
}

pub(crate) fn transmission(db: &Db, row: &Transmission) -> Result<(), InternalError> {
    if !db.collectivities().contains(&row.collectivity_id) {
        return Err(missing_parent(
            Transmission::NAME,
            "collectivity",
            row.collectivity_id,
        ));
    }
    match (row.user_id, row.publisher_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(InternalError::validation(
            "transmissions: exactly one of user or publisher must be set",
        )),
    }
}

// ======================================================================
// Reference resolution
// ======================================================================

fn territory_exists(db: &Db, territory: TerritoryRef) -> bool {
    match territory {
        TerritoryRef::Commune(id) => db.communes().contains(&id),
        TerritoryRef::Epci(id) => db.epcis().contains(&id),
        TerritoryRef::Departement(id) => db.departements().contains(&id),
        TerritoryRef::Region(id) => db.regions().contains(&id),
    }
}

fn organization_exists(db: &Db, organization: OrganizationRef) -> bool {
    match organization {
        OrganizationRef::Collectivity(id) => db.collectivities().contains(&id),
        OrganizationRef::Publisher(id) => db.publishers().contains(&id),
        OrganizationRef::Ddfip(id) => db.ddfips().contains(&id),
        OrganizationRef::Dgfip(id) => db.dgfips().contains(&id),
    }
}
