//! Shared fixtures for unit tests.

use crate::{
    db::Db,
    model::{
        id::{CollectivityId, CommuneId, DdfipId, DepartementId, EpciId, OfficeId, RegionId},
        office::Office,
        organization::{Collectivity, Ddfip},
        report::{FormType, Report},
        territory::{Commune, Departement, Epci, Region, TerritoryRef},
    },
    obs::sink::{EngineEvent, MetricsSink},
};
use std::cell::RefCell;

///
/// TerritoryFixture
///
/// One region ("75"), one departement ("64"), one EPCI and two member
/// communes ("64102" Bayonne, "64024" Anglet).
///

pub(crate) struct TerritoryFixture {
    pub region: RegionId,
    pub departement: DepartementId,
    pub epci: EpciId,
    pub bayonne: CommuneId,
    pub anglet: CommuneId,
}

pub(crate) const EPCI_SIREN: &str = "200067106";

pub(crate) fn seed_territory(db: &mut Db) -> TerritoryFixture {
    let region = db
        .insert_region(Region::new("Nouvelle-Aquitaine", "75"))
        .unwrap();
    let departement = db
        .insert_departement(Departement::new("Pyrenees-Atlantiques", "64", "75"))
        .unwrap();
    let epci = db
        .insert_epci(Epci::new("CA du Pays Basque", EPCI_SIREN))
        .unwrap();

    let mut bayonne = Commune::new("Bayonne", "64102", "64");
    bayonne.siren_epci = Some(EPCI_SIREN.into());
    let bayonne = db.insert_commune(bayonne).unwrap();

    let mut anglet = Commune::new("Anglet", "64024", "64");
    anglet.siren_epci = Some(EPCI_SIREN.into());
    let anglet = db.insert_commune(anglet).unwrap();

    TerritoryFixture {
        region,
        departement,
        epci,
        bayonne,
        anglet,
    }
}

pub(crate) fn seed_ddfip(db: &mut Db) -> DdfipId {
    db.insert_ddfip(Ddfip::new("DDFIP des Pyrenees-Atlantiques", "64"))
        .unwrap()
}

pub(crate) fn seed_collectivity(db: &mut Db, commune: CommuneId) -> CollectivityId {
    db.insert_collectivity(Collectivity::new(
        "Commune de Bayonne",
        "212402600",
        TerritoryRef::Commune(commune),
    ))
    .unwrap()
}

pub(crate) fn seed_office(db: &mut Db, ddfip: DdfipId) -> OfficeId {
    db.insert_office(Office::new(
        ddfip,
        "SDIF de Bayonne",
        vec![FormType::EvaluationLocalHabitation],
    ))
    .unwrap()
}

/// A draft evaluation report with every field its requirements table asks
/// for, ready to complete.
pub(crate) fn fillable_report(collectivity: CollectivityId) -> Report {
    let mut report = Report::new(collectivity, FormType::EvaluationLocalHabitation);
    report.anomalies = vec![crate::model::report::Anomaly::Categorie];
    report.code_insee = Some("64102".into());
    report.date_constat = Some("2024-01-15".to_string());
    report.situation.invariant = Some("1021234567".to_string());
    report.situation.parcelle = Some("AB 0123".to_string());
    report.situation.libelle_voie = Some("rue de la Citadelle".to_string());
    report.proposition.categorie = Some("4".to_string());
    report
}

///
/// CaptureSink
///
/// Collects engine events for assertion without touching global metrics.
///

#[derive(Default)]
pub(crate) struct CaptureSink {
    events: RefCell<Vec<EngineEvent>>,
}

impl CaptureSink {
    pub(crate) fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: EngineEvent) {
        self.events.borrow_mut().push(event);
    }
}
