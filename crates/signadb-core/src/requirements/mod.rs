//! Form completeness rules.
//!
//! A pure decision table from `(form_type, anomalies, current values)` to
//! per-field `{ displayed, required }` flags. No side effects; the state
//! machine's `complete` guard and the form layer both consult it.
//!
//! Value conditionals mirror the paper forms: the proposed `affectation`
//! decides whether the habitation or professionnel evaluation fields apply,
//! and a dependency `nature` pulls in the dependency subtype field.

mod fields;


pub use fields::ReportField;

use crate::model::report::{Anomaly, FormType, Report};
use std::collections::BTreeMap;

///
/// Requirement
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Requirement {
    pub displayed: bool,
    pub required: bool,
}

///
/// FieldRequirements
///
/// Resolved table for one report. Fields absent from the map are neither
/// displayed nor required.
///

#[derive(Clone, Debug, Default)]
pub struct FieldRequirements {
    map: BTreeMap<ReportField, Requirement>,
}

impl FieldRequirements {
    #[must_use]
    pub fn get(&self, field: ReportField) -> Requirement {
        self.map.get(&field).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_displayed(&self, field: ReportField) -> bool {
        self.get(field).displayed
    }

    #[must_use]
    pub fn is_required(&self, field: ReportField) -> bool {
        self.get(field).required
    }

    pub fn required_fields(&self) -> impl Iterator<Item = ReportField> + '_ {
        self.map
            .iter()
            .filter(|(_, req)| req.required)
            .map(|(field, _)| *field)
    }

    fn display(&mut self, field: ReportField) {
        self.map.entry(field).or_default().displayed = true;
    }

    fn require(&mut self, field: ReportField) {
        let entry = self.map.entry(field).or_default();
        entry.displayed = true;
        entry.required = true;
    }
}

/// Resolve the requirements table for a report.
#[must_use]
pub fn requirements(report: &Report) -> FieldRequirements {
    let mut reqs = FieldRequirements::default();

    // Identification, common to every form.
    reqs.require(ReportField::CodeInsee);
    reqs.require(ReportField::DateConstat);
    reqs.require(ReportField::Anomalies);

    match report.form_type {
        FormType::EvaluationLocalHabitation | FormType::EvaluationLocalProfessionnel => {
            evaluation(report, &mut reqs);
        }
        FormType::CreationLocalHabitation | FormType::CreationLocalProfessionnel => {
            creation(report, &mut reqs);
        }
        FormType::OccupationLocalHabitation => occupation_habitation(report, &mut reqs),
        FormType::OccupationLocalProfessionnel => occupation_professionnel(report, &mut reqs),
    }

    reqs
}

/// Required fields with no value on the report, in field order.
#[must_use]
pub fn missing_fields(report: &Report) -> Vec<ReportField> {
    requirements(report)
        .required_fields()
        .filter(|field| !field.present(report))
        .collect()
}

// ======================================================================
// Per-form tables
// ======================================================================

fn evaluation(report: &Report, reqs: &mut FieldRequirements) {
    // The existing local must be identified from the MAJIC extract.
    reqs.require(ReportField::SituationInvariant);
    reqs.require(ReportField::SituationParcelle);
    reqs.require(ReportField::SituationAdresse);
    reqs.display(ReportField::SituationAnneeMajic);
    reqs.display(ReportField::SituationProprietaire);
    reqs.display(ReportField::SituationPorte);
    reqs.display(ReportField::SituationNature);
    reqs.display(ReportField::SituationAffectation);
    reqs.display(ReportField::SituationCategorie);
    reqs.display(ReportField::SituationSurfaceReelle);
    reqs.display(ReportField::SituationDateMutation);

    if report.form_type == FormType::EvaluationLocalProfessionnel {
        reqs.display(ReportField::SituationCoefficientEntretien);
        reqs.display(ReportField::PropositionCoefficientSituationGenerale);
        reqs.display(ReportField::PropositionCoefficientSituationParticuliere);
    }

    for anomaly in &report.anomalies {
        match anomaly {
            Anomaly::Affectation => affectation(report, reqs),
            Anomaly::Adresse => {
                reqs.require(ReportField::PropositionAdresse);
                reqs.display(ReportField::PropositionPorte);
            }
            Anomaly::Consistance => {
                reqs.require(ReportField::PropositionNature);
                reqs.require(ReportField::PropositionSurfaceReelle);
                require_dependance_subtype(report, reqs);
            }
            Anomaly::Categorie => {
                reqs.require(ReportField::PropositionCategorie);
            }
            Anomaly::Exoneration => {
                reqs.display(ReportField::SituationExoneration);
                reqs.require(ReportField::PropositionExoneration);
            }
            Anomaly::Correctif => {
                reqs.require(ReportField::PropositionCoefficientEntretien);
                reqs.display(ReportField::PropositionCoefficientSituationGenerale);
                reqs.display(ReportField::PropositionCoefficientSituationParticuliere);
            }
            _ => {}
        }
    }
}

/// Affectation change: the proposed destination decides which evaluation
/// regime applies, so the dependent requirements follow its value.
fn affectation(report: &Report, reqs: &mut FieldRequirements) {
    reqs.require(ReportField::PropositionAffectation);
    reqs.display(ReportField::PropositionNature);
    reqs.display(ReportField::PropositionCategorie);
    reqs.display(ReportField::PropositionSurfaceReelle);

    match report.proposition.affectation.as_deref() {
        Some(value) if affectation_is_habitation(value) => {
            reqs.require(ReportField::PropositionNature);
            reqs.require(ReportField::PropositionCategorie);
            require_dependance_subtype(report, reqs);
        }
        Some(_) => {
            reqs.require(ReportField::PropositionNature);
            reqs.require(ReportField::PropositionCategorie);
            reqs.require(ReportField::PropositionSurfaceReelle);
        }
        None => {}
    }
}

fn creation(report: &Report, reqs: &mut FieldRequirements) {
    reqs.require(ReportField::PropositionParcelle);
    reqs.require(ReportField::PropositionAdresse);
    reqs.require(ReportField::PropositionNature);
    reqs.require(ReportField::PropositionCategorie);
    reqs.require(ReportField::PropositionSurfaceReelle);
    reqs.require(ReportField::PropositionDateAchevement);
    reqs.display(ReportField::PropositionPorte);
    require_dependance_subtype(report, reqs);

    if report.anomalies.contains(&Anomaly::ConstructionNeuve) {
        reqs.require(ReportField::PropositionNumeroPermis);
        reqs.require(ReportField::PropositionNatureTravaux);
    }
}

fn occupation_habitation(report: &Report, reqs: &mut FieldRequirements) {
    reqs.require(ReportField::SituationInvariant);
    reqs.display(ReportField::SituationProprietaire);
    reqs.display(ReportField::SituationNatureOccupation);
    reqs.display(ReportField::SituationOccupationAnnee);
    reqs.display(ReportField::SituationMajorationRs);
    reqs.require(ReportField::OccupationDate);
    reqs.require(ReportField::OccupationNature);

    if nature_is_dependance(report.occupation.occupation_nature.as_deref()) {
        reqs.require(ReportField::OccupationNatureDependance);
    }
}

fn occupation_professionnel(report: &Report, reqs: &mut FieldRequirements) {
    reqs.require(ReportField::SituationInvariant);
    reqs.require(ReportField::SituationAnneeCfe);
    reqs.display(ReportField::SituationVacanceFiscale);
    reqs.display(ReportField::SituationSirenDernierOccupant);
    reqs.display(ReportField::SituationNomDernierOccupant);
    reqs.display(ReportField::SituationVlfCfe);
    reqs.display(ReportField::SituationTaxationBaseMinimum);
    reqs.require(ReportField::OccupationDate);
    reqs.require(ReportField::OccupationNature);

    // Declared fiscal vacancy needs its duration.
    if report.occupation.situation_vacance_fiscale == Some(true) {
        reqs.require(ReportField::SituationNombreAnneesVacance);
    }
}

// ======================================================================
// Value conditionals
// ======================================================================

fn require_dependance_subtype(report: &Report, reqs: &mut FieldRequirements) {
    if nature_is_dependance(report.proposition.nature.as_deref()) {
        reqs.require(ReportField::PropositionNatureDependance);
    }
}

/// MAJIC nature code for a dependency (garage, cellar...).
fn nature_is_dependance(nature: Option<&str>) -> bool {
    nature == Some("DA")
}

/// MAJIC affectation codes for dwelling use.
fn affectation_is_habitation(affectation: &str) -> bool {
    matches!(affectation, "H" | "L")
}
