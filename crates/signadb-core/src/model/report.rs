use crate::model::{
    code::CodeInsee,
    id::{
        CollectivityId, DdfipId, OfficeId, PackageId, PublisherId, ReportId, TransmissionId,
        UserId,
    },
    Discardable, EntityKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// FormType
///
/// The six report forms. Determines which anomalies may be filed and which
/// form fields the requirements service displays and requires.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum FormType {
    EvaluationLocalHabitation,
    EvaluationLocalProfessionnel,
    CreationLocalHabitation,
    CreationLocalProfessionnel,
    OccupationLocalHabitation,
    OccupationLocalProfessionnel,
}

impl FormType {
    pub const ALL: [Self; 6] = [
        Self::EvaluationLocalHabitation,
        Self::EvaluationLocalProfessionnel,
        Self::CreationLocalHabitation,
        Self::CreationLocalProfessionnel,
        Self::OccupationLocalHabitation,
        Self::OccupationLocalProfessionnel,
    ];
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EvaluationLocalHabitation => "evaluation_local_habitation",
            Self::EvaluationLocalProfessionnel => "evaluation_local_professionnel",
            Self::CreationLocalHabitation => "creation_local_habitation",
            Self::CreationLocalProfessionnel => "creation_local_professionnel",
            Self::OccupationLocalHabitation => "occupation_local_habitation",
            Self::OccupationLocalProfessionnel => "occupation_local_professionnel",
        };
        write!(f, "{s}")
    }
}

///
/// Anomaly
///
/// Anomaly subtype tags carried by a report, constrained by its form type.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Anomaly {
    Affectation,
    Adresse,
    Consistance,
    Categorie,
    Exoneration,
    Correctif,
    OmissionBatie,
    ConstructionNeuve,
    Occupation,
}

impl Anomaly {
    /// Anomalies that may be filed on the given form type.
    #[must_use]
    pub const fn allowed_for(form_type: FormType) -> &'static [Self] {
        match form_type {
            FormType::EvaluationLocalHabitation | FormType::EvaluationLocalProfessionnel => &[
                Self::Affectation,
                Self::Adresse,
                Self::Consistance,
                Self::Categorie,
                Self::Exoneration,
                Self::Correctif,
            ],
            FormType::CreationLocalHabitation | FormType::CreationLocalProfessionnel => {
                &[Self::OmissionBatie, Self::ConstructionNeuve]
            }
            FormType::OccupationLocalHabitation | FormType::OccupationLocalProfessionnel => {
                &[Self::Occupation]
            }
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Affectation => "affectation",
            Self::Adresse => "adresse",
            Self::Consistance => "consistance",
            Self::Categorie => "categorie",
            Self::Exoneration => "exoneration",
            Self::Correctif => "correctif",
            Self::OmissionBatie => "omission_batie",
            Self::ConstructionNeuve => "construction_neuve",
            Self::Occupation => "occupation",
        };
        write!(f, "{s}")
    }
}

///
/// ReportState
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ReportState {
    Draft,
    Ready,
    Transmitted,
    Acknowledged,
    Accepted,
    Assigned,
    Applicable,
    Inapplicable,
    Approved,
    Canceled,
    Rejected,
}

impl ReportState {
    /// Terminal states admit no further transitions except the explicit
    /// reversals (`unapprove`, `unreject`).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Canceled | Self::Rejected)
    }

    /// States in which a DDFIP decision has been recorded.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// States at or past transmission.
    #[must_use]
    pub const fn is_transmitted(self) -> bool {
        !matches!(self, Self::Draft | Self::Ready)
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Transmitted => "transmitted",
            Self::Acknowledged => "acknowledged",
            Self::Accepted => "accepted",
            Self::Assigned => "assigned",
            Self::Applicable => "applicable",
            Self::Inapplicable => "inapplicable",
            Self::Approved => "approved",
            Self::Canceled => "canceled",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

///
/// ResolutionMotif
///
/// Office motion recorded by `resolve`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ResolutionMotif {
    Applicable,
    Inapplicable,
}

///
/// SituationMajic
///
/// Current cadastral situation as known from the MAJIC extract.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SituationMajic {
    pub annee_majic: Option<i32>,
    pub invariant: Option<String>,
    pub proprietaire: Option<String>,
    pub numero_ordre_proprietaire: Option<String>,
    pub parcelle: Option<String>,
    pub numero_voie: Option<String>,
    pub indice_repetition: Option<String>,
    pub libelle_voie: Option<String>,
    pub code_rivoli: Option<String>,
    pub adresse: Option<String>,
    pub numero_batiment: Option<String>,
    pub numero_escalier: Option<String>,
    pub numero_niveau: Option<String>,
    pub numero_porte: Option<String>,
    pub numero_ordre_porte: Option<String>,
    pub nature: Option<String>,
    pub affectation: Option<String>,
    pub categorie: Option<String>,
    pub surface_reelle: Option<f64>,
    pub surface_p1: Option<f64>,
    pub surface_p2: Option<f64>,
    pub surface_p3: Option<f64>,
    pub surface_pk1: Option<f64>,
    pub surface_pk2: Option<f64>,
    pub surface_ponderee: Option<f64>,
    pub date_mutation: Option<String>,
    pub coefficient_localisation: Option<f64>,
    pub coefficient_entretien: Option<String>,
    pub coefficient_situation_generale: Option<String>,
    pub coefficient_situation_particuliere: Option<String>,
    pub exoneration: Option<String>,
}

///
/// Proposition
///
/// Correction proposed by the collectivity.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposition {
    pub parcelle: Option<String>,
    pub numero_voie: Option<String>,
    pub indice_repetition: Option<String>,
    pub libelle_voie: Option<String>,
    pub code_rivoli: Option<String>,
    pub adresse: Option<String>,
    pub numero_batiment: Option<String>,
    pub numero_escalier: Option<String>,
    pub numero_niveau: Option<String>,
    pub numero_porte: Option<String>,
    pub numero_ordre_porte: Option<String>,
    pub nature: Option<String>,
    pub nature_dependance: Option<String>,
    pub affectation: Option<String>,
    pub categorie: Option<String>,
    pub surface_reelle: Option<f64>,
    pub date_achevement: Option<String>,
    pub numero_permis: Option<String>,
    pub nature_travaux: Option<String>,
    pub exoneration: Option<String>,
    pub coefficient_entretien: Option<String>,
    pub coefficient_situation_generale: Option<String>,
    pub coefficient_situation_particuliere: Option<String>,
}

///
/// Occupation
///
/// Occupancy fields used by the two occupation form types.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Occupation {
    pub situation_occupation_annee: Option<i32>,
    pub situation_nature_occupation: Option<String>,
    pub situation_majoration_rs: Option<bool>,
    pub situation_annee_cfe: Option<i32>,
    pub situation_vacance_fiscale: Option<bool>,
    pub situation_nombre_annees_vacance: Option<i32>,
    pub situation_siren_dernier_occupant: Option<String>,
    pub situation_nom_dernier_occupant: Option<String>,
    pub situation_vlf_cfe: Option<f64>,
    pub situation_taxation_base_minimum: Option<bool>,
    pub occupation_date: Option<String>,
    pub occupation_nature: Option<String>,
    pub occupation_nature_dependance: Option<String>,
}

///
/// Report
///
/// A single property-tax anomaly filing. Lifecycle timestamps are written by
/// the state machine only; counter columns on ancestors are derived from the
/// state, the timestamps, and the sandbox flag.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub collectivity_id: CollectivityId,
    pub publisher_id: Option<PublisherId>,
    pub package_id: Option<PackageId>,
    pub transmission_id: Option<TransmissionId>,
    pub office_id: Option<OfficeId>,
    pub ddfip_id: Option<DdfipId>,
    pub assignee_id: Option<UserId>,

    pub form_type: FormType,
    pub anomalies: Vec<Anomaly>,
    pub code_insee: Option<CodeInsee>,
    pub date_constat: Option<String>,

    /// Unique reference, assigned when the report is packaged for
    /// transmission (`"{package reference}-{ordinal}"`).
    pub reference: Option<String>,
    /// Deterministic grouping key derived from `code_insee` and the MAJIC
    /// invariant; `None` whenever either input is missing.
    pub sibling_id: Option<String>,
    pub sandbox: bool,

    pub situation: SituationMajic,
    pub proposition: Proposition,
    pub occupation: Occupation,

    pub state: ReportState,
    pub reponse: Option<String>,
    pub resolution_motif: Option<ResolutionMotif>,

    pub completed_at: Option<DateTime<Utc>>,
    pub transmitted_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub denied_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub discarded_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    #[must_use]
    pub fn new(collectivity_id: CollectivityId, form_type: FormType) -> Self {
        let now = Utc::now();

        Self {
            id: ReportId::new(),
            collectivity_id,
            publisher_id: None,
            package_id: None,
            transmission_id: None,
            office_id: None,
            ddfip_id: None,
            assignee_id: None,
            form_type,
            anomalies: Vec::new(),
            code_insee: None,
            date_constat: None,
            reference: None,
            sibling_id: None,
            sandbox: false,
            situation: SituationMajic::default(),
            proposition: Proposition::default(),
            occupation: Occupation::default(),
            state: ReportState::Draft,
            reponse: None,
            resolution_motif: None,
            completed_at: None,
            transmitted_at: None,
            acknowledged_at: None,
            accepted_at: None,
            assigned_at: None,
            denied_at: None,
            resolved_at: None,
            approved_at: None,
            rejected_at: None,
            canceled_at: None,
            discarded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute `sibling_id` from `code_insee` and the MAJIC invariant.
    /// Called on every save; the key degrades to `None` when either input
    /// is blank.
    pub fn refresh_sibling_id(&mut self) {
        self.sibling_id = match (&self.code_insee, &self.situation.invariant) {
            (Some(code), Some(invariant)) if !invariant.is_empty() => {
                Some(format!("{code}{invariant}"))
            }
            _ => None,
        };
    }

    /// True when the report counts toward transmitted aggregates: it left the
    /// collectivity's hands and is not a sandbox rehearsal.
    #[must_use]
    pub const fn counts_as_transmitted(&self) -> bool {
        self.transmitted_at.is_some() && !self.sandbox
    }
}

impl EntityKind for Report {
    type Id = ReportId;

    const NAME: &'static str = "reports";

    fn id(&self) -> ReportId {
        self.id
    }
}

impl Discardable for Report {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}
