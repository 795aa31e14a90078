use crate::model::report::Report;
use std::fmt;

///
/// ReportField
///
/// Addressable form fields as the requirements service sees them. Address
/// and door fields are grouped: the group is present when any of its parts
/// is filled in.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ReportField {
    CodeInsee,
    DateConstat,
    Anomalies,

    SituationAnneeMajic,
    SituationInvariant,
    SituationProprietaire,
    SituationParcelle,
    SituationAdresse,
    SituationPorte,
    SituationNature,
    SituationAffectation,
    SituationCategorie,
    SituationSurfaceReelle,
    SituationDateMutation,
    SituationCoefficientEntretien,
    SituationExoneration,
    SituationNatureOccupation,
    SituationOccupationAnnee,
    SituationMajorationRs,
    SituationAnneeCfe,
    SituationVacanceFiscale,
    SituationNombreAnneesVacance,
    SituationSirenDernierOccupant,
    SituationNomDernierOccupant,
    SituationVlfCfe,
    SituationTaxationBaseMinimum,

    PropositionParcelle,
    PropositionAdresse,
    PropositionPorte,
    PropositionNature,
    PropositionNatureDependance,
    PropositionAffectation,
    PropositionCategorie,
    PropositionSurfaceReelle,
    PropositionDateAchevement,
    PropositionNumeroPermis,
    PropositionNatureTravaux,
    PropositionExoneration,
    PropositionCoefficientEntretien,
    PropositionCoefficientSituationGenerale,
    PropositionCoefficientSituationParticuliere,

    OccupationDate,
    OccupationNature,
    OccupationNatureDependance,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

impl ReportField {
    /// Whether the field carries a value on the given report.
    #[must_use]
    pub fn present(self, report: &Report) -> bool {
        let situation = &report.situation;
        let proposition = &report.proposition;
        let occupation = &report.occupation;

        match self {
            Self::CodeInsee => report.code_insee.is_some(),
            Self::DateConstat => filled(&report.date_constat),
            Self::Anomalies => !report.anomalies.is_empty(),

            Self::SituationAnneeMajic => situation.annee_majic.is_some(),
            Self::SituationInvariant => filled(&situation.invariant),
            Self::SituationProprietaire => filled(&situation.proprietaire),
            Self::SituationParcelle => filled(&situation.parcelle),
            Self::SituationAdresse => {
                filled(&situation.libelle_voie)
                    || filled(&situation.adresse)
                    || filled(&situation.numero_voie)
            }
            Self::SituationPorte => {
                filled(&situation.numero_batiment)
                    || filled(&situation.numero_escalier)
                    || filled(&situation.numero_niveau)
                    || filled(&situation.numero_porte)
                    || filled(&situation.numero_ordre_porte)
            }
            Self::SituationNature => filled(&situation.nature),
            Self::SituationAffectation => filled(&situation.affectation),
            Self::SituationCategorie => filled(&situation.categorie),
            Self::SituationSurfaceReelle => situation.surface_reelle.is_some(),
            Self::SituationDateMutation => filled(&situation.date_mutation),
            Self::SituationCoefficientEntretien => filled(&situation.coefficient_entretien),
            Self::SituationExoneration => filled(&situation.exoneration),
            Self::SituationNatureOccupation => filled(&occupation.situation_nature_occupation),
            Self::SituationOccupationAnnee => occupation.situation_occupation_annee.is_some(),
            Self::SituationMajorationRs => occupation.situation_majoration_rs.is_some(),
            Self::SituationAnneeCfe => occupation.situation_annee_cfe.is_some(),
            Self::SituationVacanceFiscale => occupation.situation_vacance_fiscale.is_some(),
            Self::SituationNombreAnneesVacance => {
                occupation.situation_nombre_annees_vacance.is_some()
            }
            Self::SituationSirenDernierOccupant => {
                filled(&occupation.situation_siren_dernier_occupant)
            }
            Self::SituationNomDernierOccupant => {
                filled(&occupation.situation_nom_dernier_occupant)
            }
            Self::SituationVlfCfe => occupation.situation_vlf_cfe.is_some(),
            Self::SituationTaxationBaseMinimum => {
                occupation.situation_taxation_base_minimum.is_some()
            }

            Self::PropositionParcelle => filled(&proposition.parcelle),
            Self::PropositionAdresse => {
                filled(&proposition.libelle_voie)
                    || filled(&proposition.adresse)
                    || filled(&proposition.numero_voie)
            }
            Self::PropositionPorte => {
                filled(&proposition.numero_batiment)
                    || filled(&proposition.numero_escalier)
                    || filled(&proposition.numero_niveau)
                    || filled(&proposition.numero_porte)
                    || filled(&proposition.numero_ordre_porte)
            }
            Self::PropositionNature => filled(&proposition.nature),
            Self::PropositionNatureDependance => filled(&proposition.nature_dependance),
            Self::PropositionAffectation => filled(&proposition.affectation),
            Self::PropositionCategorie => filled(&proposition.categorie),
            Self::PropositionSurfaceReelle => proposition.surface_reelle.is_some(),
            Self::PropositionDateAchevement => filled(&proposition.date_achevement),
            Self::PropositionNumeroPermis => filled(&proposition.numero_permis),
            Self::PropositionNatureTravaux => filled(&proposition.nature_travaux),
            Self::PropositionExoneration => filled(&proposition.exoneration),
            Self::PropositionCoefficientEntretien => filled(&proposition.coefficient_entretien),
            Self::PropositionCoefficientSituationGenerale => {
                filled(&proposition.coefficient_situation_generale)
            }
            Self::PropositionCoefficientSituationParticuliere => {
                filled(&proposition.coefficient_situation_particuliere)
            }

            Self::OccupationDate => filled(&occupation.occupation_date),
            Self::OccupationNature => filled(&occupation.occupation_nature),
            Self::OccupationNatureDependance => filled(&occupation.occupation_nature_dependance),
        }
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CodeInsee => "code_insee",
            Self::DateConstat => "date_constat",
            Self::Anomalies => "anomalies",
            Self::SituationAnneeMajic => "situation_annee_majic",
            Self::SituationInvariant => "situation_invariant",
            Self::SituationProprietaire => "situation_proprietaire",
            Self::SituationParcelle => "situation_parcelle",
            Self::SituationAdresse => "situation_adresse",
            Self::SituationPorte => "situation_porte",
            Self::SituationNature => "situation_nature",
            Self::SituationAffectation => "situation_affectation",
            Self::SituationCategorie => "situation_categorie",
            Self::SituationSurfaceReelle => "situation_surface_reelle",
            Self::SituationDateMutation => "situation_date_mutation",
            Self::SituationCoefficientEntretien => "situation_coefficient_entretien",
            Self::SituationExoneration => "situation_exoneration",
            Self::SituationNatureOccupation => "situation_nature_occupation",
            Self::SituationOccupationAnnee => "situation_occupation_annee",
            Self::SituationMajorationRs => "situation_majoration_rs",
            Self::SituationAnneeCfe => "situation_annee_cfe",
            Self::SituationVacanceFiscale => "situation_vacance_fiscale",
            Self::SituationNombreAnneesVacance => "situation_nombre_annees_vacance",
            Self::SituationSirenDernierOccupant => "situation_siren_dernier_occupant",
            Self::SituationNomDernierOccupant => "situation_nom_dernier_occupant",
            Self::SituationVlfCfe => "situation_vlf_cfe",
            Self::SituationTaxationBaseMinimum => "situation_taxation_base_minimum",
            Self::PropositionParcelle => "proposition_parcelle",
            Self::PropositionAdresse => "proposition_adresse",
            Self::PropositionPorte => "proposition_porte",
            Self::PropositionNature => "proposition_nature",
            Self::PropositionNatureDependance => "proposition_nature_dependance",
            Self::PropositionAffectation => "proposition_affectation",
            Self::PropositionCategorie => "proposition_categorie",
            Self::PropositionSurfaceReelle => "proposition_surface_reelle",
            Self::PropositionDateAchevement => "proposition_date_achevement",
            Self::PropositionNumeroPermis => "proposition_numero_permis",
            Self::PropositionNatureTravaux => "proposition_nature_travaux",
            Self::PropositionExoneration => "proposition_exoneration",
            Self::PropositionCoefficientEntretien => "proposition_coefficient_entretien",
            Self::PropositionCoefficientSituationGenerale => {
                "proposition_coefficient_situation_generale"
            }
            Self::PropositionCoefficientSituationParticuliere => {
                "proposition_coefficient_situation_particuliere"
            }
            Self::OccupationDate => "occupation_date",
            Self::OccupationNature => "occupation_nature",
            Self::OccupationNatureDependance => "occupation_nature_dependance",
        };
        write!(f, "{s}")
    }
}
