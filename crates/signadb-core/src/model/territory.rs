use crate::model::{
    code::{CodeDepartement, CodeInsee, CodeRegion, Siren},
    id::{CommuneId, DepartementId, EpciId, RegionId},
    EntityKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// TerritoryRef
///
/// Tagged reference to one territory row; the polymorphic
/// `(territory_type, territory_id)` pair of the source schema as a sum type.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum TerritoryRef {
    Commune(CommuneId),
    Epci(EpciId),
    Departement(DepartementId),
    Region(RegionId),
}

impl fmt::Display for TerritoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commune(id) => write!(f, "commune/{id}"),
            Self::Epci(id) => write!(f, "epci/{id}"),
            Self::Departement(id) => write!(f, "departement/{id}"),
            Self::Region(id) => write!(f, "region/{id}"),
        }
    }
}

///
/// Commune
///
/// Leaf of the territorial hierarchy. Belongs to exactly one departement
/// through `code_departement` and optionally to one EPCI through
/// `siren_epci`; both are soft code references.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commune {
    pub id: CommuneId,
    pub name: String,
    pub code_insee: CodeInsee,
    pub code_departement: CodeDepartement,
    pub siren_epci: Option<Siren>,

    // counters
    pub collectivities_count: u32,
    pub offices_count: u32,
}

impl Commune {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        code_insee: impl Into<CodeInsee>,
        code_departement: impl Into<CodeDepartement>,
    ) -> Self {
        Self {
            id: CommuneId::new(),
            name: name.into(),
            code_insee: code_insee.into(),
            code_departement: code_departement.into(),
            siren_epci: None,
            collectivities_count: 0,
            offices_count: 0,
        }
    }
}

impl EntityKind for Commune {
    type Id = CommuneId;

    const NAME: &'static str = "communes";

    fn id(&self) -> CommuneId {
        self.id
    }
}

///
/// Epci
///
/// Inter-communal grouping. `code_departement` is kept for display
/// convenience only; the authoritative departement/region relationship is
/// derived through the member communes.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Epci {
    pub id: EpciId,
    pub name: String,
    pub siren: Siren,
    pub code_departement: Option<CodeDepartement>,

    // counters
    pub communes_count: u32,
    pub collectivities_count: u32,
}

impl Epci {
    #[must_use]
    pub fn new(name: impl Into<String>, siren: impl Into<Siren>) -> Self {
        Self {
            id: EpciId::new(),
            name: name.into(),
            siren: siren.into(),
            code_departement: None,
            communes_count: 0,
            collectivities_count: 0,
        }
    }
}

impl EntityKind for Epci {
    type Id = EpciId;

    const NAME: &'static str = "epcis";

    fn id(&self) -> EpciId {
        self.id
    }
}

///
/// Departement
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Departement {
    pub id: DepartementId,
    pub name: String,
    pub code_departement: CodeDepartement,
    pub code_region: CodeRegion,

    // counters
    pub communes_count: u32,
    pub epcis_count: u32,
    pub ddfips_count: u32,
    pub collectivities_count: u32,
}

impl Departement {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        code_departement: impl Into<CodeDepartement>,
        code_region: impl Into<CodeRegion>,
    ) -> Self {
        Self {
            id: DepartementId::new(),
            name: name.into(),
            code_departement: code_departement.into(),
            code_region: code_region.into(),
            communes_count: 0,
            epcis_count: 0,
            ddfips_count: 0,
            collectivities_count: 0,
        }
    }
}

impl EntityKind for Departement {
    type Id = DepartementId;

    const NAME: &'static str = "departements";

    fn id(&self) -> DepartementId {
        self.id
    }
}

///
/// Region
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub code_region: CodeRegion,

    // counters
    pub departements_count: u32,
    pub communes_count: u32,
    pub epcis_count: u32,
    pub ddfips_count: u32,
    pub collectivities_count: u32,
}

impl Region {
    #[must_use]
    pub fn new(name: impl Into<String>, code_region: impl Into<CodeRegion>) -> Self {
        Self {
            id: RegionId::new(),
            name: name.into(),
            code_region: code_region.into(),
            departements_count: 0,
            communes_count: 0,
            epcis_count: 0,
            ddfips_count: 0,
            collectivities_count: 0,
        }
    }
}

impl EntityKind for Region {
    type Id = RegionId;

    const NAME: &'static str = "regions";

    fn id(&self) -> RegionId {
        self.id
    }
}
