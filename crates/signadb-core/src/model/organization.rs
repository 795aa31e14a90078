use crate::model::{
    code::{CodeDepartement, Siren},
    id::{CollectivityId, DdfipId, DgfipId, PublisherId},
    territory::TerritoryRef,
    Discardable, EntityKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// OrganizationRef
///
/// Tagged reference to the organization owning a user.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum OrganizationRef {
    Collectivity(CollectivityId),
    Publisher(PublisherId),
    Ddfip(DdfipId),
    Dgfip(DgfipId),
}

impl fmt::Display for OrganizationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collectivity(id) => write!(f, "collectivity/{id}"),
            Self::Publisher(id) => write!(f, "publisher/{id}"),
            Self::Ddfip(id) => write!(f, "ddfip/{id}"),
            Self::Dgfip(id) => write!(f, "dgfip/{id}"),
        }
    }
}

///
/// Collectivity
///
/// A local-government body registered on exactly one territory, optionally
/// filing its reports through a publisher.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collectivity {
    pub id: CollectivityId,
    pub name: String,
    pub siren: Siren,
    pub territory: TerritoryRef,
    pub publisher_id: Option<PublisherId>,
    pub discarded_at: Option<DateTime<Utc>>,

    // counters
    pub users_count: u32,
    pub reports_transmitted_count: u32,
    pub reports_approved_count: u32,
    pub reports_rejected_count: u32,
    pub packages_transmitted_count: u32,
}

impl Collectivity {
    #[must_use]
    pub fn new(name: impl Into<String>, siren: impl Into<Siren>, territory: TerritoryRef) -> Self {
        Self {
            id: CollectivityId::new(),
            name: name.into(),
            siren: siren.into(),
            territory,
            publisher_id: None,
            discarded_at: None,
            users_count: 0,
            reports_transmitted_count: 0,
            reports_approved_count: 0,
            reports_rejected_count: 0,
            packages_transmitted_count: 0,
        }
    }
}

impl EntityKind for Collectivity {
    type Id = CollectivityId;

    const NAME: &'static str = "collectivities";

    fn id(&self) -> CollectivityId {
        self.id
    }
}

impl Discardable for Collectivity {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}

///
/// Publisher
///
/// Third-party software vendor filing reports on behalf of collectivities.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
    pub siren: Siren,
    pub discarded_at: Option<DateTime<Utc>>,

    // counters
    pub users_count: u32,
    pub collectivities_count: u32,
    pub reports_transmitted_count: u32,
    pub reports_approved_count: u32,
    pub reports_rejected_count: u32,
}

impl Publisher {
    #[must_use]
    pub fn new(name: impl Into<String>, siren: impl Into<Siren>) -> Self {
        Self {
            id: PublisherId::new(),
            name: name.into(),
            siren: siren.into(),
            discarded_at: None,
            users_count: 0,
            collectivities_count: 0,
            reports_transmitted_count: 0,
            reports_approved_count: 0,
            reports_rejected_count: 0,
        }
    }
}

impl EntityKind for Publisher {
    type Id = PublisherId;

    const NAME: &'static str = "publishers";

    fn id(&self) -> PublisherId {
        self.id
    }
}

impl Discardable for Publisher {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}

///
/// Ddfip
///
/// Departmental tax office. Receives transmitted reports for its departement
/// and dispatches them to its offices.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ddfip {
    pub id: DdfipId,
    pub name: String,
    pub code_departement: CodeDepartement,
    pub discarded_at: Option<DateTime<Utc>>,

    // counters
    pub users_count: u32,
    pub collectivities_count: u32,
    pub offices_count: u32,
    pub reports_count: u32,
    pub reports_approved_count: u32,
    pub reports_rejected_count: u32,
}

impl Ddfip {
    #[must_use]
    pub fn new(name: impl Into<String>, code_departement: impl Into<CodeDepartement>) -> Self {
        Self {
            id: DdfipId::new(),
            name: name.into(),
            code_departement: code_departement.into(),
            discarded_at: None,
            users_count: 0,
            collectivities_count: 0,
            offices_count: 0,
            reports_count: 0,
            reports_approved_count: 0,
            reports_rejected_count: 0,
        }
    }
}

impl EntityKind for Ddfip {
    type Id = DdfipId;

    const NAME: &'static str = "ddfips";

    fn id(&self) -> DdfipId {
        self.id
    }
}

impl Discardable for Ddfip {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}

///
/// Dgfip
///
/// National tax administration. At most one live row may exist; the
/// constraint is enforced by validation on insert and undiscard.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dgfip {
    pub id: DgfipId,
    pub name: String,
    pub discarded_at: Option<DateTime<Utc>>,

    // counters
    pub users_count: u32,
    pub reports_transmitted_count: u32,
    pub reports_approved_count: u32,
    pub reports_rejected_count: u32,
}

impl Dgfip {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DgfipId::new(),
            name: name.into(),
            discarded_at: None,
            users_count: 0,
            reports_transmitted_count: 0,
            reports_approved_count: 0,
            reports_rejected_count: 0,
        }
    }
}

impl EntityKind for Dgfip {
    type Id = DgfipId;

    const NAME: &'static str = "dgfips";

    fn id(&self) -> DgfipId {
        self.id
    }
}

impl Discardable for Dgfip {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}
