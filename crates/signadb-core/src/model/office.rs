use crate::model::{
    code::CodeInsee,
    id::{DdfipId, OfficeCommuneId, OfficeId, OfficeUserId, UserId},
    report::FormType,
    Discardable, EntityKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// Office
///
/// Sub-unit of a DDFIP competent for a set of form types and, through
/// [`OfficeCommune`] rows, a set of communes.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub ddfip_id: DdfipId,
    pub name: String,
    pub competences: Vec<FormType>,
    pub discarded_at: Option<DateTime<Utc>>,

    // counters
    pub communes_count: u32,
    pub users_count: u32,
    pub reports_assigned_count: u32,
    pub reports_approved_count: u32,
    pub reports_rejected_count: u32,
}

impl Office {
    #[must_use]
    pub fn new(ddfip_id: DdfipId, name: impl Into<String>, competences: Vec<FormType>) -> Self {
        Self {
            id: OfficeId::new(),
            ddfip_id,
            name: name.into(),
            competences,
            discarded_at: None,
            communes_count: 0,
            users_count: 0,
            reports_assigned_count: 0,
            reports_approved_count: 0,
            reports_rejected_count: 0,
        }
    }

    #[must_use]
    pub fn covers(&self, form_type: FormType) -> bool {
        self.competences.contains(&form_type)
    }
}

impl EntityKind for Office {
    type Id = OfficeId;

    const NAME: &'static str = "offices";

    fn id(&self) -> OfficeId {
        self.id
    }
}

impl Discardable for Office {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}

///
/// OfficeCommune
///
/// Join row between an office and a commune, keyed by `code_insee` rather
/// than a commune id. The join is intentionally loose: a row may reference a
/// code with no matching commune yet, and matches again if such a commune
/// appears later.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfficeCommune {
    pub id: OfficeCommuneId,
    pub office_id: OfficeId,
    pub code_insee: CodeInsee,
}

impl OfficeCommune {
    #[must_use]
    pub fn new(office_id: OfficeId, code_insee: impl Into<CodeInsee>) -> Self {
        Self {
            id: OfficeCommuneId::new(),
            office_id,
            code_insee: code_insee.into(),
        }
    }
}

impl EntityKind for OfficeCommune {
    type Id = OfficeCommuneId;

    const NAME: &'static str = "office_communes";

    fn id(&self) -> OfficeCommuneId {
        self.id
    }
}

///
/// OfficeUser
///
/// Membership join between an office and a DDFIP user.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfficeUser {
    pub id: OfficeUserId,
    pub office_id: OfficeId,
    pub user_id: UserId,
}

impl OfficeUser {
    #[must_use]
    pub fn new(office_id: OfficeId, user_id: UserId) -> Self {
        Self {
            id: OfficeUserId::new(),
            office_id,
            user_id,
        }
    }
}

impl EntityKind for OfficeUser {
    type Id = OfficeUserId;

    const NAME: &'static str = "office_users";

    fn id(&self) -> OfficeUserId {
        self.id
    }
}
