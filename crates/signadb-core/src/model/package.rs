use crate::model::{
    id::{CollectivityId, PackageId, PublisherId},
    Discardable, EntityKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// Package
///
/// Transmission envelope grouping reports sent together by one collectivity,
/// optionally through one publisher. `transmitted_at` is an append-only
/// marker; once stamped, the package and its members never return to draft.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub collectivity_id: CollectivityId,
    pub publisher_id: Option<PublisherId>,
    pub reference: String,
    pub sandbox: bool,
    pub transmitted_at: Option<DateTime<Utc>>,
    pub discarded_at: Option<DateTime<Utc>>,

    // counters
    pub reports_count: u32,
    pub reports_completed_count: u32,
    pub reports_approved_count: u32,
    pub reports_rejected_count: u32,
}

impl Package {
    #[must_use]
    pub fn new(collectivity_id: CollectivityId, reference: impl Into<String>) -> Self {
        Self {
            id: PackageId::new(),
            collectivity_id,
            publisher_id: None,
            reference: reference.into(),
            sandbox: false,
            transmitted_at: None,
            discarded_at: None,
            reports_count: 0,
            reports_completed_count: 0,
            reports_approved_count: 0,
            reports_rejected_count: 0,
        }
    }

    #[must_use]
    pub const fn is_transmitted(&self) -> bool {
        self.transmitted_at.is_some()
    }

    /// True when the package's reports count toward transmitted aggregates.
    #[must_use]
    pub const fn out_of_sandbox(&self) -> bool {
        self.transmitted_at.is_some() && !self.sandbox
    }
}

impl EntityKind for Package {
    type Id = PackageId;

    const NAME: &'static str = "packages";

    fn id(&self) -> PackageId {
        self.id
    }
}

impl Discardable for Package {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}
