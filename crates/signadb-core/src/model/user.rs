use crate::model::{id::UserId, organization::OrganizationRef, Discardable, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// User
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub organization: OrganizationRef,
    pub discarded_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        organization: OrganizationRef,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            organization,
            discarded_at: None,
        }
    }
}

impl EntityKind for User {
    type Id = UserId;

    const NAME: &'static str = "users";

    fn id(&self) -> UserId {
        self.id
    }
}

impl Discardable for User {
    fn discarded_at(&self) -> Option<DateTime<Utc>> {
        self.discarded_at
    }

    fn set_discarded_at(&mut self, at: Option<DateTime<Utc>>) {
        self.discarded_at = at;
    }
}
