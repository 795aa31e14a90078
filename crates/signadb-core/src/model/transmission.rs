use crate::model::{
    id::{CollectivityId, PublisherId, TransmissionId, UserId},
    EntityKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// Transmission
///
/// Batch grouping of reports sent in one go. Exactly one of `user_id` and
/// `publisher_id` is set (validated on save): a transmission is initiated
/// either by a collectivity user in the UI or by a publisher over the API.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    pub id: TransmissionId,
    pub collectivity_id: CollectivityId,
    pub user_id: Option<UserId>,
    pub publisher_id: Option<PublisherId>,
    pub sandbox: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transmission {
    #[must_use]
    pub fn for_user(collectivity_id: CollectivityId, user_id: UserId) -> Self {
        Self {
            id: TransmissionId::new(),
            collectivity_id,
            user_id: Some(user_id),
            publisher_id: None,
            sandbox: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn for_publisher(collectivity_id: CollectivityId, publisher_id: PublisherId) -> Self {
        Self {
            id: TransmissionId::new(),
            collectivity_id,
            user_id: None,
            publisher_id: Some(publisher_id),
            sandbox: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

impl EntityKind for Transmission {
    type Id = TransmissionId;

    const NAME: &'static str = "transmissions";

    fn id(&self) -> TransmissionId {
        self.id
    }
}
