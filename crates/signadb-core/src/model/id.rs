use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

///
/// entity_id
///
/// Declares a typed ULID-backed identifier. Ids are opaque: ordering is the
/// ULID's lexicographic ordering and carries no domain meaning.
///

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
        )]
        pub struct $name(Ulid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Deterministic id from a raw u128, for fixtures and tests.
            #[must_use]
            pub const fn from_u128(raw: u128) -> Self {
                Self(Ulid(raw))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Commune`](crate::model::territory::Commune).
    CommuneId
);
entity_id!(
    /// Identifier of an [`Epci`](crate::model::territory::Epci).
    EpciId
);
entity_id!(
    /// Identifier of a [`Departement`](crate::model::territory::Departement).
    DepartementId
);
entity_id!(
    /// Identifier of a [`Region`](crate::model::territory::Region).
    RegionId
);
entity_id!(
    /// Identifier of a [`Collectivity`](crate::model::organization::Collectivity).
    CollectivityId
);
entity_id!(
    /// Identifier of a [`Publisher`](crate::model::organization::Publisher).
    PublisherId
);
entity_id!(
    /// Identifier of a [`Ddfip`](crate::model::organization::Ddfip).
    DdfipId
);
entity_id!(
    /// Identifier of a [`Dgfip`](crate::model::organization::Dgfip).
    DgfipId
);
entity_id!(
    /// Identifier of a [`User`](crate::model::user::User).
    UserId
);
entity_id!(
    /// Identifier of an [`Office`](crate::model::office::Office).
    OfficeId
);
entity_id!(
    /// Identifier of an [`OfficeCommune`](crate::model::office::OfficeCommune) join row.
    OfficeCommuneId
);
entity_id!(
    /// Identifier of an [`OfficeUser`](crate::model::office::OfficeUser) join row.
    OfficeUserId
);
entity_id!(
    /// Identifier of a [`Report`](crate::model::report::Report).
    ReportId
);
entity_id!(
    /// Identifier of a [`Package`](crate::model::package::Package).
    PackageId
);
entity_id!(
    /// Identifier of a [`Transmission`](crate::model::transmission::Transmission).
    TransmissionId
);
