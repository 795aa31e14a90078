use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

///
/// Territorial and registry codes.
///
/// These are *soft references*: a code may legitimately point at a row that
/// does not exist yet (an `OfficeCommune` created before its commune is
/// imported, a commune whose EPCI has been dissolved). Resolution happens at
/// query time in the hierarchy resolver; nothing enforces referential
/// integrity on them.
///

macro_rules! code {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
            Serialize, Deserialize,
        )]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_string())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }
    };
}

code!(
    /// INSEE commune code (`"64102"`). Keys the commune ↔ office join.
    CodeInsee
);
code!(
    /// Departement code (`"64"`, `"2A"`, `"974"`).
    CodeDepartement
);
code!(
    /// Region code (`"75"`).
    CodeRegion
);
code!(
    /// SIREN registry number; identifies EPCIs and organizations.
    Siren
);
