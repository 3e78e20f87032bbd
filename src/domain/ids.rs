use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declares a strongly-typed entity id wrapping a UUID v4.
///
/// Ids of different entities are distinct types and cannot be mixed up at
/// compile time. The `Display` prefix matches the record keys the platform
/// has always used (`biz-`, `rid-`, ...).
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a platform user (admin, business owner or rider).
    UserId,
    "usr-"
);
entity_id!(
    /// Identifier of a business aggregate.
    BusinessId,
    "biz-"
);
entity_id!(
    /// Identifier of a rider aggregate.
    RiderId,
    "rid-"
);
entity_id!(
    /// Identifier of a delivery.
    DeliveryId,
    "del-"
);
entity_id!(
    /// Identifier of an append-only ledger entry.
    LedgerEntryId,
    "txn-"
);
