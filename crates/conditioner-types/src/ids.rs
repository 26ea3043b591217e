use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a newtype wrapper around [`Uuid`] for an entity identifier.
///
/// Every entity in the data model (§3) is identified by an opaque unique
/// identifier; distinct newtypes keep a `CampaignId` from being passed where
/// a `DraftId` is expected.
macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(CampaignId);
entity_id!(RawPostId);
entity_id!(CommunityProfileId);
entity_id!(DraftId);
entity_id!(ShadowEntryId);
entity_id!(BlacklistEntryId);
entity_id!(UsageRecordId);
entity_id!(TaskId);

/// An owning tenant identity, used to enforce row isolation everywhere (§3 Ownership).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(pub Uuid);

impl Owner {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for Owner {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
