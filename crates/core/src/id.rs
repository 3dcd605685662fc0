//! Row identifiers.
//!
//! Every table is keyed by a UUIDv7. [`Id`] tags the UUID with the table it
//! points into, so a role id cannot be handed to something expecting a user.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::DomainError;

/// Table an [`Id`] belongs to.
pub trait IdKind {
    /// Name used in `Debug` output and parse errors.
    const NAME: &'static str;
}

/// Table markers.
pub mod kind {
    use super::IdKind;

    #[derive(Debug)]
    pub enum User {}

    #[derive(Debug)]
    pub enum Role {}

    #[derive(Debug)]
    pub enum Permission {}

    impl IdKind for User {
        const NAME: &'static str = "UserId";
    }

    impl IdKind for Role {
        const NAME: &'static str = "RoleId";
    }

    impl IdKind for Permission {
        const NAME: &'static str = "PermissionId";
    }
}

/// A user account (the authenticated actor).
pub type UserId = Id<kind::User>;

/// A persisted role.
pub type RoleId = Id<kind::Role>;

/// A persisted permission row.
pub type PermissionId = Id<kind::Permission>;

/// UUIDv7 key of a row in table `K`. Newer rows sort after older ones.
pub struct Id<K> {
    uuid: Uuid,
    kind: PhantomData<fn() -> K>,
}

impl<K> Id<K> {
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: PhantomData,
        }
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.uuid
    }
}

// Manual impls: derives would put bounds on the uninhabited marker.

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<K> Eq for Id<K> {}

impl<K> PartialOrd for Id<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Id<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uuid.cmp(&other.uuid)
    }
}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<K> Default for Id<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::NAME, self.uuid)
    }
}

impl<K> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<K> From<Uuid> for Id<K> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<K> From<Id<K>> for Uuid {
    fn from(id: Id<K>) -> Self {
        id.uuid
    }
}

impl<K: IdKind> FromStr for Id<K> {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s.trim())
            .map(Self::from_uuid)
            .map_err(|e| DomainError::invalid_id(format!("{}: {e}", K::NAME)))
    }
}

impl<K> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.uuid.serialize(serializer)
    }
}

impl<'de, K> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}
