//! Opaque asset reference.

use std::fmt;

use primmesh_core::Uuid;
use serde::{Deserialize, Serialize};

/// Identifies one asset in an asset source.
///
/// Only value identity matters; the handle owns nothing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(Uuid);

impl EntityHandle {
    /// Wraps an asset id.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The wrapped asset id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for EntityHandle {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({})", self.0.hyphenated())
    }
}
