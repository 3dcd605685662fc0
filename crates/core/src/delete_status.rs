//! Tri-state deletion marker for entities whose table may carry a `deleted` column.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Requested (or stored) deletion state of a row.
///
/// Stored as the integer codes `0`, `1` and `9`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DeleteStatus {
    /// Row is live. Requesting it on a soft-deleted row reverts the soft delete.
    NotDeleted,
    /// Row is flagged inactive but kept.
    SoftDelete,
    /// Row is physically removed.
    PermanentDelete,
}

impl DeleteStatus {
    pub const fn code(self) -> u8 {
        match self {
            DeleteStatus::NotDeleted => 0,
            DeleteStatus::SoftDelete => 1,
            DeleteStatus::PermanentDelete => 9,
        }
    }

    pub fn is_deleted(self) -> bool {
        self != DeleteStatus::NotDeleted
    }
}

impl From<DeleteStatus> for u8 {
    fn from(value: DeleteStatus) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for DeleteStatus {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeleteStatus::NotDeleted),
            1 => Ok(DeleteStatus::SoftDelete),
            9 => Ok(DeleteStatus::PermanentDelete),
            other => Err(DomainError::validation(format!(
                "unknown delete status code {other} (expected 0, 1 or 9)"
            ))),
        }
    }
}

impl core::fmt::Display for DeleteStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeleteStatus::NotDeleted => write!(f, "NOT_DELETED"),
            DeleteStatus::SoftDelete => write!(f, "SOFT_DELETE"),
            DeleteStatus::PermanentDelete => write!(f, "PERMANENT_DELETE"),
        }
    }
}
