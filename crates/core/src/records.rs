use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist::ChecklistData;
use crate::identity::CredentialHandle;
use crate::ids::{BlobHash, DateKey, FaultLogId, PreventiveId};

/// Committed checklist for one calendar day. At most one exists per `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub id: DateKey,
    /// Day the checklist applies to, not the save time.
    pub date: NaiveDate,
    pub collaborator: String,
    pub data: ChecklistData,
}

impl ReportSnapshot {
    pub fn new(id: DateKey, collaborator: &str, data: ChecklistData) -> Self {
        Self {
            id,
            date: id.date(),
            collaborator: collaborator.to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub user: String,
    pub email: String,
    pub date: DateTime<Utc>,
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentFaultLogEntry {
    pub id: FaultLogId,
    /// `"<Section> - <Item>"`
    pub equipment: String,
    pub date: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginHistoryEntry {
    pub user: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// Where a maintenance photo lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoRef {
    /// Stored in the photo blob table, addressed by content hash.
    Blob {
        hash: BlobHash,
        content_type: String,
    },
    /// Held by an external service.
    External(String),
}

/// Photo supplied with a new maintenance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Photo {
    Inline { content_type: String, bytes: Vec<u8> },
    External(String),
}

impl Photo {
    pub fn reference(&self) -> PhotoRef {
        match self {
            Self::Inline {
                content_type,
                bytes,
            } => PhotoRef::Blob {
                hash: BlobHash::of(bytes),
                content_type: content_type.clone(),
            },
            Self::External(url) => PhotoRef::External(url.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Inline { bytes, .. } => bytes.is_empty(),
            Self::External(url) => url.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreventiveMaintenanceRecord {
    pub id: PreventiveId,
    pub equipment: String,
    pub date: NaiveDate,
    pub photo: PhotoRef,
    /// `"<name> (<email>)"` of whoever recorded it.
    pub collaborator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub name: String,
    /// Account key. The administrative account uses a configured sentinel instead.
    pub email: String,
    pub credential: CredentialHandle,
}
