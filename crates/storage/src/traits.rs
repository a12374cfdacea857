use vistoria_core::{
    BlobHash, ChangeLogEntry, DateKey, EquipmentFaultLogEntry, LoginHistoryEntry, Photo,
    PreventiveMaintenanceRecord, ReportSnapshot, UserAccount,
};

use crate::error::StorageError;

/// Everything one checklist commit persists. Applied all-or-nothing.
#[derive(Debug, Clone)]
pub struct CommitBatch {
    pub snapshot: ReportSnapshot,
    /// In emission order; the last entry ends up newest.
    pub change_log: Vec<ChangeLogEntry>,
    pub fault_log: Vec<EquipmentFaultLogEntry>,
    /// Change-log entries kept after the batch is applied.
    pub change_log_cap: usize,
}

/// A stored photo blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub trait Storage {
    // Reports

    /// Committed snapshot for `key`. A record whose checklist data cannot be
    /// decoded is reported as absent.
    fn get_report(&self, key: DateKey) -> Result<Option<ReportSnapshot>, StorageError>;

    /// Replaces the snapshot sharing `snapshot.id`, or inserts it.
    fn upsert_report(&mut self, snapshot: &ReportSnapshot) -> Result<(), StorageError>;

    /// Stored report dates, newest first.
    fn report_keys(&self) -> Result<Vec<DateKey>, StorageError>;

    fn commit_report(&mut self, batch: &CommitBatch) -> Result<(), StorageError>;

    // Bounded logs, newest first

    fn append_change_log(&mut self, entry: &ChangeLogEntry, cap: usize)
    -> Result<(), StorageError>;

    fn change_log(&self, limit: usize) -> Result<Vec<ChangeLogEntry>, StorageError>;

    fn append_login(&mut self, entry: &LoginHistoryEntry, cap: usize)
    -> Result<(), StorageError>;

    fn login_history(&self, limit: usize) -> Result<Vec<LoginHistoryEntry>, StorageError>;

    // Fault log (unbounded)

    fn append_fault(&mut self, entry: &EquipmentFaultLogEntry) -> Result<(), StorageError>;

    /// Entries for exactly `equipment`, newest first.
    fn faults_for_equipment(
        &self,
        equipment: &str,
    ) -> Result<Vec<EquipmentFaultLogEntry>, StorageError>;

    fn all_faults(&self) -> Result<Vec<EquipmentFaultLogEntry>, StorageError>;

    // Preventive maintenance

    /// Stores the photo, the record and its change-log entry together.
    fn record_preventive(
        &mut self,
        record: &PreventiveMaintenanceRecord,
        photo: &Photo,
        change: &ChangeLogEntry,
        change_log_cap: usize,
    ) -> Result<(), StorageError>;

    /// All records, maintenance date descending.
    fn preventives(&self) -> Result<Vec<PreventiveMaintenanceRecord>, StorageError>;

    fn photo(&self, hash: BlobHash) -> Result<Option<PhotoBlob>, StorageError>;

    // Accounts and settings

    fn get_user(&self, email: &str) -> Result<Option<UserAccount>, StorageError>;

    /// Fails with `AccountCollision` when the e-mail is already taken.
    fn insert_user(&mut self, account: &UserAccount) -> Result<(), StorageError>;

    fn user_count(&self) -> Result<u64, StorageError>;

    fn registration_locked(&self) -> Result<bool, StorageError>;

    fn set_registration_locked(&mut self, locked: bool) -> Result<(), StorageError>;
}
