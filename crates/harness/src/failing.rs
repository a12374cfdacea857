use rusqlite::ffi;
use vistoria_core::{
    BlobHash, ChangeLogEntry, DateKey, EquipmentFaultLogEntry, LoginHistoryEntry, Photo,
    PreventiveMaintenanceRecord, ReportSnapshot, UserAccount,
};
use vistoria_storage::{CommitBatch, PhotoBlob, SqliteStorage, Storage, StorageError};

/// Delegates to SQLite but refuses a configurable number of upcoming commit
/// and preventive writes with an I/O error, before touching the database.
pub struct FailingStorage<S: Storage = SqliteStorage> {
    inner: S,
    failing_writes: usize,
}

impl<S: Storage> FailingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_writes: 0,
        }
    }

    pub fn fail_next(&mut self, writes: usize) {
        self.failing_writes = writes;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn injected(&mut self) -> Result<(), StorageError> {
        if self.failing_writes == 0 {
            return Ok(());
        }
        self.failing_writes -= 1;
        Err(StorageError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_IOERR),
            Some("injected write failure".into()),
        )))
    }
}

impl<S: Storage> Storage for FailingStorage<S> {
    fn get_report(&self, key: DateKey) -> Result<Option<ReportSnapshot>, StorageError> {
        self.inner.get_report(key)
    }

    fn upsert_report(&mut self, snapshot: &ReportSnapshot) -> Result<(), StorageError> {
        self.inner.upsert_report(snapshot)
    }

    fn report_keys(&self) -> Result<Vec<DateKey>, StorageError> {
        self.inner.report_keys()
    }

    fn commit_report(&mut self, batch: &CommitBatch) -> Result<(), StorageError> {
        self.injected()?;
        self.inner.commit_report(batch)
    }

    fn append_change_log(
        &mut self,
        entry: &ChangeLogEntry,
        cap: usize,
    ) -> Result<(), StorageError> {
        self.inner.append_change_log(entry, cap)
    }

    fn change_log(&self, limit: usize) -> Result<Vec<ChangeLogEntry>, StorageError> {
        self.inner.change_log(limit)
    }

    fn append_login(&mut self, entry: &LoginHistoryEntry, cap: usize) -> Result<(), StorageError> {
        self.inner.append_login(entry, cap)
    }

    fn login_history(&self, limit: usize) -> Result<Vec<LoginHistoryEntry>, StorageError> {
        self.inner.login_history(limit)
    }

    fn append_fault(&mut self, entry: &EquipmentFaultLogEntry) -> Result<(), StorageError> {
        self.inner.append_fault(entry)
    }

    fn faults_for_equipment(
        &self,
        equipment: &str,
    ) -> Result<Vec<EquipmentFaultLogEntry>, StorageError> {
        self.inner.faults_for_equipment(equipment)
    }

    fn all_faults(&self) -> Result<Vec<EquipmentFaultLogEntry>, StorageError> {
        self.inner.all_faults()
    }

    fn record_preventive(
        &mut self,
        record: &PreventiveMaintenanceRecord,
        photo: &Photo,
        change: &ChangeLogEntry,
        change_log_cap: usize,
    ) -> Result<(), StorageError> {
        self.injected()?;
        self.inner
            .record_preventive(record, photo, change, change_log_cap)
    }

    fn preventives(&self) -> Result<Vec<PreventiveMaintenanceRecord>, StorageError> {
        self.inner.preventives()
    }

    fn photo(&self, hash: BlobHash) -> Result<Option<PhotoBlob>, StorageError> {
        self.inner.photo(hash)
    }

    fn get_user(&self, email: &str) -> Result<Option<UserAccount>, StorageError> {
        self.inner.get_user(email)
    }

    fn insert_user(&mut self, account: &UserAccount) -> Result<(), StorageError> {
        self.inner.insert_user(account)
    }

    fn user_count(&self) -> Result<u64, StorageError> {
        self.inner.user_count()
    }

    fn registration_locked(&self) -> Result<bool, StorageError> {
        self.inner.registration_locked()
    }

    fn set_registration_locked(&mut self, locked: bool) -> Result<(), StorageError> {
        self.inner.set_registration_locked(locked)
    }
}
