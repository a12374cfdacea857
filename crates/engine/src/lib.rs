pub mod buffer;
pub mod error;
pub mod reconcile;

pub use buffer::StagedBuffer;
pub use error::EngineError;
pub use reconcile::{ItemChange, Reconciliation, diff, reconcile};

use std::sync::Arc;

use chrono::NaiveDate;
use vistoria_core::{
    Actor, AppConfig, ChangeLogEntry, ChecklistData, ChecklistTemplate, CredentialHandle, DateKey,
    EquipmentFaultLogEntry, ItemStatus, LogClock, LoginHistoryEntry, Photo,
    PreventiveMaintenanceRecord, PreventiveId, RegistrationError, RegistrationPolicy,
    ReportSnapshot, UserAccount,
    export::format_summary,
    fault_history::{DefectCount, defect_counts},
    registration::normalize_email,
};
use vistoria_storage::{CommitBatch, SqliteStorage, Storage, StorageError};

/// What a successful commit wrote besides the snapshot.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub date: DateKey,
    pub change_log: Vec<ChangeLogEntry>,
    pub fault_log: Vec<EquipmentFaultLogEntry>,
}

impl CommitOutcome {
    pub fn is_noop(&self) -> bool {
        self.change_log.is_empty()
    }
}

/// Top-level controller. Owns the session, the staged buffer for the
/// selected date and the storage handle; only `commit` writes snapshots.
pub struct Engine<S: Storage = SqliteStorage> {
    config: AppConfig,
    template: Arc<ChecklistTemplate>,
    policy: RegistrationPolicy,
    clock: LogClock,
    storage: S,
    session: Option<Actor>,
    buffer: Option<StagedBuffer>,
}

impl Engine<SqliteStorage> {
    /// Opens the database named in the configuration.
    pub fn open(config: AppConfig) -> Result<Self, EngineError> {
        let storage = SqliteStorage::open(&config.storage.database)?;
        Self::new(config, storage)
    }
}

impl<S: Storage> Engine<S> {
    pub fn new(config: AppConfig, storage: S) -> Result<Self, EngineError> {
        let template = Arc::new(config.checklist_template()?);
        let policy = config.registration_policy();
        let mut engine = Self {
            config,
            template,
            policy,
            clock: LogClock::new(),
            storage,
            session: None,
            buffer: None,
        };
        engine.ensure_admin()?;
        engine.sync_clock()?;
        Ok(engine)
    }

    /// Moves the clock past the newest stored log entries, which another
    /// engine on the same database may have written.
    fn sync_clock(&mut self) -> Result<(), StorageError> {
        if let Some(head) = self.storage.change_log(1)?.first() {
            self.clock.observe(head.date);
        }
        if let Some(head) = self.storage.login_history(1)?.first() {
            self.clock.observe(head.date);
        }
        Ok(())
    }

    /// Creates the administrative account on first run.
    fn ensure_admin(&mut self) -> Result<(), EngineError> {
        let identifier = self.policy.admin_identifier.clone();
        if self.storage.get_user(&identifier)?.is_some() {
            return Ok(());
        }
        let account = UserAccount {
            name: self.config.admin.name.clone(),
            email: identifier,
            credential: CredentialHandle::derive(&self.config.admin.initial_password),
        };
        match self.storage.insert_user(&account) {
            Ok(()) => {
                tracing::info!(identifier = %account.email, "created administrative account");
                Ok(())
            }
            // Another process bootstrapped it first.
            Err(StorageError::AccountCollision { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn template(&self) -> &Arc<ChecklistTemplate> {
        &self.template
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // Session

    pub fn current_user(&self) -> Option<&Actor> {
        self.session.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|actor| self.policy.is_admin(&actor.email))
    }

    fn require_actor(&self, action: &'static str) -> Result<&Actor, EngineError> {
        self.session
            .as_ref()
            .ok_or(EngineError::Unauthenticated(action))
    }

    /// Signs in and records the sign-in in the login history.
    pub fn login(&mut self, email: &str, password: &str) -> Result<&Actor, EngineError> {
        let actor = self.verify_credentials(email, password)?;
        self.start_session(actor)
    }

    /// Signs in for a single action without recording a login, for callers
    /// that re-authenticate on every invocation.
    pub fn authenticate(&mut self, email: &str, password: &str) -> Result<&Actor, EngineError> {
        let actor = self.verify_credentials(email, password)?;
        tracing::debug!(email = %actor.email, "authenticated");
        Ok(&*self.session.insert(actor))
    }

    fn verify_credentials(&self, email: &str, password: &str) -> Result<Actor, EngineError> {
        let email = normalize_email(email);
        match self.storage.get_user(&email)? {
            Some(account) if account.credential.verify(password) => {
                Ok(Actor::new(&account.name, &account.email))
            }
            _ => {
                tracing::info!(%email, "login refused");
                Err(EngineError::InvalidCredentials)
            }
        }
    }

    fn start_session(&mut self, actor: Actor) -> Result<&Actor, EngineError> {
        self.sync_clock()?;
        let entry = LoginHistoryEntry {
            user: actor.name.clone(),
            email: actor.email.clone(),
            date: self.clock.tick()?,
        };
        self.storage
            .append_login(&entry, self.config.retention.login_history)?;
        tracing::info!(email = %actor.email, "signed in");
        Ok(&*self.session.insert(actor))
    }

    pub fn logout(&mut self) {
        if let Some(actor) = self.session.take() {
            tracing::debug!(email = %actor.email, "signed out");
        }
    }

    /// Read-only access without an account.
    pub fn continue_as_guest(&mut self) {
        self.session = None;
    }

    /// Creates an account and signs it in.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&Actor, EngineError> {
        let normalized = normalize_email(email);
        let locked = self.storage.registration_locked()?;
        let taken = self.storage.get_user(&normalized)?.is_some();
        if let Err(e) = self.policy.check(name, email, password, locked, taken) {
            tracing::info!(email = %normalized, reason = %e, "registration refused");
            return Err(e.into());
        }

        let account = UserAccount {
            name: name.trim().to_string(),
            email: normalized,
            credential: CredentialHandle::derive(password),
        };
        self.storage.insert_user(&account).map_err(|e| match e {
            StorageError::AccountCollision { email } => RegistrationError::EmailTaken(email).into(),
            other => EngineError::from(other),
        })?;
        tracing::info!(email = %account.email, "registered account");
        self.start_session(Actor::new(&account.name, &account.email))
    }

    pub fn registration_locked(&self) -> Result<bool, EngineError> {
        Ok(self.storage.registration_locked()?)
    }

    pub fn set_registration_locked(&mut self, locked: bool) -> Result<(), EngineError> {
        self.require_actor("change registration settings")?;
        if !self.is_admin() {
            return Err(EngineError::Forbidden("change registration settings"));
        }
        self.storage.set_registration_locked(locked)?;
        tracing::info!(locked, "registration lock updated");
        Ok(())
    }

    // Reports

    /// Committed snapshot for `key`, or the all-OK default. Reading never
    /// stores anything.
    pub fn report(&self, key: DateKey) -> Result<ReportSnapshot, EngineError> {
        Ok(self
            .storage
            .get_report(key)?
            .unwrap_or_else(|| ReportSnapshot::new(key, "", self.default_checklist())))
    }

    pub fn report_dates(&self) -> Result<Vec<DateKey>, EngineError> {
        Ok(self.storage.report_keys()?)
    }

    fn default_checklist(&self) -> ChecklistData {
        ChecklistData::default_for(&self.template)
    }

    /// Seeds the staged buffer for `key`. Uncommitted edits are dropped.
    pub fn select_date(&mut self, key: DateKey) -> Result<(), EngineError> {
        let base = self.report(key)?.data;
        if self.is_dirty() {
            tracing::debug!(date = %key, "discarding uncommitted edits");
        }
        self.buffer = Some(StagedBuffer::seed(key, &base));
        Ok(())
    }

    pub fn selected_date(&self) -> Option<DateKey> {
        self.buffer.as_ref().map(StagedBuffer::date)
    }

    /// Re-seeds the buffer when the stored snapshot for the selected date no
    /// longer matches its base. Returns whether it did.
    pub fn reload(&mut self) -> Result<bool, EngineError> {
        let Some(date) = self.selected_date() else {
            return Ok(false);
        };
        let stored = self.report(date)?.data;
        if self.buffer.as_ref().is_some_and(|b| b.base() == &stored) {
            return Ok(false);
        }
        tracing::debug!(%date, "stored report changed; re-seeding");
        self.buffer = Some(StagedBuffer::seed(date, &stored));
        Ok(true)
    }

    pub fn set_item(
        &mut self,
        section: &str,
        item: &str,
        status: ItemStatus,
        observation: &str,
    ) -> Result<(), EngineError> {
        self.require_actor("edit the checklist")?;
        let buffer = self.buffer.as_mut().ok_or(EngineError::NoDateSelected)?;
        buffer.set_item(section, item, status, observation);
        Ok(())
    }

    pub fn staged(&self) -> Option<&ChecklistData> {
        self.buffer.as_ref().map(StagedBuffer::staged)
    }

    pub fn base(&self) -> Option<&ChecklistData> {
        self.buffer.as_ref().map(StagedBuffer::base)
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.as_ref().is_some_and(StagedBuffer::is_dirty)
    }

    pub fn discard(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.discard();
        }
    }

    /// Saves the staged checklist. The diff runs against the snapshot as
    /// stored right now, so retrying after a failure, or saving twice, never
    /// logs the same change again. On failure the buffer is left as it was.
    pub fn commit(&mut self) -> Result<CommitOutcome, EngineError> {
        self.require_actor("save the checklist")?;
        let date = self.selected_date().ok_or(EngineError::NoDateSelected)?;
        self.sync_clock()
            .map_err(|source| EngineError::CommitFailed { date, source })?;

        let base = self
            .storage
            .get_report(date)
            .map_err(|source| EngineError::CommitFailed { date, source })?
            .map(|snapshot| snapshot.data)
            .unwrap_or_else(|| ChecklistData::default_for(&self.template));

        let buffer = self.buffer.as_ref().ok_or(EngineError::NoDateSelected)?;
        let result = reconcile(
            &self.template,
            &base,
            buffer.staged(),
            date,
            self.session.as_ref(),
            &mut self.clock,
        )?;

        let batch = CommitBatch {
            snapshot: result.snapshot,
            change_log: result.change_log,
            fault_log: result.fault_log,
            change_log_cap: self.config.retention.change_log,
        };
        if let Err(source) = self.storage.commit_report(&batch) {
            tracing::warn!(%date, error = %source, "commit failed; staged edits kept");
            return Err(EngineError::CommitFailed { date, source });
        }

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.rebase();
        }
        tracing::info!(
            %date,
            changes = batch.change_log.len(),
            faults = batch.fault_log.len(),
            "checklist saved"
        );
        Ok(CommitOutcome {
            date,
            change_log: batch.change_log,
            fault_log: batch.fault_log,
        })
    }

    /// Shareable text summary of the committed report for `key`.
    pub fn export_summary(&self, key: DateKey) -> Result<String, EngineError> {
        let report = self.report(key)?;
        Ok(format_summary(
            &self.config.organization.report_title,
            &self.template,
            &report,
        ))
    }

    // Preventive maintenance

    pub fn record_preventive(
        &mut self,
        equipment: &str,
        date: NaiveDate,
        photo: Photo,
    ) -> Result<PreventiveMaintenanceRecord, EngineError> {
        let actor = self.require_actor("record preventive maintenance")?.clone();
        if !self.template.is_equipment(equipment) {
            return Err(EngineError::UnknownEquipment(equipment.to_string()));
        }
        if photo.is_empty() {
            return Err(EngineError::MissingPhoto);
        }

        let record = PreventiveMaintenanceRecord {
            id: PreventiveId::new(),
            equipment: equipment.to_string(),
            date,
            photo: photo.reference(),
            collaborator: actor.label(),
        };
        self.sync_clock()?;
        let change = ChangeLogEntry {
            user: actor.name,
            email: actor.email,
            date: self.clock.tick()?,
            change: format!("Registered preventive maintenance for {equipment}."),
        };
        self.storage.record_preventive(
            &record,
            &photo,
            &change,
            self.config.retention.change_log,
        )?;
        tracing::info!(%equipment, %date, "preventive maintenance recorded");
        Ok(record)
    }

    /// Records whose equipment or collaborator contains `filter`, ignoring case.
    pub fn preventives(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<PreventiveMaintenanceRecord>, EngineError> {
        let records = self.storage.preventives()?;
        let Some(needle) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(records);
        };
        let needle = needle.to_lowercase();
        Ok(records
            .into_iter()
            .filter(|r| {
                r.equipment.to_lowercase().contains(&needle)
                    || r.collaborator.to_lowercase().contains(&needle)
            })
            .collect())
    }

    // Fault history

    pub fn equipment_names(&self) -> Vec<String> {
        self.template.equipment_names()
    }

    pub fn fault_history(&self, equipment: &str) -> Result<Vec<EquipmentFaultLogEntry>, EngineError> {
        Ok(self.storage.faults_for_equipment(equipment)?)
    }

    pub fn defect_summary(&self, equipment: &str) -> Result<Vec<DefectCount>, EngineError> {
        Ok(defect_counts(&self.fault_history(equipment)?))
    }

    // Logs

    pub fn change_log(&self) -> Result<Vec<ChangeLogEntry>, EngineError> {
        self.require_actor("view the change log")?;
        Ok(self.storage.change_log(self.config.retention.change_log)?)
    }

    pub fn login_history(&self) -> Result<Vec<LoginHistoryEntry>, EngineError> {
        self.require_actor("view the login history")?;
        Ok(self
            .storage
            .login_history(self.config.retention.login_history)?)
    }
}
