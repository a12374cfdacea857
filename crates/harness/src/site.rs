use vistoria_core::{Actor, AppConfig, DateKey, ItemStatus};
use vistoria_engine::{CommitOutcome, Engine, EngineError};
use vistoria_storage::{SqliteStorage, Storage};

use crate::FailingStorage;

pub const DOMAIN: &str = "@estapar.com.br";

/// Parses a `YYYY-MM-DD` literal. Panics on bad input; test use only.
pub fn day(key: &str) -> DateKey {
    match key.parse() {
        Ok(key) => key,
        Err(e) => panic!("bad date literal {key}: {e}"),
    }
}

/// One engine over its own in-memory database.
pub struct TestSite<S: Storage = SqliteStorage> {
    pub engine: Engine<S>,
}

impl TestSite {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Result<Self, EngineError> {
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self {
            engine: Engine::new(config, storage)?,
        })
    }
}

impl TestSite<FailingStorage> {
    /// Site whose storage can be told to fail commits.
    pub fn flaky() -> Result<Self, EngineError> {
        let storage = FailingStorage::new(SqliteStorage::open_in_memory()?);
        Ok(Self {
            engine: Engine::new(AppConfig::default(), storage)?,
        })
    }
}

impl<S: Storage> TestSite<S> {
    pub fn sign_in_admin(&mut self) -> Result<Actor, EngineError> {
        let admin = self.engine.config().admin.clone();
        Ok(self
            .engine
            .login(&admin.identifier, &admin.initial_password)?
            .clone())
    }

    /// Registers `<local>@estapar.com.br` with password `pw-<local>` and
    /// leaves it signed in.
    pub fn sign_up(&mut self, name: &str, local: &str) -> Result<Actor, EngineError> {
        let email = format!("{local}{DOMAIN}");
        Ok(self
            .engine
            .register(name, &email, &format!("pw-{local}"))?
            .clone())
    }

    /// Selects `key`, applies the marks and commits them.
    pub fn check(
        &mut self,
        key: &str,
        marks: &[(&str, &str, ItemStatus, &str)],
    ) -> Result<CommitOutcome, EngineError> {
        self.engine.select_date(day(key))?;
        for (section, item, status, observation) in marks {
            self.engine.set_item(section, item, *status, observation)?;
        }
        self.engine.commit()
    }

    pub fn change_count(&self) -> Result<usize, EngineError> {
        Ok(self.engine.storage().change_log(usize::MAX)?.len())
    }

    pub fn fault_count(&self) -> Result<usize, EngineError> {
        Ok(self.engine.storage().all_faults()?.len())
    }
}
