use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vistoria_core::AppConfig;
use vistoria_engine::{Engine, EngineError};

/// Several engines over one database file, standing in for separate devices
/// that share a store.
pub struct SharedSite {
    dir: TempDir,
    engines: Vec<Engine>,
}

impl SharedSite {
    pub fn new() -> Result<Self, std::io::Error> {
        Ok(Self {
            dir: TempDir::new()?,
            engines: Vec::new(),
        })
    }

    pub fn database(&self) -> PathBuf {
        self.dir.path().join("vistoria.db")
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_engine(&mut self) -> Result<usize, EngineError> {
        let mut config = AppConfig::default();
        config.storage.database = self.database();
        let engine = Engine::open(config)?;
        let index = self.engines.len();
        self.engines.push(engine);
        Ok(index)
    }

    pub fn engine(&self, index: usize) -> &Engine {
        &self.engines[index]
    }

    pub fn engine_mut(&mut self, index: usize) -> &mut Engine {
        &mut self.engines[index]
    }
}
