use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::registration::RegistrationPolicy;
use crate::template::{ChecklistTemplate, Section};

/// Application settings, usually read from `vistoria.toml`.
///
/// Every section has defaults, so a missing file or a partial file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub organization: OrganizationConfig,
    pub admin: AdminConfig,
    pub retention: RetentionConfig,
    pub storage: StorageConfig,
    /// Replaces the built-in checklist when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Vec<Section>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    /// Address suffix required for self-registration.
    pub email_domain: String,
    /// Heading of the exported daily summary.
    pub report_title: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            email_domain: "@estapar.com.br".into(),
            report_title: "Relatório Diário PSB Bahia & Mercadão".into(),
        }
    }
}

/// The bootstrap administrative account, created on first run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Sentinel account key. Need not be a domain address.
    pub identifier: String,
    pub name: String,
    /// Only used when the account is first created.
    pub initial_password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            identifier: "admin".into(),
            name: "Admin Master".into(),
            initial_password: "changeme".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub change_log: usize,
    pub login_history: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            change_log: 50,
            login_history: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("vistoria.db"),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from a TOML file, or the defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::InvalidConfig(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CoreError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::InvalidConfig(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| CoreError::InvalidConfig(format!("failed to write {}: {e}", path.display())))
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.admin.identifier.trim().is_empty() {
            return Err(CoreError::InvalidConfig("admin.identifier is empty".into()));
        }
        if self.organization.email_domain.trim().is_empty() {
            return Err(CoreError::InvalidConfig("organization.email_domain is empty".into()));
        }
        if self.retention.change_log == 0 || self.retention.login_history == 0 {
            return Err(CoreError::InvalidConfig("retention caps must be positive".into()));
        }
        self.checklist_template()?;
        Ok(())
    }

    pub fn checklist_template(&self) -> Result<ChecklistTemplate, CoreError> {
        match &self.template {
            Some(sections) => ChecklistTemplate::new(sections.clone()),
            None => Ok(ChecklistTemplate::standard()),
        }
    }

    pub fn registration_policy(&self) -> RegistrationPolicy {
        RegistrationPolicy::new(&self.organization.email_domain, &self.admin.identifier)
    }
}
