pub mod checklist;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod fault_history;
pub mod identity;
pub mod ids;
pub mod records;
pub mod registration;
pub mod template;

pub use checklist::{ChecklistData, ItemState, ItemStatus, SectionState};
pub use clock::LogClock;
pub use config::AppConfig;
pub use error::CoreError;
pub use identity::{Actor, CredentialHandle};
pub use ids::*;
pub use records::*;
pub use registration::{RegistrationError, RegistrationPolicy};
pub use template::{ChecklistTemplate, Section};
