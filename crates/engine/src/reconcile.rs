//! Diff-and-log step run when a staged checklist is committed.
//!
//! Every (section, item) pair in the template is compared exactly once, so
//! items nobody touched are still considered and keys outside the template
//! never produce log entries. Each changed item yields one change-log entry;
//! an item that moves from not-faulted into an issue with a written
//! observation additionally yields one fault-log entry.

use vistoria_core::{
    Actor, ChangeLogEntry, ChecklistData, ChecklistTemplate, DateKey, EquipmentFaultLogEntry,
    FaultLogId, ItemState, ItemStatus, LogClock, ReportSnapshot, template::equipment_name,
};

use crate::error::EngineError;

/// One template item whose state differs between base and staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChange {
    pub section: String,
    pub item: String,
    pub before: ItemState,
    pub after: ItemState,
}

impl ItemChange {
    /// Fresh transition into a reported fault, as opposed to an edit of an
    /// observation on an item that was already an issue.
    pub fn is_new_fault(&self) -> bool {
        self.after.is_reported_fault() && self.before.status != ItemStatus::Issue
    }

    pub fn equipment(&self) -> String {
        equipment_name(&self.section, &self.item)
    }

    /// Quotes the observation of a reported fault; every other transition
    /// reads as a change to OK.
    pub fn describe(&self) -> String {
        let (item, section) = (&self.item, &self.section);
        if self.after.is_reported_fault() {
            format!(
                "Changed {item} in {section} to 'Issue': \"{}\"",
                self.after.observation.trim()
            )
        } else {
            format!("Changed {item} in {section} to 'OK'")
        }
    }
}

/// Template items whose status or observation differ, in template order.
pub fn diff(
    template: &ChecklistTemplate,
    base: &ChecklistData,
    staged: &ChecklistData,
) -> Vec<ItemChange> {
    template
        .items()
        .filter_map(|(section, item)| {
            let before = base.item(section, item);
            let after = staged.item(section, item);
            (before != after).then(|| ItemChange {
                section: section.to_string(),
                item: item.to_string(),
                before,
                after,
            })
        })
        .collect()
}

/// Result of reconciling a staged checklist against its committed base.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub snapshot: ReportSnapshot,
    /// In emission order.
    pub change_log: Vec<ChangeLogEntry>,
    pub fault_log: Vec<EquipmentFaultLogEntry>,
}

/// Computes the snapshot and log entries for a commit. Refused outright, with
/// nothing emitted, when no actor is signed in.
pub fn reconcile(
    template: &ChecklistTemplate,
    base: &ChecklistData,
    staged: &ChecklistData,
    date: DateKey,
    actor: Option<&Actor>,
    clock: &mut LogClock,
) -> Result<Reconciliation, EngineError> {
    let actor = actor.ok_or(EngineError::Unauthenticated("save the checklist"))?;

    let mut change_log = Vec::new();
    let mut fault_log = Vec::new();
    for change in diff(template, base, staged) {
        change_log.push(ChangeLogEntry {
            user: actor.name.clone(),
            email: actor.email.clone(),
            date: clock.tick()?,
            change: change.describe(),
        });
        if change.is_new_fault() {
            fault_log.push(EquipmentFaultLogEntry {
                id: FaultLogId::new(),
                equipment: change.equipment(),
                date: clock.tick()?,
                description: change.after.observation.trim().to_string(),
            });
        }
    }

    Ok(Reconciliation {
        snapshot: ReportSnapshot::new(date, &actor.name, staged.clone()),
        change_log,
        fault_log,
    })
}
