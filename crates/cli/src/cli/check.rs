use std::str::FromStr;

use vistoria_core::{DateKey, ItemStatus};

use super::Session;

/// One `SECTION:ITEM=ok|issue[:observation]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    section: String,
    item: String,
    status: ItemStatus,
    observation: String,
}

impl FromStr for Mark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, state) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SECTION:ITEM=STATUS, got '{s}'"))?;
        let (section, item) = target
            .split_once(':')
            .ok_or_else(|| format!("expected SECTION:ITEM before '=', got '{target}'"))?;
        let (status, observation) = state.split_once(':').unwrap_or((state, ""));
        let status = ItemStatus::parse(status)
            .ok_or_else(|| format!("status must be 'ok' or 'issue', got '{status}'"))?;

        let (section, item) = (section.trim(), item.trim());
        if section.is_empty() || item.is_empty() {
            return Err(format!("section and item must not be empty in '{s}'"));
        }
        Ok(Self {
            section: section.to_string(),
            item: item.to_string(),
            status,
            observation: observation.trim().to_string(),
        })
    }
}

#[derive(Debug, clap::Parser)]
pub struct Check {
    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<DateKey>,

    /// Marks such as "DOCAS:Entrada 01=issue:sensor fails" or "MOTO:Saída 01=ok"
    #[arg(required = true)]
    marks: Vec<Mark>,
}

impl Check {
    pub(super) fn run(self, session: &Session) -> anyhow::Result<()> {
        let mut engine = session.signed_in()?;
        let date = self.date.unwrap_or_else(DateKey::today);
        engine.select_date(date)?;

        for mark in &self.marks {
            if !engine.template().contains(&mark.section, &mark.item) {
                tracing::warn!(section = %mark.section, item = %mark.item, "not a template item; saved but not logged");
            }
            engine.set_item(&mark.section, &mark.item, mark.status, &mark.observation)?;
        }

        let outcome = engine.commit()?;
        if outcome.is_noop() {
            println!("{date}: nothing changed");
            return Ok(());
        }
        println!("{date}: saved");
        for entry in &outcome.change_log {
            println!("  {}", entry.change);
        }
        for fault in &outcome.fault_log {
            println!("  new fault on {}: {}", fault.equipment, fault.description);
        }
        Ok(())
    }
}
