//! Plain-text daily summary for handing off to a messaging channel.

use std::fmt::Write;

use crate::checklist::ItemStatus;
use crate::records::ReportSnapshot;
use crate::template::ChecklistTemplate;

const OK_MARK: &str = "✅";
const ISSUE_MARK: &str = "❌";
const MISSING_OBSERVATION: &str = "Observação";

pub fn format_summary(title: &str, template: &ChecklistTemplate, report: &ReportSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "*{} - {}*", title, report.date.format("%d/%m/%Y"));
    out.push('\n');

    for section in template.sections() {
        let _ = writeln!(out, "*{}*", section.name.to_uppercase());
        for item in &section.items {
            let state = report.data.item(&section.name, item);
            match state.status {
                ItemStatus::Ok => {
                    let _ = writeln!(out, "{OK_MARK} {item}: OK");
                }
                ItemStatus::Issue => {
                    let observation = if state.has_observation() {
                        state.observation.trim()
                    } else {
                        MISSING_OBSERVATION
                    };
                    let _ = writeln!(out, "{ISSUE_MARK} {item}: {observation}");
                }
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{ChecklistData, ItemState};
    use crate::ids::DateKey;
    use crate::template::Section;

    #[test]
    fn summary_layout() {
        let template = ChecklistTemplate::new(vec![
            Section::new("Docas", &["Entrada 01", "Saída 01"]),
            Section::new("MOTO", &["Entrada 01"]),
        ])
        .unwrap();
        let mut data = ChecklistData::new();
        data.set_item("Docas", "Saída 01", ItemState::issue("cancela travada"));
        data.set_item("MOTO", "Entrada 01", ItemState::issue(""));
        let report = ReportSnapshot::new(
            DateKey::from_ymd(2024, 7, 20).unwrap(),
            "Ana",
            data,
        );

        let text = format_summary("Relatório Diário", &template, &report);
        let expected = "*Relatório Diário - 20/07/2024*\n\n\
            *DOCAS*\n\
            ✅ Entrada 01: OK\n\
            ❌ Saída 01: cancela travada\n\n\
            *MOTO*\n\
            ❌ Entrada 01: Observação\n\n";
        assert_eq!(text, expected);
    }
}
