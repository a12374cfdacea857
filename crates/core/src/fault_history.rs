//! Read-side aggregation over an equipment's fault history.

use std::collections::HashMap;

use serde::Serialize;

use crate::records::EquipmentFaultLogEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefectCount {
    pub description: String,
    pub occurrences: usize,
}

/// Groups entries by exact description and counts them, most frequent first.
/// Ties sort by description so the output is stable.
pub fn defect_counts(entries: &[EquipmentFaultLogEntry]) -> Vec<DefectCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.description.as_str()).or_default() += 1;
    }
    let mut result: Vec<DefectCount> = counts
        .into_iter()
        .map(|(description, occurrences)| DefectCount {
            description: description.to_string(),
            occurrences,
        })
        .collect();
    result.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.description.cmp(&b.description))
    });
    result
}
