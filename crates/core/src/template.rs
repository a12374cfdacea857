//! Static definition of the inspection zones and the equipment in each.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Separator between section and item in an equipment identity.
pub const EQUIPMENT_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub items: Vec<String>,
}

impl Section {
    pub fn new(name: &str, items: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Ordered zones and their equipment. Section names are unique in the
/// template and item names are unique within their section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistTemplate {
    sections: Vec<Section>,
}

impl ChecklistTemplate {
    pub fn new(sections: Vec<Section>) -> Result<Self, CoreError> {
        let mut section_names = HashSet::new();
        // Identities key the fault log, so no two pairs may join to the same one.
        let mut identities = HashSet::new();
        for section in &sections {
            if section.name.trim().is_empty() {
                return Err(CoreError::InvalidTemplate("empty section name".into()));
            }
            if !section_names.insert(section.name.as_str()) {
                return Err(CoreError::InvalidTemplate(format!(
                    "duplicate section: {}",
                    section.name
                )));
            }
            let mut item_names = HashSet::new();
            for item in &section.items {
                if item.trim().is_empty() {
                    return Err(CoreError::InvalidTemplate(format!(
                        "empty item name in section {}",
                        section.name
                    )));
                }
                if !item_names.insert(item.as_str()) {
                    return Err(CoreError::InvalidTemplate(format!(
                        "duplicate item {} in section {}",
                        item, section.name
                    )));
                }
                let identity = equipment_name(&section.name, item);
                if !identities.insert(identity.clone()) {
                    return Err(CoreError::InvalidTemplate(format!(
                        "duplicate equipment identity: {identity}"
                    )));
                }
            }
        }
        Ok(Self { sections })
    }

    /// The facility checklist used when no override is configured.
    pub fn standard() -> Self {
        Self {
            sections: vec![
                Section::new(
                    "DOCAS",
                    &[
                        "Entrada 01",
                        "Entrada 02",
                        "Entrada 03",
                        "Entrada caminhão",
                        "Saída caminhão",
                        "Saída 01",
                        "Clausura 01",
                        "Saída 02",
                        "Clausura 02",
                    ],
                ),
                Section::new(
                    "PRINCIPAL",
                    &["Entrada 01", "Entrada 02", "Saída 01", "Saída 02", "Saída 03"],
                ),
                Section::new("PREFEITURA", &["Entrada 01", "Entrada 02", "Entrada 03"]),
                Section::new("CALF", &["Entrada 01", "Entrada 02", "Saída 01", "Saída 02"]),
                Section::new(
                    "TOTAL ATACADO",
                    &[
                        "Entrada 01",
                        "Entrada 02",
                        "Saída 01",
                        "Clausura 01",
                        "Saída 02",
                        "Clausura 02",
                    ],
                ),
                Section::new("ARMAZEM", &["Entrada 01", "Entrada 02"]),
                Section::new("MOTO", &["Entrada 01", "Saída 01"]),
                Section::new(
                    "MERCADÃO",
                    &[
                        "Entrada 01",
                        "Entrada 02",
                        "Entrada Caminhão 01",
                        "Saída Caminhão 01",
                        "Saída Veículo 01",
                    ],
                ),
                Section::new(
                    "TERMINAIS",
                    &[
                        "Epa Armazém 01",
                        "Epa Armazém 02",
                        "Epa Total Atacado",
                        "Epa Petz",
                        "Epa O Boticário",
                        "Epa Hiper Ideal Dir",
                        "Epa hiper ideal Esq",
                        "Epa Academia",
                        "Epa Smartfit Dir",
                        "Epa Smartfit Esq",
                        "Epa Americanas Dir",
                        "Epa Americanas Esq",
                        "Epa Caixa 24h Dir",
                        "Epa Caixa 24h Esq",
                        "Epa Pça Alím. Dir",
                        "Epa Pça Alím. Esq",
                    ],
                ),
                Section::new(
                    "TERMINAIS MERCADÃO",
                    &[
                        "Epa Caixa Eletronico",
                        "Epa Caixa Sub",
                        "Epa Restaurante",
                        "Epa Salão Veículos",
                    ],
                ),
            ],
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Every (section, item) pair in template order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(move |i| (s.name.as_str(), i.as_str())))
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn contains(&self, section: &str, item: &str) -> bool {
        self.section(section)
            .is_some_and(|s| s.items.iter().any(|i| i == item))
    }

    /// All equipment identities (`"<Section> - <Item>"`) in template order.
    pub fn equipment_names(&self) -> Vec<String> {
        self.items().map(|(s, i)| equipment_name(s, i)).collect()
    }

    pub fn is_equipment(&self, equipment: &str) -> bool {
        self.items().any(|(s, i)| {
            equipment
                .strip_prefix(s)
                .and_then(|rest| rest.strip_prefix(EQUIPMENT_SEPARATOR))
                .is_some_and(|rest| rest == i)
        })
    }
}

/// Equipment identity used by the fault log and maintenance records.
pub fn equipment_name(section: &str, item: &str) -> String {
    format!("{section}{EQUIPMENT_SEPARATOR}{item}")
}
