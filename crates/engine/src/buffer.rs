use vistoria_core::{ChecklistData, DateKey, ItemState, ItemStatus};

/// Working copy of one day's checklist. Holds its own clone of the base it was
/// seeded from, so edits never alias committed state.
#[derive(Debug, Clone)]
pub struct StagedBuffer {
    date: DateKey,
    base: ChecklistData,
    staged: ChecklistData,
}

impl StagedBuffer {
    pub fn seed(date: DateKey, base: &ChecklistData) -> Self {
        Self {
            date,
            base: base.clone(),
            staged: base.clone(),
        }
    }

    pub fn date(&self) -> DateKey {
        self.date
    }

    /// Content the buffer was last seeded from or committed as.
    pub fn base(&self) -> &ChecklistData {
        &self.base
    }

    pub fn staged(&self) -> &ChecklistData {
        &self.staged
    }

    /// Unknown sections and items are created on the fly.
    pub fn set_item(&mut self, section: &str, item: &str, status: ItemStatus, observation: &str) {
        self.staged
            .set_item(section, item, ItemState::new(status, observation));
    }

    pub fn is_dirty(&self) -> bool {
        self.staged != self.base
    }

    pub fn discard(&mut self) {
        self.staged = self.base.clone();
    }

    /// The staged content was committed and is now the base.
    pub(crate) fn rebase(&mut self) {
        self.base = self.staged.clone();
    }
}
