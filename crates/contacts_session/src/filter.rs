#![forbid(unsafe_code)]

use crate::table::ContactTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterOutcome {
    pub visible: usize,
    pub hidden: usize,
    /// First visible row after filtering; `None` when a non-empty query matched nothing.
    pub first_match: Option<usize>,
}

/// Row visibility by free-text query. Never touches the store or the change cache.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    active: bool,
    query: String,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// An empty query clears an active filter: every row not marked for deletion becomes
    /// visible again. Otherwise each currently visible row with no field containing the
    /// query (case-insensitively) is hidden.
    pub fn apply(&mut self, table: &mut ContactTable, query: &str) -> FilterOutcome {
        if query.is_empty() {
            if self.active {
                for row in table.rows_mut() {
                    row.set_filtered_out(false);
                }
                self.active = false;
                self.query.clear();
            }
            return outcome(table);
        }

        for row in table.rows_mut() {
            if row.is_visible() && !row.fields().matches_query(query) {
                row.set_filtered_out(true);
            }
        }
        self.active = true;
        self.query = query.to_string();
        outcome(table)
    }

    /// Drops the active flag without touching rows, for a table that was just reloaded.
    pub fn reset(&mut self) {
        self.active = false;
        self.query.clear();
    }
}

fn outcome(table: &ContactTable) -> FilterOutcome {
    let visible = table.visible_positions();
    FilterOutcome {
        visible: visible.len(),
        hidden: table.len() - visible.len(),
        first_match: visible.first().copied(),
    }
}
