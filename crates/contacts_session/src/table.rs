#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use contacts_contracts::{Contact, ContactField, ContactFields, ContactId};

/// View-side projection of one record, bound to its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    id: ContactId,
    fields: ContactFields,
    filtered_out: bool,
    pending_delete: bool,
}

impl DisplayRow {
    fn new(contact: Contact) -> Self {
        Self {
            id: contact.id,
            fields: contact.fields,
            filtered_out: false,
            pending_delete: false,
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn fields(&self) -> &ContactFields {
        &self.fields
    }

    pub fn text(&self, field: ContactField) -> &str {
        self.fields.text(field)
    }

    pub fn is_visible(&self) -> bool {
        !self.filtered_out && !self.pending_delete
    }

    pub fn is_filtered_out(&self) -> bool {
        self.filtered_out
    }

    pub fn is_pending_delete(&self) -> bool {
        self.pending_delete
    }

    pub(crate) fn set_filtered_out(&mut self, filtered_out: bool) {
        self.filtered_out = filtered_out;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("no contact row at position {0}")]
    NoSuchRow(usize),
    #[error("contact row {0} is marked for deletion")]
    RowPendingDeletion(usize),
    #[error("no contacts selected")]
    NothingSelected,
}

/// Arena of display rows with a stable id → position index.
///
/// Positions carry no persisted meaning. Rows marked for deletion stay in the arena,
/// hidden, until [`ContactTable::purge_deleted`] runs after a successful save.
#[derive(Debug, Clone, Default)]
pub struct ContactTable {
    rows: Vec<DisplayRow>,
    index: BTreeMap<ContactId, usize>,
}

impl ContactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every row with `records`, in the given order.
    pub fn load(&mut self, records: impl IntoIterator<Item = Contact>) {
        self.rows = records.into_iter().map(DisplayRow::new).collect();
        self.rebuild_index();
    }

    /// Appends a row, or refreshes the row already bound to the same id.
    pub fn push(&mut self, contact: Contact) -> usize {
        if let Some(&pos) = self.index.get(&contact.id) {
            self.rows[pos].fields = contact.fields;
            return pos;
        }
        let pos = self.rows.len();
        self.index.insert(contact.id, pos);
        self.rows.push(DisplayRow::new(contact));
        pos
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, position: usize) -> Option<&DisplayRow> {
        self.rows.get(position)
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn position_of(&self, id: ContactId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &DisplayRow)> + '_ {
        self.rows.iter().enumerate().filter(|(_, r)| r.is_visible())
    }

    pub fn visible_positions(&self) -> Vec<usize> {
        self.visible_rows().map(|(pos, _)| pos).collect()
    }

    /// Writes a cell and returns the id the row is bound to.
    pub fn set_cell(
        &mut self,
        position: usize,
        field: ContactField,
        value: &str,
    ) -> Result<ContactId, TableError> {
        let row = self
            .rows
            .get_mut(position)
            .ok_or(TableError::NoSuchRow(position))?;
        if row.pending_delete {
            return Err(TableError::RowPendingDeletion(position));
        }
        row.fields.set(field, value);
        Ok(row.id)
    }

    /// Hides the rows at `positions` and returns their ids. Nothing is marked when any
    /// position is out of range.
    pub fn mark_deleted(&mut self, positions: &[usize]) -> Result<Vec<ContactId>, TableError> {
        if positions.is_empty() {
            return Err(TableError::NothingSelected);
        }
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.rows.len()) {
            return Err(TableError::NoSuchRow(bad));
        }
        let mut ids = Vec::with_capacity(positions.len());
        for &pos in positions {
            let row = &mut self.rows[pos];
            row.pending_delete = true;
            if !ids.contains(&row.id) {
                ids.push(row.id);
            }
        }
        Ok(ids)
    }

    /// Drops rows marked for deletion and re-indexes the rest. Returns the dropped ids.
    pub fn purge_deleted(&mut self) -> Vec<ContactId> {
        let (gone, kept): (Vec<_>, Vec<_>) =
            self.rows.drain(..).partition(|r| r.pending_delete);
        self.rows = kept;
        self.rebuild_index();
        gone.into_iter().map(|r| r.id).collect()
    }

    /// Writes a cell of the row bound to `id`, bypassing the deletion guard.
    /// Unbound ids are skipped.
    pub(crate) fn restore_cell(&mut self, id: ContactId, field: ContactField, value: &str) {
        if let Some(row) = self.bound_row_mut(id) {
            row.fields.set(field, value);
        }
    }

    /// Marks the row bound to `id` for deletion. Unbound ids are skipped.
    pub(crate) fn restore_deletion(&mut self, id: ContactId) {
        if let Some(row) = self.bound_row_mut(id) {
            row.pending_delete = true;
        }
    }

    fn bound_row_mut(&mut self, id: ContactId) -> Option<&mut DisplayRow> {
        let pos = *self.index.get(&id)?;
        self.rows.get_mut(pos)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [DisplayRow] {
        &mut self.rows
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id, pos))
            .collect();
    }
}
