#![forbid(unsafe_code)]

use contacts_contracts::{Contact, ContactFields, ContactId, ContactPatch};

use crate::store::{ContactStore, StorageError};

/// Typed repository interface for contact persistence wiring.
///
/// The sync coordinator depends on this seam rather than on [`ContactStore`] directly.
pub trait ContactsRepo {
    fn insert_contact_row(&mut self, fields: ContactFields) -> Result<ContactId, StorageError>;
    fn contact_rows(&self, query: Option<&str>) -> Result<Vec<Contact>, StorageError>;
    fn get_contact_row(&self, id: ContactId) -> Result<Option<Contact>, StorageError>;
    fn update_contact_row(
        &mut self,
        id: ContactId,
        patch: &ContactPatch,
    ) -> Result<Contact, StorageError>;
    fn delete_contact_row(&mut self, id: ContactId) -> Result<(), StorageError>;
    fn commit_contact_rows(&mut self) -> Result<(), StorageError>;
    fn has_pending_contact_rows(&self) -> bool;

    /// Marks the point a failed save rolls back to.
    fn begin_save_point(&mut self) -> Result<(), StorageError>;
    fn release_save_point(&mut self) -> Result<(), StorageError>;
    fn rollback_save_point(&mut self) -> Result<(), StorageError>;
}

impl ContactsRepo for ContactStore {
    fn insert_contact_row(&mut self, fields: ContactFields) -> Result<ContactId, StorageError> {
        self.insert(fields)
    }

    fn contact_rows(&self, query: Option<&str>) -> Result<Vec<Contact>, StorageError> {
        self.query(query)
    }

    fn get_contact_row(&self, id: ContactId) -> Result<Option<Contact>, StorageError> {
        self.get(id)
    }

    fn update_contact_row(
        &mut self,
        id: ContactId,
        patch: &ContactPatch,
    ) -> Result<Contact, StorageError> {
        self.update(id, patch)
    }

    fn delete_contact_row(&mut self, id: ContactId) -> Result<(), StorageError> {
        self.delete(id).map(|_| ())
    }

    fn commit_contact_rows(&mut self) -> Result<(), StorageError> {
        self.commit()
    }

    fn has_pending_contact_rows(&self) -> bool {
        self.has_pending_changes()
    }

    fn begin_save_point(&mut self) -> Result<(), StorageError> {
        self.begin_sync_save_point()
    }

    fn release_save_point(&mut self) -> Result<(), StorageError> {
        self.release_sync_save_point()
    }

    fn rollback_save_point(&mut self) -> Result<(), StorageError> {
        self.rollback_sync_save_point()
    }
}
