#![forbid(unsafe_code)]

//! Operations the presentation layer calls. Each takes the store handle explicitly.

use std::path::Path;

use contacts_contracts::{validate, Contact, ContactFields, ContactId, ContactPatch};

use crate::store::{ContactStore, StorageError};

pub fn init_store(path: impl AsRef<Path>) -> Result<ContactStore, StorageError> {
    ContactStore::open(path)
}

/// Validates and stages a new record. Durable after [`save_changes`].
pub fn add(store: &mut ContactStore, fields: ContactFields) -> Result<ContactId, StorageError> {
    let fields = validate(fields)?;
    store.insert(fields)
}

pub fn search(store: &ContactStore, query: Option<&str>) -> Result<Vec<Contact>, StorageError> {
    store.query(query)
}

pub fn update(
    store: &mut ContactStore,
    id: ContactId,
    patch: &ContactPatch,
) -> Result<(), StorageError> {
    store.update(id, patch).map(|_| ())
}

/// Idempotent: deleting an absent id succeeds.
pub fn delete(store: &mut ContactStore, id: ContactId) -> Result<(), StorageError> {
    store.delete(id).map(|_| ())
}

pub fn save_changes(store: &mut ContactStore) -> Result<(), StorageError> {
    store.commit()
}
