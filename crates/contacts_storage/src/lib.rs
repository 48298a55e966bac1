#![forbid(unsafe_code)]

pub mod api;
pub mod repo;
pub mod store;

pub use repo::ContactsRepo;
pub use store::{ConstraintViolation, ContactStore, StorageError};
