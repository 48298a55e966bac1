#![forbid(unsafe_code)]

pub mod common;
pub mod contact;
pub mod validation;

pub use common::{ContactField, ContactId};
pub use contact::{Contact, ContactFields, ContactFilter, ContactPatch};
pub use validation::{validate, Validate, ValidationError};
