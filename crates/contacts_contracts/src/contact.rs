#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{contains_ignore_case, ContactField, ContactId};
use crate::validation::{Validate, ValidationError};

/// Candidate field set for a contact. Optional fields are `None` when absent.
///
/// Constructors normalize input: surrounding whitespace is trimmed and blank optional
/// values become `None`, so an absent value never collides on a unique column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub phone_no: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ContactFields {
    pub fn new(
        name: impl Into<String>,
        phone_no: Option<String>,
        email: Option<String>,
        address: Option<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            phone_no: normalize_optional(phone_no),
            email: normalize_optional(email),
            address: normalize_optional(address),
        }
    }

    /// Builds a candidate and validates it in one step.
    pub fn v1(
        name: impl Into<String>,
        phone_no: Option<String>,
        email: Option<String>,
        address: Option<String>,
    ) -> Result<Self, ValidationError> {
        let fields = Self::new(name, phone_no, email, address);
        fields.validate()?;
        Ok(fields)
    }

    /// Returns a copy with every field normalized.
    pub fn normalized(&self) -> Self {
        Self::new(
            self.name.clone(),
            self.phone_no.clone(),
            self.email.clone(),
            self.address.clone(),
        )
    }

    pub fn get(&self, field: ContactField) -> Option<&str> {
        match field {
            ContactField::Name => Some(self.name.as_str()),
            ContactField::PhoneNo => self.phone_no.as_deref(),
            ContactField::Email => self.email.as_deref(),
            ContactField::Address => self.address.as_deref(),
        }
    }

    /// Display text of a field; absent values render as the empty string.
    pub fn text(&self, field: ContactField) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContactField::Name => self.name = value.trim().to_string(),
            ContactField::PhoneNo => self.phone_no = normalize_optional(Some(value)),
            ContactField::Email => self.email = normalize_optional(Some(value)),
            ContactField::Address => self.address = normalize_optional(Some(value)),
        }
    }

    /// True when any field contains `query` as a case-insensitive substring.
    /// An empty query matches every record.
    pub fn matches_query(&self, query: &str) -> bool {
        ContactField::ALL
            .iter()
            .any(|field| contains_ignore_case(self.text(*field), query))
    }

    pub fn into_contact(self, id: ContactId) -> Contact {
        Contact { id, fields: self }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// A persisted contact: the stored fields plus the store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    #[serde(flatten)]
    pub fields: ContactFields,
}

/// Partial field set: the edits staged for one contact since the last save.
///
/// A blank value clears an optional field (and empties `name`, which validation rejects).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    values: BTreeMap<ContactField, String>,
}

impl ContactPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: ContactField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Last write per field wins.
    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: ContactField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn merge(&mut self, other: ContactPatch) {
        self.values.extend(other.values);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = ContactField> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContactField, &str)> + '_ {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn apply_to(&self, base: &ContactFields) -> ContactFields {
        let mut out = base.clone();
        for (field, value) in self.iter() {
            out.set(field, value);
        }
        out
    }
}

/// Exact-match filter for batch update/delete. Every given constraint must hold;
/// an empty filter matches every record. A blank expected value matches an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactFilter {
    pub id: Option<ContactId>,
    pub equals: BTreeMap<ContactField, String>,
}

impl ContactFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: ContactId) -> Self {
        Self {
            id: Some(id),
            equals: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: ContactField, value: impl Into<String>) -> Self {
        self.equals.insert(field, value.into().trim().to_string());
        self
    }

    pub fn matches(&self, contact: &Contact) -> bool {
        if let Some(id) = self.id {
            if contact.id != id {
                return false;
            }
        }
        self.equals
            .iter()
            .all(|(field, expected)| contact.fields.text(*field) == expected)
    }
}
