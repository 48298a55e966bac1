#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable surrogate key of a persisted contact. Assigned by the store on insert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four editable columns of the `contacts` table, in display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    PhoneNo,
    Email,
    Address,
}

impl ContactField {
    pub const ALL: [ContactField; 4] = [
        ContactField::Name,
        ContactField::PhoneNo,
        ContactField::Email,
        ContactField::Address,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::PhoneNo => "phone_no",
            ContactField::Email => "email",
            ContactField::Address => "address",
        }
    }

    /// Column width limit from the schema, in characters. `address` is unbounded text.
    pub fn max_chars(self) -> Option<usize> {
        match self {
            ContactField::Name => Some(50),
            ContactField::PhoneNo => Some(15),
            ContactField::Email => Some(50),
            ContactField::Address => None,
        }
    }

    /// Fields that carry a `UNIQUE` constraint when present.
    pub fn is_unique(self) -> bool {
        matches!(self, ContactField::PhoneNo | ContactField::Email)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ContactField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(ContactField::Name),
            "phone" | "phone_no" => Ok(ContactField::PhoneNo),
            "email" => Ok(ContactField::Email),
            "address" => Ok(ContactField::Address),
            other => Err(format!(
                "unknown field '{other}'. expected one of: name, phone, email, address"
            )),
        }
    }
}

/// Case-insensitive substring containment. An empty needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
