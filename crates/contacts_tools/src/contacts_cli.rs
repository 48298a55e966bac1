#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use contacts_contracts::{Contact, ContactField, ContactFields, ContactId, ContactPatch};
use contacts_storage::api;
use contacts_storage::ContactStore;

use crate::logging::logged;

#[derive(Parser, Debug)]
#[command(name = "contacts")]
#[command(about = "Local contact book")]
#[command(version)]
pub struct Cli {
    /// Store file (overrides CONTACTS_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a contact and save it
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List contacts, optionally only those matching QUERY in any field
    Search {
        query: Option<String>,
        /// Print JSON instead of tab-separated rows
        #[arg(long)]
        json: bool,
    },
    /// Change fields of one contact and save. An empty value clears an optional field.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete one contact and save. Deleting an unknown id succeeds.
    Delete { id: i64 },
    /// Interactive editing session over stdin
    Shell,
}

/// Runs one non-interactive command against `store`. `Shell` is handled by the caller.
pub fn execute_contacts_command(
    store: &mut ContactStore,
    command: &Command,
) -> Result<String, String> {
    match command {
        Command::Add {
            name,
            phone,
            email,
            address,
        } => {
            let fields =
                ContactFields::new(name.as_str(), phone.clone(), email.clone(), address.clone());
            let id = logged("add", || api::add(store, fields)).map_err(|e| e.to_string())?;
            save(store)?;
            Ok(format!("added contact {id}"))
        }
        Command::Search { query, json } => {
            let found = logged("search", || api::search(store, query.as_deref()))
                .map_err(|e| format!("search failed: {e}"))?;
            if *json {
                serde_json::to_string_pretty(&found).map_err(|e| e.to_string())
            } else {
                Ok(found.iter().map(format_contact).collect::<Vec<_>>().join("\n"))
            }
        }
        Command::Update {
            id,
            name,
            phone,
            email,
            address,
        } => {
            let mut patch = ContactPatch::new();
            for (field, value) in [
                (ContactField::Name, name),
                (ContactField::PhoneNo, phone),
                (ContactField::Email, email),
                (ContactField::Address, address),
            ] {
                if let Some(value) = value {
                    patch.set(field, value.as_str());
                }
            }
            if patch.is_empty() {
                return Err(
                    "nothing to update. pass at least one of --name, --phone, --email, --address"
                        .to_string(),
                );
            }
            logged("update", || api::update(store, ContactId(*id), &patch))
                .map_err(|e| e.to_string())?;
            save(store)?;
            Ok("OK".to_string())
        }
        Command::Delete { id } => {
            logged("delete", || api::delete(store, ContactId(*id))).map_err(|e| e.to_string())?;
            save(store)?;
            Ok("OK".to_string())
        }
        Command::Shell => Err("shell must be started with an interactive session".to_string()),
    }
}

pub fn format_contact(contact: &Contact) -> String {
    let mut cols = vec![contact.id.to_string()];
    cols.extend(
        ContactField::ALL
            .iter()
            .map(|f| contact.fields.text(*f).to_string()),
    );
    cols.join("\t")
}

fn save(store: &mut ContactStore) -> Result<(), String> {
    logged("save", || api::save_changes(store)).map_err(|e| format!("failed to save: {e}"))
}
