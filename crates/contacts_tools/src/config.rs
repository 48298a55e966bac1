#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "warn";
const VERBOSE_LOG_FILTER: &str = "debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsConfig {
    pub db_path: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl ContactsConfig {
    pub fn from_env() -> Self {
        Self::from_var_map(|key| env::var(key).ok())
    }

    pub fn from_var_map(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            db_path: non_blank("CONTACTS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_db_path(&non_blank)),
            log_filter: non_blank("CONTACTS_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, db_path: Option<PathBuf>, verbose: bool) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        if verbose {
            self.log_filter = VERBOSE_LOG_FILTER.to_string();
        }
        self
    }
}

fn default_db_path(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(xdg_data_home) = lookup("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home)
            .join("contacts")
            .join("contacts.db");
    }
    if let Some(home) = lookup("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("contacts")
            .join("contacts.db");
    }
    PathBuf::from("contacts.db")
}
