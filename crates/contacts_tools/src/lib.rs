#![forbid(unsafe_code)]

pub mod config;
pub mod contacts_cli;
pub mod logging;
pub mod shell;
