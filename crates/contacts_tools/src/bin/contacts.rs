#![forbid(unsafe_code)]

use std::io;

use clap::Parser;
use contacts_session::ContactSession;
use contacts_storage::api::init_store;
use contacts_tools::config::ContactsConfig;
use contacts_tools::contacts_cli::{execute_contacts_command, Cli, Command};
use contacts_tools::logging::{init_tracing, logged};
use contacts_tools::shell::{run_shell, SHELL_HELP};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let config = ContactsConfig::from_env().with_overrides(cli.db.clone(), cli.verbose);
    init_tracing(&config.log_filter);
    tracing::debug!(db = %config.db_path.display(), "contacts store path");

    if cli.command == Command::Shell {
        let mut session = logged("open", || ContactSession::open(&config.db_path))
            .map_err(|e| format!("failed to open {}: {e}", config.db_path.display()))?;
        println!("{SHELL_HELP}");
        let stdin = io::stdin();
        return run_shell(&mut session, stdin.lock(), &mut io::stdout());
    }

    let mut store = logged("open", || init_store(&config.db_path))
        .map_err(|e| format!("failed to open {}: {e}", config.db_path.display()))?;
    let output = execute_contacts_command(&mut store, &cli.command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
