#![forbid(unsafe_code)]

//! Line-oriented editing session. Edits and deletions are staged until `save`;
//! leaving without saving discards them.

use std::io::{BufRead, Write};

use contacts_contracts::{ContactField, ContactFields};
use contacts_session::{CacheState, ContactSession};
use contacts_storage::ContactsRepo;

use crate::contacts_cli::format_contact;
use crate::logging::logged;

pub const SHELL_HELP: &str = "commands:
  list                          show visible rows
  add NAME|PHONE|EMAIL|ADDRESS  add a contact (empty parts allowed)
  edit ROW FIELD VALUE          stage a cell edit (fields: name, phone, email, address)
  delete ROW...                 stage rows for deletion
  search [QUERY]                narrow visible rows; no query clears the filter
  save                          apply staged changes
  status                        show pending work
  quit                          leave; unsaved changes are discarded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    Continue(String),
    Quit,
    /// A storage fault ended the session.
    Abort(String),
}

/// Executes one shell line. `Err` carries a message for the user; the session goes on.
pub fn execute_shell_line<R: ContactsRepo>(
    session: &mut ContactSession<R>,
    line: &str,
) -> Result<ShellOutcome, String> {
    let line = line.trim();
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));

    let out = match command {
        "" => String::new(),
        "help" => SHELL_HELP.to_string(),
        "list" => list(session),
        "add" => {
            let mut parts = rest.split('|').map(|p| p.trim().to_string());
            let name = parts.next().unwrap_or_default();
            let fields = ContactFields::new(name, parts.next(), parts.next(), parts.next());
            match logged("add", || session.add(fields)) {
                Ok(id) => format!("added contact {id} (unsaved)"),
                Err(err) if err.is_fatal() => return Ok(ShellOutcome::Abort(err.to_string())),
                Err(err) => return Err(err.to_string()),
            }
        }
        "edit" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let row = parse_row(parts.next())?;
            let field: ContactField = parts
                .next()
                .ok_or_else(|| "usage: edit ROW FIELD VALUE".to_string())?
                .parse()?;
            let value = parts.next().unwrap_or("").trim();
            let id = logged("edit", || session.edit_cell(row, field, value))
                .map_err(|e| e.to_string())?;
            format!("staged {field} for contact {id}")
        }
        "delete" => {
            let rows = rest
                .split_whitespace()
                .map(|raw| parse_row(Some(raw)))
                .collect::<Result<Vec<_>, _>>()?;
            let ids = logged("delete", || session.delete_rows(&rows)).map_err(|e| e.to_string())?;
            format!("staged {} contact(s) for deletion", ids.len())
        }
        "search" => {
            let outcome = session.search(rest);
            match outcome.first_match {
                Some(pos) => format!(
                    "{} shown, {} hidden, first match at row {pos}",
                    outcome.visible, outcome.hidden
                ),
                None if !rest.is_empty() => "no matches".to_string(),
                None => format!("{} shown, {} hidden", outcome.visible, outcome.hidden),
            }
        }
        "save" => match logged("save", || session.save()) {
            Ok(report) => format!(
                "saved: {} updated, {} deleted",
                report.updated.len(),
                report.deleted.len()
            ),
            Err(err) if err.is_fatal() => return Ok(ShellOutcome::Abort(err.to_string())),
            Err(err) => return Err(err.to_string()),
        },
        "status" => status(session),
        "quit" | "exit" => return Ok(ShellOutcome::Quit),
        other => return Err(format!("unknown command: {other}. type 'help'")),
    };
    Ok(ShellOutcome::Continue(out))
}

/// Reads commands from `input` until `quit`, end of input or a storage fault.
pub fn run_shell<R: ContactsRepo>(
    session: &mut ContactSession<R>,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<(), String> {
    for line in input.lines() {
        let line = line.map_err(|e| e.to_string())?;
        match execute_shell_line(session, &line) {
            Ok(ShellOutcome::Continue(text)) => {
                if !text.is_empty() {
                    writeln!(output, "{text}").map_err(|e| e.to_string())?;
                }
            }
            Ok(ShellOutcome::Quit) => break,
            Ok(ShellOutcome::Abort(reason)) => return Err(reason),
            Err(message) => writeln!(output, "error: {message}").map_err(|e| e.to_string())?,
        }
    }
    if session.has_unsaved_changes() {
        writeln!(output, "unsaved changes discarded").map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn list<R: ContactsRepo>(session: &ContactSession<R>) -> String {
    session
        .table()
        .visible_rows()
        .map(|(pos, row)| {
            let contact = row.fields().clone().into_contact(row.id());
            format!("[{pos}]\t{}", format_contact(&contact))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status<R: ContactsRepo>(session: &ContactSession<R>) -> String {
    let cache = session.cache();
    let state = match session.state() {
        CacheState::Clean => "clean",
        CacheState::Dirty => "dirty",
    };
    let mut out = format!(
        "{state}: {} edited, {} deleted",
        cache.edits().count(),
        cache.deletions().count()
    );
    if session.filter().is_active() {
        out.push_str(&format!(", filter '{}'", session.filter().query()));
    }
    if session.has_unsaved_changes() {
        out.push_str(", unsaved");
    }
    out
}

fn parse_row(raw: Option<&str>) -> Result<usize, String> {
    let raw = raw
        .filter(|r| !r.is_empty())
        .ok_or_else(|| "missing row number".to_string())?;
    raw.parse()
        .map_err(|_| format!("not a row number: {raw}"))
}
