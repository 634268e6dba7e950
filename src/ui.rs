// UI layer: interactive menu built on `dialoguer`. Each flow gathers
// input, runs one client call behind a spinner and prints a one-line
// result. Request failures are printed, never returned; only terminal
// I/O errors bubble up to `main`. Ctrl-C at a prompt ends the session
// like "Exit" does.

use crate::api::KvClient;
use crate::batch::Batch;
use crate::config::Config;
use crate::display::{
    export_records, format_value, render_record, render_records, ExportFormat,
};
use crate::entry::KeyValueEntry;
use crate::outcome::RequestOutcome;
use crate::transport::Transport;
use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::io::{self, stdout};
use std::time::Duration;
use tracing::info;

/// Main interactive menu. Runs until the user picks "Exit" or declines
/// to perform another operation.
pub fn main_menu<T: Transport>(api: &KvClient<T>, config: &Config) -> Result<()> {
    println!("+----------------------------------+");
    println!("|   Welcome to the SnakeKV client  |");
    println!("+----------------------------------+");
    println!("Connected to {}", api.endpoint());

    match run_menu(api, config) {
        Ok(()) => {}
        Err(e) if is_interrupt(&e) => {
            // The prompt was left mid-line.
            println!();
            info!("Interrupted at a prompt, leaving");
        }
        Err(e) => return Err(e),
    }
    println!("Goodbye!");
    Ok(())
}

fn run_menu<T: Transport>(api: &KvClient<T>, config: &Config) -> Result<()> {
    loop {
        let items = [
            "Save data",
            "Get data",
            "Get data with metadata",
            "Update a value",
            "Delete data",
            "Exit",
        ];
        let selection = Select::new()
            .with_prompt("What would you like to do?")
            .items(&items)
            .default(0)
            .interact()?;
        clear_screen()?;
        match selection {
            0 => handle_save(api)?,
            1 => handle_get(api, config)?,
            2 => handle_get_full(api)?,
            3 => handle_update(api)?,
            4 => handle_delete(api)?,
            _ => break,
        }

        let again = Confirm::new()
            .with_prompt("Do you want to perform another operation?")
            .default(true)
            .interact()?;
        if !again {
            break;
        }
        clear_screen()?;
    }
    Ok(())
}

/// True when the error is the user pressing Ctrl-C inside a prompt.
fn is_interrupt(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::Interrupted)
}

/// Collect one or more entries. A single entry goes through `/put`,
/// several through one `/putall`.
fn handle_save<T: Transport>(api: &KvClient<T>) -> Result<()> {
    println!("Save data");
    let mut batch = Batch::new();
    loop {
        let key = prompt_non_empty("Key")?;
        let value = prompt_non_empty("Value")?;
        match KeyValueEntry::new(&key, Value::String(value)) {
            Ok(entry) => {
                if batch.insert(entry) {
                    println!("Key '{}' was already entered; keeping the newer value.", key.trim());
                }
            }
            Err(e) => println!("{}", e),
        }
        let more = Confirm::new()
            .with_prompt("Do you want to save more values?")
            .default(false)
            .interact()?;
        if !more {
            break;
        }
    }

    let single = if batch.len() == 1 {
        batch.iter().next().cloned()
    } else {
        None
    };
    match single {
        Some(entry) => {
            let outcome = with_spinner("Saving...", || api.save(&entry))?;
            print_outcome("Save", &outcome);
        }
        None => match with_spinner("Saving batch...", || api.save_all(&batch))? {
            Ok(outcome) => print_outcome("Batch save", &outcome),
            Err(e) => println!("Batch save refused: {}", e),
        },
    }
    Ok(())
}

fn handle_get<T: Transport>(api: &KvClient<T>, config: &Config) -> Result<()> {
    println!("Get data");
    let scope = Select::new()
        .with_prompt("Get one value or all values?")
        .items(&["One key", "All keys"])
        .default(0)
        .interact()?;

    if scope == 0 {
        let key = prompt_non_empty("Key to retrieve")?;
        match with_spinner("Fetching...", || api.get(&key))? {
            Ok(RequestOutcome::Success(value)) => {
                println!("Value for '{}': {}", key.trim(), format_value(&value))
            }
            Ok(RequestOutcome::NotFound) => println!("Key '{}' not found in database", key.trim()),
            Ok(other) => println!("Error retrieving key '{}': {}", key.trim(), other),
            Err(e) => println!("{}", e),
        }
        return Ok(());
    }

    let target = Select::new()
        .with_prompt("Display here or save to file?")
        .items(&["Display here", "Save to file"])
        .default(0)
        .interact()?;
    let format = if target == 0 {
        None
    } else {
        let choice = Select::new()
            .with_prompt("File format")
            .items(&["JSON (output.json)", "YAML (output.yaml)"])
            .default(0)
            .interact()?;
        Some(if choice == 0 {
            ExportFormat::Json
        } else {
            ExportFormat::Yaml
        })
    };
    let outcome = with_spinner("Fetching all values...", || api.get_all())?;
    let records = match outcome.records() {
        Some(Ok(records)) => records,
        Some(Err(e)) => {
            println!("Data format error: {}", e);
            return Ok(());
        }
        None => {
            println!("Error retrieving data: {}", outcome);
            return Ok(());
        }
    };

    match format {
        None => println!("{}", render_records(&records)),
        Some(format) => match export_records(&records, &config.export_dir, format) {
            Ok(path) => println!("Data successfully saved to {}", path.display()),
            Err(e) => println!("Error saving file: {:#}", e),
        },
    }
    Ok(())
}

fn handle_get_full<T: Transport>(api: &KvClient<T>) -> Result<()> {
    println!("Get data with metadata");
    let key = prompt_non_empty("Key to retrieve")?;
    let outcome = match with_spinner("Fetching...", || api.get_full(&key))? {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    match outcome.record() {
        Some(Ok(record)) => println!("{}", render_record(&record)),
        Some(Err(e)) => println!("Data format error: {}", e),
        None if outcome == RequestOutcome::NotFound => {
            println!("Key '{}' not found in database", key.trim())
        }
        None => println!("Error retrieving key '{}': {}", key.trim(), outcome),
    }
    Ok(())
}

fn handle_update<T: Transport>(api: &KvClient<T>) -> Result<()> {
    println!("Update a value");
    let key = prompt_non_empty("Key to update")?;
    let value = prompt_non_empty("New value")?;
    match KeyValueEntry::new(&key, Value::String(value)) {
        Ok(entry) => {
            let outcome = with_spinner("Updating...", || api.update(&entry))?;
            print_outcome("Update", &outcome);
        }
        Err(e) => println!("{}", e),
    }
    Ok(())
}

fn handle_delete<T: Transport>(api: &KvClient<T>) -> Result<()> {
    println!("Delete data");
    let scope = Select::new()
        .with_prompt("Delete one value or all values?")
        .items(&["One key", "All keys"])
        .default(0)
        .interact()?;

    if scope == 0 {
        let key = prompt_non_empty("Key to delete")?;
        match with_spinner("Deleting...", || api.delete(&key))? {
            Ok(outcome) => print_outcome("Delete", &outcome),
            Err(e) => println!("{}", e),
        }
        return Ok(());
    }

    println!("WARNING: this will delete ALL data from the database!");
    let confirmed = Confirm::new()
        .with_prompt("Are you absolutely sure?")
        .default(false)
        .interact()?;
    if confirmed {
        let outcome = with_spinner("Deleting everything...", || api.delete_all())?;
        print_outcome("Delete all", &outcome);
    } else {
        println!("Operation cancelled. No data was deleted.");
    }
    Ok(())
}

fn print_outcome(label: &str, outcome: &RequestOutcome) {
    if outcome.is_success() {
        println!("{} succeeded: {}", label, outcome);
    } else {
        println!("{} failed: {}", label, outcome);
    }
}

fn prompt_non_empty(prompt: &str) -> Result<String> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|s: &String| -> Result<(), &'static str> {
            if s.trim().is_empty() {
                Err("Input cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(input)
}

/// Run `f` while a spinner is shown on the terminal.
fn with_spinner<R>(message: &'static str, f: impl FnOnce() -> R) -> Result<R> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = f();
    spinner.finish_and_clear();
    Ok(result)
}

fn clear_screen() -> Result<()> {
    execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn ctrl_c_at_a_prompt_is_an_interrupt() {
        let err: anyhow::Error =
            io::Error::new(io::ErrorKind::Interrupted, "read interrupted").into();
        assert!(is_interrupt(&err));

        let wrapped = Err::<(), _>(io::Error::from(io::ErrorKind::Interrupted))
            .context("Reading menu choice")
            .unwrap_err();
        assert!(is_interrupt(&wrapped));
    }

    #[test]
    fn other_terminal_errors_still_fail() {
        let err: anyhow::Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(!is_interrupt(&err));
        assert!(!is_interrupt(&anyhow::anyhow!("Input cannot be empty")));
    }
}
