// ============================================================
// CLI
// ============================================================
// Interactive menu loop. Thin I/O wrapper: all decisions flow
// into the pipelines through the prompt traits, and every
// failure is reported and returns control to the menu.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::error;

use crate::application::erase::{erase_table, EraseOutcome};
use crate::application::export::{export_table, ExportOutcome};
use crate::application::groups::{
    erase_group, export_group, import_group, GroupEraseOutcome,
};
use crate::application::import::import_table;
use crate::application::prompts::{EraseConfirmation, FilePicker, ImportDecision, ImportMode};
use crate::domain::error::{AppError, Result};
use crate::domain::tables;
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::PgStore;

/// Stdin/stdout implementation of the prompt traits.
pub struct ConsolePrompt;

impl ImportDecision for ConsolePrompt {
    fn resolve_existing_rows(&mut self, table: &str, existing: i64) -> Result<ImportMode> {
        println!("Table '{}' already contains {} rows.", table, existing);
        let answer = ask("Clear existing data before import? (y/n, default n = skip duplicates): ")?;
        match answer.to_lowercase().as_str() {
            "y" => Ok(ImportMode::Replace),
            "n" | "" => Ok(ImportMode::Merge),
            other => Err(AppError::InvalidUserChoice(format!(
                "'{}' is not a valid answer, import cancelled",
                other
            ))),
        }
    }
}

impl EraseConfirmation for ConsolePrompt {
    fn confirm_table(&mut self, table: &str, phrase: &str) -> Result<String> {
        println!();
        println!(
            "WARNING: this permanently deletes ALL data in '{}' and cannot be undone.",
            table
        );
        ask(&format!("Type '{}' to confirm: ", phrase))
    }

    fn confirm_group(&mut self, group: &str) -> Result<bool> {
        println!();
        println!("WARNING: this erases every table in the '{}' group!", group);
        let answer = ask("Continue? (y/n): ")?;
        Ok(answer.to_lowercase() == "y")
    }
}

impl FilePicker for ConsolePrompt {
    fn pick_source(&mut self, table: &str) -> Result<Option<PathBuf>> {
        pick_path(&format!("CSV file to import into '{}' (blank to skip): ", table))
    }

    fn pick_destination(&mut self, table: &str) -> Result<Option<PathBuf>> {
        pick_path(&format!("Destination CSV for '{}' (blank to skip): ", table))
    }
}

fn pick_path(prompt: &str) -> Result<Option<PathBuf>> {
    let answer = ask(prompt)?;
    if answer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(answer)))
    }
}

fn ask(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout()
        .flush()
        .map_err(|e| AppError::IoError(e.to_string()))?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| AppError::IoError(e.to_string()))?;
    Ok(line.trim().to_string())
}

enum Selection {
    Table(&'static str),
    Group(&'static str),
}

fn select_target(action: &str) -> Result<Selection> {
    println!();
    println!("Select the table or data group to {}:", action);
    println!("  1. Restaurant listings ({})", tables::LISTINGS);
    println!("  2. Admin users ({})", tables::ADMIN_USERS);
    println!(
        "  3. Comment data ({} & {})",
        tables::COMMENTS,
        tables::COMMENT_RATINGS
    );
    loop {
        match ask("Enter a number (1-3): ")?.as_str() {
            "1" => return Ok(Selection::Table(tables::LISTINGS)),
            "2" => return Ok(Selection::Table(tables::ADMIN_USERS)),
            "3" => return Ok(Selection::Group(tables::COMMENTS_GROUP)),
            _ => println!("Invalid input, try again."),
        }
    }
}

/// Run the menu loop until the user exits. Operation failures are
/// reported and control returns to the menu; only stdin/stdout
/// failures end the loop.
pub async fn run() -> Result<()> {
    loop {
        println!();
        println!("--- Review database toolkit ---");
        println!("  1. Import a CSV file into the database");
        println!("  2. Export a table to a CSV file");
        println!("  3. Erase table data");
        println!("  4. Exit");

        match ask("Choose an action (1-4): ")?.as_str() {
            "1" => report(run_import().await),
            "2" => report(run_export().await),
            "3" => report(run_erase().await),
            "4" => {
                println!("Goodbye.");
                return Ok(());
            }
            _ => println!("Invalid input, try again."),
        }
    }
}

fn report(result: Result<()>) {
    if let Err(err) = result {
        error!(error = %err, "Operation failed");
        println!("{}", err);
    }
}

async fn connect() -> Result<PgStore> {
    let config = DbConfig::from_env()?;
    PgStore::connect(&config).await
}

async fn run_import() -> Result<()> {
    let selection = select_target("import into")?;
    match selection {
        Selection::Table(table) => {
            let mut prompt = ConsolePrompt;
            let Some(path) = prompt.pick_source(table)? else {
                println!("No file selected, import cancelled.");
                return Ok(());
            };
            let store = connect().await?;
            let result = import_table(&store, &mut ConsolePrompt, &path, table)
                .await
                .map(|r| println!("{}", r.summary()));
            store.close().await;
            result
        }
        Selection::Group(name) => {
            let group = group_or_err(name)?;
            let store = connect().await?;
            let results =
                import_group(&store, &mut ConsolePrompt, &mut ConsolePrompt, group).await;
            store.close().await;
            for (table, result) in results {
                match result {
                    Ok(r) => println!("{}", r.summary()),
                    Err(e) => println!("{}: {}", table, e),
                }
            }
            Ok(())
        }
    }
}

async fn run_export() -> Result<()> {
    let selection = select_target("export")?;
    match selection {
        Selection::Table(table) => {
            let mut prompt = ConsolePrompt;
            let Some(path) = prompt.pick_destination(table)? else {
                println!("No destination selected, export cancelled.");
                return Ok(());
            };
            let store = connect().await?;
            let result = export_table(&store, table, &path)
                .await
                .map(|outcome| print_export(table, outcome));
            store.close().await;
            result
        }
        Selection::Group(name) => {
            let group = group_or_err(name)?;
            let store = connect().await?;
            let results = export_group(&store, &mut ConsolePrompt, group).await;
            store.close().await;
            for (table, result) in results {
                match result {
                    Ok(outcome) => print_export(table, outcome),
                    Err(e) => println!("{}: {}", table, e),
                }
            }
            Ok(())
        }
    }
}

async fn run_erase() -> Result<()> {
    let selection = select_target("erase")?;
    let store = connect().await?;
    let result = match selection {
        Selection::Table(table) => erase_table(&store, &mut ConsolePrompt, table)
            .await
            .map(|outcome| print_erase(table, outcome)),
        Selection::Group(name) => match group_or_err(name) {
            Ok(group) => match erase_group(&store, &mut ConsolePrompt, group).await {
                Ok(GroupEraseOutcome::Cancelled) => {
                    println!("Group erase cancelled.");
                    Ok(())
                }
                Ok(GroupEraseOutcome::Completed(results)) => {
                    for (table, result) in results {
                        match result {
                            Ok(outcome) => print_erase(table, outcome),
                            Err(e) => println!("{}: {}", table, e),
                        }
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
    };
    store.close().await;
    result
}

fn group_or_err(name: &str) -> Result<&'static crate::domain::schema::TableGroup> {
    tables::group(name)
        .ok_or_else(|| AppError::TableNotFound(format!("Unknown table group '{}'", name)))
}

fn print_export(table: &str, outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Written { rows } => println!("{}: exported {} rows.", table, rows),
        ExportOutcome::NoData => println!("{}: no data to export.", table),
    }
}

fn print_erase(table: &str, outcome: EraseOutcome) {
    match outcome {
        EraseOutcome::Erased { rows } => println!("{}: erased {} rows.", table, rows),
        EraseOutcome::Cancelled => println!("{}: confirmation failed, cancelled.", table),
    }
}
