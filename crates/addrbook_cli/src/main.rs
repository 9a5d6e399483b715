//! Command-line collaborator for the address book core.
//!
//! # Responsibility
//! - Map user commands and file paths onto `addrbook_core` APIs.
//! - Own all console output; core never prints.

use addrbook_core::{
    core_version, encode_vcard, init_logging, write_csv, ContactRepository, ContactStore,
    CoreConfig, ImportService, DEFAULT_DIAGNOSTIC_LIMIT,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "addrbook", about = "Import, export and merge contacts", version)]
struct Cli {
    /// Store file (overrides ADDRBOOK_STORE_PATH).
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Log level (overrides ADDRBOOK_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory (overrides ADDRBOOK_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List contacts, most recently used first.
    List,
    /// Import a vCard (.vcf) file.
    ImportVcard { file: PathBuf },
    /// Import a CSV file with a header row.
    ImportCsv { file: PathBuf },
    /// Export all contacts as vCard 3.0.
    ExportVcard { file: PathBuf },
    /// Export all contacts as semicolon-separated CSV.
    ExportCsv { file: PathBuf },
    /// Delete one contact by id.
    Delete { id: String },
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::from_env();
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, dir)?;
    }

    if let Command::Version = cli.command {
        println!("addrbook_core version={}", core_version());
        return Ok(());
    }

    let mut store = ContactStore::load(&config.store_path);
    info!(
        "event=cli_command module=cli status=start contacts={}",
        store.len()
    );

    match cli.command {
        Command::List => {
            for contact in store.recent_first() {
                let line = display_line(&contact.full_name(), &contact.email);
                println!("{}\t{}", contact.id, line);
            }
        }
        Command::ImportVcard { file } => {
            let text = std::fs::read_to_string(&file)?;
            let report = ImportService::new(&mut store).import_vcard(&text);
            println!("{}", report.summary("vCard", DEFAULT_DIAGNOSTIC_LIMIT));
        }
        Command::ImportCsv { file } => {
            let text = std::fs::read_to_string(&file)?;
            let report = ImportService::new(&mut store).import_csv(&text)?;
            println!("{}", report.summary("CSV", DEFAULT_DIAGNOSTIC_LIMIT));
        }
        Command::ExportVcard { file } => {
            std::fs::write(&file, encode_vcard(store.all()))?;
            println!("vCard export finished: {} contacts", store.len());
        }
        Command::ExportCsv { file } => {
            std::fs::write(&file, write_csv(store.all())?)?;
            println!("CSV export finished: {} contacts", store.len());
        }
        Command::Delete { id } => {
            if store.delete_by_id(&id)? {
                println!("deleted {id}");
            } else {
                println!("no contact with id {id}");
            }
        }
        Command::Version => {}
    }
    Ok(())
}

fn display_line(full_name: &str, email: &str) -> String {
    match (full_name.is_empty(), email.is_empty()) {
        (false, false) => format!("{full_name}  <{email}>"),
        (false, true) => full_name.to_string(),
        (true, false) => email.to_string(),
        (true, true) => "(no name)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{display_line, Cli};
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn display_line_prefers_name_and_email() {
        assert_eq!(display_line("Jane Doe", "j@x.com"), "Jane Doe  <j@x.com>");
        assert_eq!(display_line("", "j@x.com"), "j@x.com");
        assert_eq!(display_line("", ""), "(no name)");
    }
}
