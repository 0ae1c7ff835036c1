//! Command-line entry point for the contact book.
//!
//! # Responsibility
//! - Resolve configuration, start logging, build one `ContactBook`.
//! - Map subcommands onto the boundary API and print its messages.
//!
//! # Invariants
//! - Failed operations exit with status 1 and print the message on stderr.

use clap::{Parser, Subcommand};
use contactbook_core::api::{self, ActionResponse};
use contactbook_core::{
    core_version, init_logging, Contact, ContactBook, ContactBookConfig, SpreadsheetFormat,
};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "contactbook")]
#[command(about = "Personal contact directory backed by SQLite", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides CONTACTBOOK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List contacts, starred first
    #[command(alias = "ls")]
    List,

    /// Case-insensitive substring search over every field
    Search { term: String },

    /// Add a contact
    Add {
        first_name: String,
        #[arg(default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        institution: String,
        #[arg(long)]
        starred: bool,
    },

    /// Replace a contact's fields, renaming it when new names are given
    Update {
        old_first_name: String,
        #[arg(default_value = "")]
        old_last_name: String,
        /// New first name (defaults to the current one)
        #[arg(long)]
        first_name: Option<String>,
        /// New last name (defaults to the current one)
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        institution: String,
        #[arg(long)]
        starred: bool,
    },

    /// Delete a contact
    #[command(alias = "rm")]
    Delete {
        first_name: String,
        #[arg(default_value = "")]
        last_name: String,
    },

    /// Toggle the starred flag
    Star {
        first_name: String,
        #[arg(default_value = "")]
        last_name: String,
    },

    /// Import contacts from an .xlsx, .xls or .csv file
    Import { file: PathBuf },

    /// Export contacts to an .xlsx or .csv file
    Export { file: PathBuf },

    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("contactbook_core version={}", core_version());
        return ExitCode::SUCCESS;
    }

    let mut config = ContactBookConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let book = match ContactBook::from_config(&config) {
        Ok(book) => book,
        Err(err) => {
            eprintln!("cannot open contact store: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!("event=cli_start module=cli status=ok");

    match run(&book, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(book: &ContactBook, command: Commands) -> Result<(), String> {
    match command {
        Commands::List => print_contacts(api::list_contacts(book).map_err(failed)?),
        Commands::Search { term } => {
            print_contacts(api::search_contacts(book, &term).map_err(failed)?)
        }
        Commands::Add {
            first_name,
            last_name,
            category,
            phone,
            email,
            address,
            institution,
            starred,
        } => {
            let contact = Contact {
                first_name,
                last_name,
                category,
                phone_number: phone,
                email,
                address,
                institution,
                is_starred: starred,
            };
            report(api::add_contact(book, &contact.to_map()))?;
        }
        Commands::Update {
            first_name,
            last_name,
            category,
            phone,
            email,
            address,
            institution,
            starred,
            old_first_name,
            old_last_name,
        } => {
            let contact = Contact {
                first_name: first_name.unwrap_or_else(|| old_first_name.clone()),
                last_name: last_name.unwrap_or_else(|| old_last_name.clone()),
                category,
                phone_number: phone,
                email,
                address,
                institution,
                is_starred: starred,
            };
            report(api::update_contact(
                book,
                &old_first_name,
                &old_last_name,
                &contact.to_map(),
            ))?;
        }
        Commands::Delete {
            first_name,
            last_name,
        } => report(api::delete_contact(book, &first_name, &last_name))?,
        Commands::Star {
            first_name,
            last_name,
        } => report(api::toggle_star(book, &first_name, &last_name))?,
        Commands::Import { file } => import(book, &file)?,
        Commands::Export { file } => export(book, &file)?,
        Commands::Version => {}
    }
    Ok(())
}

fn import(book: &ContactBook, file: &Path) -> Result<(), String> {
    let bytes =
        std::fs::read(file).map_err(|err| format!("cannot read {}: {err}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let response = api::import_contacts(book, &file_name, &bytes);
    if !response.success {
        return Err(response.error.unwrap_or_default());
    }
    println!(
        "imported={} duplicates={} invalid={}",
        response.imported, response.duplicates, response.invalid
    );
    Ok(())
}

fn export(book: &ContactBook, file: &Path) -> Result<(), String> {
    let format = SpreadsheetFormat::from_file_name(&file.to_string_lossy());
    let export = api::export_contacts(book, format).map_err(failed)?;
    std::fs::write(file, &export.bytes)
        .map_err(|err| format!("cannot write {}: {err}", file.display()))?;
    println!("wrote {} ({} bytes)", file.display(), export.bytes.len());
    Ok(())
}

fn print_contacts(contacts: Vec<Contact>) {
    for contact in contacts {
        let marker = if contact.is_starred { "★" } else { " " };
        let details = [
            contact.category.as_str(),
            contact.institution.as_str(),
            contact.phone_number.as_str(),
            contact.email.as_str(),
            contact.address.as_str(),
        ]
        .into_iter()
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
        println!("{marker} {}  {details}", contact.key());
    }
}

fn report(response: ActionResponse) -> Result<(), String> {
    if response.ok {
        println!("{}", response.message);
        Ok(())
    } else {
        Err(response.message)
    }
}

fn failed(response: ActionResponse) -> String {
    response.message
}
