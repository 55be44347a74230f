//! `visitlog` - CLI for the visitor entry log.
//!
//! This binary records, lists, filters and exports visitor entries.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use visitlog::cli::{
    AddCommand, Cli, Command, ConfigCommand, FilterArgs, ImportCommand, ListCommand,
    LookupCommand, OutputFormat, ReportCommand, ShowCommand,
};
use visitlog::export::{format_header, format_row, write_report, Report, BACKUP_FILE_NAME};
use visitlog::{
    encode_photo, init_logging, open_backend, Config, DateRange, Entry, EntryId, EntryQuery,
    EntryStats, Error, LoadOutcome, RecordStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        backend,
        command,
        ..
    } = cli;

    if let Command::Config(cmd) = command {
        return handle_config(config_path, cmd);
    }

    let mut config = Config::load_from(config_path).context("failed to load configuration")?;
    if let Some(backend) = backend {
        config.storage.backend = backend.into();
    }

    let backend = open_backend(&config).context("failed to open storage")?;
    let (mut store, outcome) = RecordStore::open(backend, config.entry_schema()).await;
    if let LoadOutcome::Recovered(e) = &outcome {
        eprintln!("Notice: {e}. Continuing with an empty log.");
    }

    match command {
        Command::Add(cmd) => handle_add(&mut store, cmd).await,
        Command::List(cmd) => handle_list(&store, &cmd),
        Command::Show(cmd) => handle_show(&store, &cmd),
        Command::Delete(cmd) => {
            let id = EntryId::new(cmd.id);
            match store.remove(&id).await.context("failed to delete entry")? {
                Some(entry) => {
                    println!("Deleted entry {} ({})", entry.id, entry.full_name);
                    Ok(())
                }
                None => Err(Error::EntryNotFound(id.to_string()).into()),
            }
        }
        Command::Lookup(cmd) => handle_lookup(&store, &cmd),
        Command::Stats(cmd) => {
            let stats = EntryStats::compute(store.entries(), Local::now().date_naive());
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total entries:  {}", stats.total);
                println!("Entries today:  {}", stats.today);
                match &stats.latest {
                    Some(latest) => println!(
                        "Latest entry:   {} at {}",
                        latest.first_name, latest.entry_timestamp
                    ),
                    None => println!("Latest entry:   none"),
                }
            }
            Ok(())
        }
        Command::Report(cmd) => handle_report(&store, &config, cmd).await,
        Command::Export(cmd) => {
            let dest = cmd.path.unwrap_or_else(|| PathBuf::from(BACKUP_FILE_NAME));
            let receipt = store
                .export_to(&dest)
                .await
                .context("failed to export entries")?;
            println!(
                "Exported {} entries to {}",
                receipt.count,
                receipt.path.display()
            );
            Ok(())
        }
        Command::Import(ImportCommand { path }) => {
            let count = store
                .import_from(&path)
                .await
                .context("failed to import entries")?;
            println!("Imported {count} entries from {}", path.display());
            Ok(())
        }
        Command::Config(_) => Ok(()),
    }
}

async fn handle_add(store: &mut RecordStore, cmd: AddCommand) -> Result<()> {
    let mut new = cmd.to_new_entry();

    if cmd.autofill {
        match store.prefill_for(&new.identifier) {
            Some(prefill) => new = prefill.apply_to(new),
            None => eprintln!(
                "Notice: no earlier entry with identifier '{}' to fill from",
                new.identifier
            ),
        }
    }

    if let Some(photo) = &cmd.photo {
        new.photo = Some(encode_photo(photo).await.context("failed to attach photo")?);
    }

    let entry = store.add(new).await.context("failed to record entry")?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
        OutputFormat::Plain | OutputFormat::Table => println!(
            "Recorded entry {} for {} at {}",
            entry.id, entry.full_name, entry.entry_timestamp
        ),
    }
    Ok(())
}

fn query_for(filter: &FilterArgs) -> Result<(EntryQuery, DateRange)> {
    let range = DateRange::try_from_inputs(filter.from.as_deref(), filter.to.as_deref())?;
    Ok((EntryQuery::new(filter.term(), range), range))
}

fn handle_list(store: &RecordStore, cmd: &ListCommand) -> Result<()> {
    let (query, _) = query_for(&cmd.filter)?;
    let mut hits = store.query(&query);
    if let Some(limit) = cmd.limit {
        hits.truncate(limit);
    }

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    match cmd.format {
        OutputFormat::Table => print_table(&hits),
        OutputFormat::Plain | OutputFormat::Json => {
            for entry in &hits {
                println!(
                    "{}  {}  {} ({}), {} at {}",
                    entry.id,
                    entry.entry_timestamp,
                    entry.full_name,
                    entry.identifier,
                    entry.role,
                    entry.organization
                );
            }
        }
    }
    println!();
    println!("{} of {} entries", hits.len(), store.len());
    Ok(())
}

fn print_table(entries: &[&Entry]) {
    let header = format_header();
    println!("{:<14}  {header}", "Id");
    println!("{}", "-".repeat(header.chars().count() + 16));
    for entry in entries {
        println!("{:<14}  {}", entry.id.as_str(), format_row(entry));
    }
}

fn handle_show(store: &RecordStore, cmd: &ShowCommand) -> Result<()> {
    let entry = store
        .get(&EntryId::new(cmd.id.as_str()))
        .ok_or_else(|| Error::EntryNotFound(cmd.id.clone()))?;

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }

    let or_none = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    println!("Id:            {}", entry.id);
    println!("Name:          {}", entry.full_name);
    println!("Identifier:    {}", or_none(&entry.identifier));
    println!("Role:          {}", entry.role);
    println!("Organization:  {}", entry.organization);
    println!("Municipality:  {}", or_none(&entry.municipality));
    println!("Phone:         {}", or_none(&entry.phone));
    println!("Entered at:    {}", entry.entry_timestamp);
    println!(
        "Photo:         {}",
        if entry.has_photo() { "attached" } else { "none" }
    );
    Ok(())
}

fn handle_lookup(store: &RecordStore, cmd: &LookupCommand) -> Result<()> {
    let Some(prefill) = store.prefill_for(&cmd.identifier) else {
        println!("No entry with identifier '{}'.", cmd.identifier);
        return Ok(());
    };

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&prefill)?);
    } else {
        println!("Name:          {}", prefill.full_name);
        println!("Identifier:    {}", prefill.identifier);
        println!("Role:          {}", prefill.role);
        println!("Organization:  {}", prefill.organization);
        println!("Municipality:  {}", prefill.municipality);
        println!("Phone:         {}", prefill.phone);
    }
    Ok(())
}

async fn handle_report(store: &RecordStore, config: &Config, cmd: ReportCommand) -> Result<()> {
    let (query, range) = query_for(&cmd.filter)?;
    let hits = store.query(&query);

    let now = Local::now();
    let report = Report::build(&hits, &range, config.report_layout(), &now);
    let dir = cmd.output_dir.unwrap_or_else(|| config.report_dir());
    let path = write_report(&report, &dir, now.date_naive())
        .await
        .context("failed to write report")?;

    println!(
        "Report written to {} ({} entries, {} pages)",
        path.display(),
        report.total(),
        report.page_count()
    );
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_config(&config);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            validate_config(&path)?;
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Storage]");
    println!("  Backend:             {}", config.storage.backend);
    println!("  Database path:       {}", config.database_path().display());
    println!("  Data file:           {}", config.data_file_path().display());
    println!();
    println!("[Entry]");
    println!("  Identifier required: {}", config.entry.identifier_required);
    println!();
    println!("[Report]");
    println!("  Rows per page:       {}", config.report.rows_per_page);
    println!("  Output directory:    {}", config.report_dir().display());
}

fn validate_config(path: &Path) -> Result<()> {
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path.to_path_buf())).context("configuration is invalid")?;
    println!("Configuration is valid.");
    Ok(())
}
