use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use dotenv::dotenv;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use magpie::models::history::MoveHistory;
use magpie::models::inventory::InventoryEntry;
use magpie::models::plan::Plan;
use magpie::services::{ai_service, organize_service, plan_service, scan_service, undo_service};

#[derive(Parser)]
#[command(name = "magpie", about = "AI-assisted folder organizer with undoable batch moves")]
struct Cli {
    /// Directory to organize
    path: PathBuf,

    /// Skip the initial confirmation prompt
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let base = cli
        .path
        .canonicalize()
        .with_context(|| format!("invalid directory: {}", cli.path.display()))?;
    if !base.is_dir() {
        bail!("not a directory: {}", base.display());
    }

    let mut inventory = scan_service::scan(&base)?;
    if inventory.is_empty() {
        println!("No files found in {}.", base.display());
        return Ok(());
    }

    print_listing(&inventory);
    if !cli.yes && !confirm("\nDo you want to organize these files?")? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let ai_config = ai_service::AiConfig::from_env();
    if ai_config.is_none() {
        warn!("API_KEY/ENDPOINT/MODEL_NAME not configured, using the fallback plan");
    }

    println!("\nGenerating organization suggestion...");
    let mut suggestion = generate_plan(&ai_config, &inventory).await;
    let mut history = MoveHistory::new();

    loop {
        println!("\nSuggested organization:");
        println!("{}", serde_json::to_string_pretty(&suggestion.to_wire_json())?);

        println!("\nOptions:");
        println!("1. Apply changes");
        println!("2. Modify suggestion");
        println!("3. Undo last change");
        println!("4. Quit");

        match prompt("\nEnter your choice (1-4): ")?.as_str() {
            "1" => match organize_service::apply(&base, &suggestion, &mut history) {
                Ok(report) => {
                    println!(
                        "Moved {} file(s), skipped {}.",
                        report.moved_count(),
                        report.skipped_count()
                    );
                    if !report.success() {
                        println!("Some moves failed; see the log. Moved files can be undone.");
                    }
                    inventory = scan_service::scan(&base)?;
                }
                Err(err) => println!("Organization failed: {err}"),
            },
            "2" => {
                let feedback =
                    prompt("\nDescribe how you'd like to modify the organization:\n")?;
                println!("\nGenerating new suggestion based on your feedback...");
                suggestion = revise_plan(&ai_config, &inventory, &suggestion, &feedback).await;
            }
            "3" => match undo_service::undo(&base, &mut history) {
                Ok(report) => {
                    println!(
                        "Restored {} file(s), removed {} folder(s).",
                        report.restored,
                        report.pruned_dirs.len()
                    );
                    inventory = scan_service::scan(&base)?;
                    suggestion = generate_plan(&ai_config, &inventory).await;
                }
                Err(err) => println!("Undo failed: {err}"),
            },
            "4" => break,
            other => println!("Invalid choice: {other}"),
        }
    }

    Ok(())
}

async fn generate_plan(
    config: &Option<ai_service::AiConfig>,
    inventory: &[InventoryEntry],
) -> Plan {
    match config {
        Some(config) => ai_service::request_plan(config, inventory).await,
        None => plan_service::fallback_plan(inventory),
    }
}

async fn revise_plan(
    config: &Option<ai_service::AiConfig>,
    inventory: &[InventoryEntry],
    previous: &Plan,
    feedback: &str,
) -> Plan {
    match config {
        Some(config) => {
            ai_service::request_revised_plan(config, inventory, previous, feedback).await
        }
        None => plan_service::fallback_plan(inventory),
    }
}

fn print_listing(inventory: &[InventoryEntry]) {
    println!("\nFiles and folders in the directory:");
    for entry in inventory {
        let tag = format!("[{}]", entry.category.label().to_uppercase());
        println!("{tag:14} {}", entry.relative_path);
    }
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(message: &str) -> anyhow::Result<bool> {
    loop {
        match prompt(&format!("{message} (Y/N): "))?.to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => println!("Please enter Y or N"),
        }
    }
}
