//! Airdropper CLI
//!
//! Command-line interface for the batch airdrop program operator.

mod shell;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::{info, warn};

use airdropper_distribution::{
    batch_total, lamports_to_sol, parse_lines, validate, AggregateStats, AirdropError,
    BatchCompletedEvent, DistributionBatch, DistributionClient, SubmissionError,
};
use airdropper_keystore::{expand_path, load_keypair, load_or_generate_keypair};
use airdropper_logging::LogLevel;
use airdropper_settings::{default_settings_path, Mode, Settings};

/// Balance given to the operator of a fresh in-memory ledger
const MOCK_OPERATOR_FUNDING: u64 = 100 * LAMPORTS_PER_SOL;

/// Airdropper - batch SOL distribution
#[derive(Parser)]
#[command(name = "airdropper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: ~/.airdropper/settings.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Operator keypair file
    #[arg(short, long, global = true)]
    keypair: Option<String>,

    /// RPC endpoint
    #[arg(short = 'u', long, global = true)]
    url: Option<String>,

    /// Airdrop program id (base58)
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// Run against an in-memory simulation of the program
    #[arg(long, global = true)]
    mock: bool,

    /// Increase logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the program state; the operator becomes its owner
    Init,

    /// Pay every recipient in one atomic batch
    Distribute {
        /// File with one recipient address per line
        #[arg(short, long)]
        recipients: String,

        /// File with one SOL amount per line, matching the recipients
        #[arg(short, long)]
        amounts: String,

        /// Validate and preview without submitting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show aggregate distribution statistics
    Stats,

    /// Show the SOL balance of an address (the operator by default)
    Balance {
        address: Option<String>,
    },

    /// Show how much SOL an address has received from the program
    Recipient {
        address: String,
    },

    /// Print batch-completion events until interrupted
    Watch,

    /// Show the operator address
    Address {
        /// Create the keypair file if it does not exist
        #[arg(long)]
        generate: bool,
    },

    /// Interactive session with a batch editor and recent history
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    airdropper_logging::init(LogLevel::from_verbosity(cli.verbose));

    let settings = load_settings(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Address { generate } => {
            show_address(&settings, generate, json)?;
        }
        Commands::Init => {
            let client = build_client(&settings)?;
            init(&client, json).await?;
        }
        Commands::Distribute {
            recipients,
            amounts,
            dry_run,
        } => {
            let client = build_client(&settings)?;
            prepare_mock(&client).await?;
            let recipients = read_lines(&expand_path(&recipients))?;
            let amounts = read_lines(&expand_path(&amounts))?;
            if dry_run {
                preview(&client, &recipients, &amounts, json).await?;
            } else {
                distribute(&client, &recipients, &amounts, json).await?;
            }
        }
        Commands::Stats => {
            let client = build_client(&settings)?;
            prepare_mock(&client).await?;
            stats(&client, json).await?;
        }
        Commands::Balance { address } => {
            let client = build_client(&settings)?;
            balance(&client, address, json).await?;
        }
        Commands::Recipient { address } => {
            let client = build_client(&settings)?;
            prepare_mock(&client).await?;
            recipient(&client, &address, json).await?;
        }
        Commands::Watch => {
            let client = build_client(&settings)?;
            watch(&client, json).await?;
        }
        Commands::Shell => {
            let client = build_client(&settings)?;
            shell::Shell::new(client, json).run().await?;
        }
    }

    Ok(())
}

// ============================================================================
// Setup
// ============================================================================

/// Settings file plus command-line overrides
fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = match &cli.config {
        Some(path) => expand_path(path),
        None => default_settings_path(),
    };
    let mut settings = Settings::load_from(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    if cli.mock {
        settings.network.mode = Mode::Mock;
    }
    if let Some(url) = &cli.url {
        settings.network.rpc_url = url.clone();
    }
    if let Some(program_id) = &cli.program_id {
        settings.program.program_id = Some(program_id.clone());
    }
    if let Some(keypair) = &cli.keypair {
        settings.operator.keypair_path = Some(keypair.clone());
    }

    Ok(settings)
}

fn operator_keypair(settings: &Settings) -> Result<Keypair> {
    let path = settings.keypair_path();
    if settings.network.mode == Mode::Mock && !path.exists() {
        info!("[MOCK] No keypair at {}, using an ephemeral operator", path.display());
        return Ok(Keypair::new());
    }
    load_keypair(&path)
        .with_context(|| format!("Failed to load operator keypair from {}", path.display()))
}

pub(crate) fn build_client(settings: &Settings) -> Result<DistributionClient> {
    let config = settings
        .distribution_config()
        .context("Invalid settings")?;
    let keypair = operator_keypair(settings)?;
    let client = DistributionClient::with_keypair(config, keypair);

    if client.is_mock() {
        warn!("[MOCK] Using an in-memory program; nothing is sent to the network");
        client.fund_mock_account(client.operator(), MOCK_OPERATOR_FUNDING)?;
    } else {
        info!("Using {} (program {})", client.config().rpc_url, client.program_id());
    }
    Ok(client)
}

/// A one-shot command gets a fresh in-memory ledger, so initialize it first
async fn prepare_mock(client: &DistributionClient) -> Result<()> {
    if client.is_mock() {
        client.initialize().await.map_err(explain)?;
    }
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_lines(&text))
}

/// Attach an operator-facing hint to errors that need one
pub(crate) fn explain(err: AirdropError) -> anyhow::Error {
    let hint = match &err {
        AirdropError::Submission(e) if e.is_retryable() => Some(
            "The transaction may still have landed. Check `airdropper stats` before retrying",
        ),
        AirdropError::Submission(SubmissionError::NotInitialized) => {
            Some("The program has no state yet. Run `airdropper init` first")
        }
        AirdropError::Submission(SubmissionError::Unauthorized) => {
            Some("Only the operator that initialized the program can distribute")
        }
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}

// ============================================================================
// Output
// ============================================================================

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_stats(stats: &AggregateStats) {
    println!("Airdrop Statistics");
    println!("==================");
    if !stats.is_initialized() {
        println!("Program state not initialized");
        return;
    }
    println!("Total distributed: {} SOL", stats.total_distributed);
    println!("Distributions:     {}", stats.total_batches);
    println!("Owner:             {}", stats.owner);
}

pub(crate) fn print_event(event: &BatchCompletedEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode event: {}", e),
        }
    } else {
        println!(
            "Batch completed: {} recipients, {} SOL (t={})",
            event.total_recipients,
            event.total_sol(),
            event.timestamp
        );
    }
}

pub(crate) fn print_batch(batch: &DistributionBatch) {
    for (i, (address, amount)) in batch.recipients().iter().zip(batch.amounts()).enumerate() {
        println!("{:>3}. {:<44} {} SOL", i + 1, address, amount);
    }
    println!("Total: {} SOL to {} recipients", batch.total(), batch.len());
}

// ============================================================================
// Commands
// ============================================================================

fn show_address(settings: &Settings, generate: bool, json: bool) -> Result<()> {
    let path = settings.keypair_path();
    let keypair = if generate {
        load_or_generate_keypair(&path)
    } else {
        load_keypair(&path)
    }
    .with_context(|| {
        format!(
            "No usable operator keypair at {} (pass --generate to create one)",
            path.display()
        )
    })?;

    if json {
        print_json(&serde_json::json!({
            "address": keypair.pubkey().to_string(),
            "keypairPath": path.display().to_string(),
        }))?;
    } else {
        println!("{}", keypair.pubkey());
    }
    Ok(())
}

async fn init(client: &DistributionClient, json: bool) -> Result<()> {
    info!("Initializing airdrop state for operator {}", client.operator());
    let tx = client
        .initialize()
        .await
        .map_err(explain)
        .context("Initialization failed")?;

    if json {
        print_json(&serde_json::json!({
            "txId": tx.to_string(),
            "owner": client.operator().to_string(),
            "state": client.aggregate_state_address().to_string(),
        }))?;
    } else {
        println!("Initialized. Owner: {}", client.operator());
        println!("Transaction: {}", tx);
    }
    Ok(())
}

async fn preview(
    client: &DistributionClient,
    recipients: &[String],
    amounts: &[String],
    json: bool,
) -> Result<()> {
    let available = lamports_to_sol(client.get_balance_lamports(client.operator()).await?);
    let batch = validate(recipients, amounts, available)?;

    if json {
        print_json(&serde_json::json!({
            "recipients": batch.recipients(),
            "amounts": batch.amounts(),
            "total": batch.total(),
            "available": available,
        }))?;
    } else {
        print_batch(&batch);
        println!("Available: {} SOL", available);
        println!("Dry run: nothing submitted");
    }
    Ok(())
}

async fn distribute(
    client: &DistributionClient,
    recipients: &[String],
    amounts: &[String],
    json: bool,
) -> Result<()> {
    info!(
        "Distributing {} SOL to {} recipients",
        batch_total(amounts),
        recipients.len()
    );
    let tx = client
        .execute_distribution(recipients, amounts)
        .await
        .map_err(explain)
        .context("Distribution failed")?;

    if json {
        print_json(&serde_json::json!({
            "txId": tx.to_string(),
            "recipientCount": recipients.len(),
            "totalAmount": batch_total(amounts),
        }))?;
    } else {
        println!(
            "Distributed {} SOL to {} recipients",
            batch_total(amounts),
            recipients.len()
        );
        println!("Transaction: {}", tx);
    }
    Ok(())
}

async fn stats(client: &DistributionClient, json: bool) -> Result<()> {
    let stats = client.get_stats().await.context("Failed to read statistics")?;
    if json {
        print_json(&stats)?;
    } else {
        print_stats(&stats);
    }
    Ok(())
}

async fn balance(client: &DistributionClient, address: Option<String>, json: bool) -> Result<()> {
    let address = address.unwrap_or_else(|| client.operator().to_string());
    let sol = client.get_balance(&address).await?;
    if json {
        print_json(&serde_json::json!({ "address": address, "balance": sol }))?;
    } else {
        println!("{} SOL", sol);
    }
    Ok(())
}

async fn recipient(client: &DistributionClient, address: &str, json: bool) -> Result<()> {
    let received = client.get_recipient_amount(address).await?;
    if json {
        print_json(&serde_json::json!({ "address": address, "received": received }))?;
    } else {
        println!("{} has received {} SOL", address, received);
    }
    Ok(())
}

async fn watch(client: &DistributionClient, json: bool) -> Result<()> {
    let id = client
        .subscribe_to_events(move |event| print_event(&event, json))
        .await
        .map_err(explain)?;
    if !json {
        println!("Watching program {} (Ctrl-C to stop)", client.program_id());
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    client.unsubscribe(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn temp_settings(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("airdropper-cli-{}-{}", name, std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_distribute_dry_run() {
        let cli = Cli::try_parse_from(vec![
            "airdropper",
            "distribute",
            "-r",
            "recipients.txt",
            "--amounts",
            "amounts.txt",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Distribute { recipients, amounts, dry_run } => {
                assert_eq!(recipients, "recipients.txt");
                assert_eq!(amounts, "amounts.txt");
                assert!(dry_run);
            }
            _ => panic!("expected distribute"),
        }
    }

    #[test]
    fn test_distribute_needs_both_files() {
        let matches = Cli::command().try_get_matches_from(vec!["airdropper", "distribute", "-r", "r.txt"]);
        assert!(matches.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(vec![
            "airdropper",
            "stats",
            "--json",
            "-vv",
            "--mock",
            "-u",
            "http://localhost:8899",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.mock);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.url.as_deref(), Some("http://localhost:8899"));
        assert!(matches!(cli.command, Commands::Stats));
    }

    #[test]
    fn test_balance_address_optional() {
        let cmd = Cli::command();
        assert!(cmd.clone().try_get_matches_from(vec!["airdropper", "balance"]).is_ok());
        assert!(cmd.try_get_matches_from(vec!["airdropper", "recipient"]).is_err());
    }

    #[test]
    fn test_flags_override_settings_file() {
        let path = temp_settings("override");
        let mut stored = Settings::load_from(&path).unwrap();
        stored.network.mode = Mode::Live;
        stored.network.rpc_url = "https://api.devnet.solana.com".to_string();
        stored.save().unwrap();

        let program_id = solana_sdk::pubkey::Pubkey::new_unique().to_string();
        let config = path.display().to_string();
        let cli = Cli::try_parse_from(vec![
            "airdropper",
            "stats",
            "--config",
            config.as_str(),
            "--mock",
            "--url",
            "http://localhost:8899",
            "--program-id",
            program_id.as_str(),
            "-k",
            "/tmp/operator.json",
        ])
        .unwrap();

        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.network.mode, Mode::Mock);
        assert_eq!(settings.network.rpc_url, "http://localhost:8899");
        assert_eq!(settings.program.program_id.as_deref(), Some(program_id.as_str()));
        assert_eq!(settings.operator.keypair_path.as_deref(), Some("/tmp/operator.json"));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_settings_file_used_without_flags() {
        let path = temp_settings("plain");
        let mut stored = Settings::load_from(&path).unwrap();
        stored.network.mode = Mode::Live;
        stored.save().unwrap();

        let config = path.display().to_string();
        let cli = Cli::try_parse_from(vec!["airdropper", "stats", "--config", config.as_str()]).unwrap();
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.network.mode, Mode::Live);
        assert_eq!(settings.program.program_id, None);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn test_mock_client_is_funded() {
        let path = temp_settings("mock-client");
        let config = path.display().to_string();
        let keypair = path.with_file_name("missing.json").display().to_string();
        let cli = Cli::try_parse_from(vec![
            "airdropper",
            "stats",
            "--config",
            config.as_str(),
            "--mock",
            "-k",
            keypair.as_str(),
        ])
        .unwrap();

        let client = build_client(&load_settings(&cli).unwrap()).unwrap();
        assert!(client.is_mock());
        let balance = client.get_balance_lamports(client.operator()).await.unwrap();
        assert_eq!(balance, MOCK_OPERATOR_FUNDING);
    }

    #[test]
    fn test_explain_hints() {
        let err = explain(SubmissionError::Transport("connection reset".into()).into());
        assert!(format!("{:#}", err).contains("may still have landed"));

        let err = explain(SubmissionError::NotInitialized.into());
        assert!(err.to_string().contains("airdropper init"));

        let err = explain(SubmissionError::Unauthorized.into());
        assert!(err.to_string().contains("Only the operator"));

        // No hint: the error is passed through unchanged
        let err = explain(SubmissionError::InsufficientFunds.into());
        assert_eq!(err.to_string(), SubmissionError::InsufficientFunds.to_string());
    }
}
