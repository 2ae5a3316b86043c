//! Bounty Escrow CLI
//!
//! Command-line interface for the escrow ledger server.

mod client;
mod commands;
mod style;

use bounty_escrow::Amount;
use clap::{Parser, Subcommand};
use client::LedgerClient;
use style::*;

#[derive(Parser)]
#[command(name = "bounty")]
#[command(author = "CortexLM")]
#[command(version)]
#[command(about = "Bounty Escrow - fund bounties, submit work, release rewards", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Ledger server URL
    #[arg(
        short,
        long,
        env = "LEDGER_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    url: String,

    /// Principal to act as (sent as x-principal)
    #[arg(long = "as", env = "LEDGER_PRINCIPAL", global = true)]
    principal: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show ledger status (default view)
    #[command(visible_alias = "st")]
    Status,

    /// List bounties
    #[command(visible_alias = "ls")]
    List {
        #[arg(long, default_value = "0")]
        offset: u64,
        #[arg(short, long, default_value = "20")]
        limit: u64,
    },

    /// Show one bounty and its submissions
    Show { id: u64 },

    /// Create a bounty
    Create {
        /// Bounty description
        data: String,
        /// Declared target reward
        #[arg(short, long)]
        reward: Amount,
    },

    /// Fund a bounty
    Activate {
        id: u64,
        #[arg(short, long)]
        amount: Amount,
        /// Funds attached to the call (defaults to --amount)
        #[arg(long)]
        value: Option<Amount>,
    },

    /// Close a bounty and refund its balance to the issuer
    Close { id: u64 },

    /// Work with submissions
    #[command(subcommand)]
    Submission(SubmissionCommands),

    /// Bounties and submissions of a principal (defaults to --as)
    Mine { principal: Option<String> },

    /// Funds released to a principal (defaults to --as)
    Balance { principal: Option<String> },

    /// Print the event log
    Events {
        #[arg(long, default_value = "0")]
        since: u64,
    },

    /// Run the solvency audit
    Audit,

    /// Engage the circuit breaker (owner only)
    Pause,

    /// Release the circuit breaker (owner only)
    Unpause,

    /// Hand ledger ownership to another principal (owner only)
    TransferOwner { new_owner: String },

    /// Show server configuration
    Config,
}

#[derive(Subcommand)]
enum SubmissionCommands {
    /// List submissions of a bounty
    #[command(visible_alias = "ls")]
    List {
        bounty_id: u64,
        #[arg(long, default_value = "0")]
        offset: u64,
        #[arg(short, long, default_value = "20")]
        limit: u64,
    },

    /// Show a submission by id
    Show { id: u64 },

    /// Submit work against a bounty
    Create { bounty_id: u64, data: String },

    /// Accept a submission, paying out the bounty balance
    Accept { bounty_id: u64, submission_id: u64 },

    /// Reject a submission
    Reject { bounty_id: u64, submission_id: u64 },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let client = LedgerClient::new(&cli.url, cli.principal.clone());

    let result = match cli.command {
        Commands::Status => commands::status::run(&client).await,
        Commands::List { offset, limit } => commands::bounty::list(&client, offset, limit).await,
        Commands::Show { id } => commands::bounty::show(&client, id).await,
        Commands::Create { data, reward } => commands::bounty::create(&client, &data, reward).await,
        Commands::Activate { id, amount, value } => {
            commands::bounty::activate(&client, id, amount, value.unwrap_or(amount)).await
        }
        Commands::Close { id } => commands::bounty::close(&client, id).await,
        Commands::Submission(cmd) => match cmd {
            SubmissionCommands::List {
                bounty_id,
                offset,
                limit,
            } => commands::submission::list(&client, bounty_id, offset, limit).await,
            SubmissionCommands::Show { id } => commands::submission::show(&client, id).await,
            SubmissionCommands::Create { bounty_id, data } => {
                commands::submission::create(&client, bounty_id, &data).await
            }
            SubmissionCommands::Accept {
                bounty_id,
                submission_id,
            } => commands::submission::accept(&client, bounty_id, submission_id).await,
            SubmissionCommands::Reject {
                bounty_id,
                submission_id,
            } => commands::submission::reject(&client, bounty_id, submission_id).await,
        },
        Commands::Mine { principal } => commands::mine::run(&client, principal).await,
        Commands::Balance { principal } => commands::mine::balance(&client, principal).await,
        Commands::Events { since } => commands::events::run(&client, since).await,
        Commands::Audit => commands::events::audit(&client).await,
        Commands::Pause => commands::admin::pause(&client).await,
        Commands::Unpause => commands::admin::unpause(&client).await,
        Commands::TransferOwner { new_owner } => {
            commands::admin::transfer_owner(&client, &new_owner).await
        }
        Commands::Config => commands::config::run(&client).await,
    };

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
