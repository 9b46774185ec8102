//! trustgate CLI application
//!
//! A command-line interface for a multisig-governed registry and a
//! co-signature verifier backed by a stats ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trust_gate::cli::{self, AppState, InitOptions};

#[derive(Parser)]
#[command(name = "trustgate")]
#[command(version = "0.1.0")]
#[command(about = "Threshold approvals and co-signed action verification", long_about = None)]
struct Cli {
    /// Data directory for the deployment snapshot
    #[arg(short, long, default_value = ".trustgate_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new set of components
    Init {
        /// JSON deployment config (overrides the flags below)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Deployer address
        #[arg(long)]
        deployer: Option<String>,

        /// Committee addresses (comma-separated)
        #[arg(long)]
        committee: Option<String>,

        /// Confirmations required to execute
        #[arg(short, long)]
        threshold: Option<usize>,

        /// Participants per co-signed action
        #[arg(long)]
        arity: Option<usize>,

        /// Replace an existing deployment
        #[arg(long)]
        force: bool,
    },

    /// Generate a new key pair
    Keygen,

    /// Show the address of a private key
    Address {
        /// Private key (hex)
        #[arg(short, long)]
        key: String,
    },

    /// Show deployment overview
    Info,

    /// Multisig operations
    Multisig {
        #[command(subcommand)]
        action: MultisigCommands,
    },

    /// Show registry minters and platforms
    Registry,

    /// Asset collection operations
    Collection {
        #[command(subcommand)]
        action: CollectionCommands,
    },

    /// Show the nonce of a participant set
    Nonce {
        /// Participant addresses (comma-separated)
        #[arg(short, long)]
        participants: String,
    },

    /// Sign the current action descriptor
    Sign {
        /// Signer's private key (hex)
        #[arg(short, long)]
        key: String,

        /// Resource ids (comma-separated)
        #[arg(long)]
        ids: String,

        /// Authorizer addresses (comma-separated)
        #[arg(long)]
        authorizers: String,

        /// Participant addresses (comma-separated)
        #[arg(long)]
        participants: String,

        /// Sign the commit digest instead of the offer digest
        #[arg(long)]
        commit: bool,
    },

    /// Submit a co-signed action
    Verify {
        /// Submitter address
        #[arg(short, long)]
        from: String,

        /// Signatures in slot order (comma-separated)
        #[arg(short, long)]
        signatures: String,

        /// Resource ids (comma-separated)
        #[arg(long)]
        ids: String,

        /// Authorizer addresses (comma-separated)
        #[arg(long)]
        authorizers: String,

        /// Participant addresses (comma-separated)
        #[arg(long)]
        participants: String,
    },

    /// Show the event log
    Events {
        /// First sequence number to show
        #[arg(long, default_value = "0")]
        since: u64,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the deployment to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a deployment from a file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run an in-memory walkthrough
    Demo {
        /// Committee size
        #[arg(long, default_value = "3")]
        signers: usize,

        /// Confirmations required
        #[arg(short, long, default_value = "2")]
        threshold: usize,
    },
}

#[derive(Subcommand)]
enum MultisigCommands {
    /// Propose a transaction
    Submit {
        /// Committee member submitting
        #[arg(short, long)]
        from: String,

        /// Target address (defaults to the registry)
        #[arg(long)]
        target: Option<String>,

        /// Function signature, e.g. "addMinterAddress(address)"
        #[arg(long)]
        call: Option<String>,

        /// Arguments for --call
        #[arg(long, value_delimiter = ',')]
        args: Vec<String>,

        /// Raw payload (hex)
        #[arg(long)]
        payload: Option<String>,

        /// Value forwarded with the call
        #[arg(long, default_value = "0")]
        value: u128,
    },

    /// Confirm a proposal
    Confirm {
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        index: u64,
    },

    /// Execute a confirmed proposal
    Execute {
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        index: u64,
    },

    /// Show a proposal
    Show {
        #[arg(short, long)]
        index: u64,
    },

    /// List proposals
    List {
        /// Only proposals not yet executed
        #[arg(long)]
        pending: bool,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// Deploy a new collection
    Deploy {
        /// Creator address
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        name: String,
    },

    /// Mint a token
    Mint {
        /// Collection creator
        #[arg(short, long)]
        from: String,

        /// Collection address
        #[arg(short, long)]
        collection: String,

        /// Recipient
        #[arg(short, long)]
        to: String,

        /// Token id (decimal or 0x-prefixed, up to 256 bits)
        #[arg(short, long)]
        id: String,
    },

    /// List collections
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a saved deployment
    match &cli.command {
        Commands::Init {
            config,
            deployer,
            committee,
            threshold,
            arity,
            force,
        } => {
            return cli::cmd_init(
                &cli.data_dir,
                InitOptions {
                    config: config.as_deref(),
                    deployer: deployer.as_deref(),
                    committee: committee.as_deref(),
                    threshold: *threshold,
                    arity: *arity,
                    force: *force,
                },
            );
        }
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Address { key } => return cli::cmd_address(key),
        Commands::Demo { signers, threshold } => return cli::cmd_demo(*signers, *threshold),
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Keygen | Commands::Address { .. } | Commands::Demo { .. } => {
            unreachable!()
        }

        Commands::Info => cli::cmd_info(&state)?,

        Commands::Multisig { action } => match action {
            MultisigCommands::Submit {
                from,
                target,
                call,
                args,
                payload,
                value,
            } => cli::cmd_multisig_submit(
                &mut state,
                &from,
                target.as_deref(),
                call.as_deref(),
                &args,
                payload.as_deref(),
                value,
            )?,
            MultisigCommands::Confirm { from, index } => {
                cli::cmd_multisig_confirm(&mut state, &from, index)?
            }
            MultisigCommands::Execute { from, index } => {
                cli::cmd_multisig_execute(&mut state, &from, index)?
            }
            MultisigCommands::Show { index } => cli::cmd_multisig_show(&state, index)?,
            MultisigCommands::List { pending } => cli::cmd_multisig_list(&state, pending)?,
        },

        Commands::Registry => cli::cmd_registry(&state)?,

        Commands::Collection { action } => match action {
            CollectionCommands::Deploy { from, name } => {
                cli::cmd_collection_deploy(&mut state, &from, &name)?
            }
            CollectionCommands::Mint {
                from,
                collection,
                to,
                id,
            } => cli::cmd_collection_mint(&mut state, &from, &collection, &to, &id)?,
            CollectionCommands::List => cli::cmd_collection_list(&state)?,
        },

        Commands::Nonce { participants } => cli::cmd_nonce(&state, &participants)?,

        Commands::Sign {
            key,
            ids,
            authorizers,
            participants,
            commit,
        } => cli::cmd_sign(&state, &key, &ids, &authorizers, &participants, commit)?,

        Commands::Verify {
            from,
            signatures,
            ids,
            authorizers,
            participants,
        } => cli::cmd_verify(&mut state, &from, &signatures, &ids, &authorizers, &participants)?,

        Commands::Events { since, json } => cli::cmd_events(&state, since, json)?,

        Commands::Export { output } => cli::cmd_export(&state, &output)?,

        Commands::Import { input } => cli::cmd_import(&mut state, &input)?,
    }

    Ok(())
}
