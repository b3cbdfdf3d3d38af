use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notechain_core::{digest, ChainConfig, CipherCodec, CipherKey, NoteLedger};
use notechain_storage::SledStore;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "notechain")]
#[command(about = "Encrypted notes sealed into a local tamper-evident chain")]
struct Cli {
    /// Data directory for sled
    #[arg(long, env = "NOTECHAIN_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// 32-byte cipher key as 64 hex characters. Falls back to the built-in key.
    #[arg(long, env = "NOTECHAIN_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Leading hex zeros required on every block hash
    #[arg(long, default_value_t = notechain_core::constants::POW_DIFFICULTY)]
    difficulty: usize,

    /// Give up mining a block after this many nonces
    #[arg(long)]
    max_mining_iterations: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a note and seal it into the chain
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Edit a stored note; the chain keeps the sealed version
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },
    /// List stored notes
    List,
    /// Decrypt the sealed copy of a note from the chain
    Show { id: String },
    /// Delete a stored note; its block stays in the chain
    Delete { id: String },
    /// Check every block of the chain
    Verify,
    /// Block count, validity and tip
    Stats,
    /// Write the chain as JSON
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the chain with a JSON export if it validates
    Import { file: PathBuf },
    /// SHA-256 hex digest of a string
    Digest { text: String },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = LedgerOptions {
        data_dir: cli.data_dir,
        key: cli.key,
        config: ChainConfig {
            difficulty: cli.difficulty,
            max_mining_iterations: cli.max_mining_iterations,
        },
    };
    run(&opts, cli.cmd)
}

/// Everything needed to open the ledger. Commands that do not touch the
/// store never open it.
struct LedgerOptions {
    data_dir: PathBuf,
    key: Option<String>,
    config: ChainConfig,
}

impl LedgerOptions {
    fn open(&self) -> Result<NoteLedger<SledStore>> {
        let key = match &self.key {
            Some(hex_key) => CipherKey::from_hex(hex_key).context("parse --key")?,
            None => {
                warn!("no key configured; using the built-in development key");
                CipherKey::default()
            }
        };
        let store = Arc::new(SledStore::open(&self.data_dir)?);
        Ok(NoteLedger::open(store, CipherCodec::new(&key), self.config)?)
    }
}

fn run(opts: &LedgerOptions, cmd: Command) -> Result<()> {
    match cmd {
        Command::Add {
            id,
            title,
            content,
            tags,
        } => {
            let mut ledger = opts.open()?;
            if ledger.note(&id)?.is_some() {
                bail!("note {id} already exists");
            }
            let note = ledger.new_note(id, title, content, tags);
            let block = ledger.add_note(&note)?;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        Command::Update {
            id,
            title,
            content,
            tags,
        } => {
            let ledger = opts.open()?;
            let current = ledger
                .note(&id)?
                .with_context(|| format!("note {id} not found"))?;
            let updated = ledger.update_note(
                &id,
                title.unwrap_or(current.title),
                content.unwrap_or(current.content),
                tags.unwrap_or(current.tags),
            )?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Command::List => {
            let ledger = opts.open()?;
            for note in ledger.notes()? {
                println!("{}\t{}\t[{}]", note.id, note.title, note.tags.join(", "));
            }
        }
        Command::Show { id } => {
            let ledger = opts.open()?;
            let note = ledger.reveal(&id)?;
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        Command::Delete { id } => {
            let ledger = opts.open()?;
            if !ledger.delete_note(&id)? {
                bail!("note {id} not found");
            }
            println!("deleted {id}");
        }
        Command::Verify => {
            let ledger = opts.open()?;
            if !ledger.verify() {
                bail!("chain is INVALID");
            }
            println!("chain is valid");
        }
        Command::Stats => {
            let ledger = opts.open()?;
            println!("{}", serde_json::to_string_pretty(&ledger.stats())?);
        }
        Command::Export { out } => {
            let ledger = opts.open()?;
            let exported = ledger.export()?;
            match out {
                Some(path) => fs::write(&path, exported)
                    .with_context(|| format!("write {}", path.display()))?,
                None => println!("{exported}"),
            }
        }
        Command::Import { file } => {
            let mut ledger = opts.open()?;
            let serialized = fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            if !ledger.import(&serialized)? {
                bail!("rejected {}: chain failed validation", file.display());
            }
            println!("imported {} blocks", ledger.stats().count);
        }
        Command::Digest { text } => println!("{}", digest(&text)),
    }
    Ok(())
}
