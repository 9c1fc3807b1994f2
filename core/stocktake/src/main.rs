//! stocktake: interactive stock counting.
//!
//! The operator types location codes, item codes, and quantities at a
//! prompt; each committed count is folded into a local SQLite inventory
//! and, when a listener is reachable, forwarded over TCP as a JSON event.
//! `undo` reverts the last count, `exit` (or end of input) flushes the
//! pending item and shuts down.

mod classifier;
mod config;
mod error;
mod logging;
mod notify;
mod persist;
mod session;
mod store;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;
use tracing::{error, info, warn};

use config::{Config, Overrides, CONFIG_PATH, PROMPT};
use error::{Result, StocktakeError};
use notify::Notifier;
use session::{Dispatcher, Flow, Session};
use store::Store;

#[derive(Parser)]
#[command(name = "stocktake")]
#[command(about = "Interactive stocktake counter")]
#[command(version)]
struct Cli {
    /// Inventory database path
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Append-only log file path
    #[arg(long, value_name = "PATH")]
    log_path: Option<PathBuf>,

    /// Count listener address (host:port)
    #[arg(long, value_name = "ADDR")]
    listener: Option<String>,

    /// Disable count forwarding for this session
    #[arg(long)]
    offline: bool,
}

fn main() {
    let cli = Cli::parse();
    let (config, config_warning) = Config::resolve(Overrides {
        db_path: cli.db_path,
        log_path: cli.log_path,
        listener: cli.listener,
        offline: cli.offline,
    });

    // The guard keeps the file appender alive; dropping it flushes buffered
    // lines, so the fatal path below drops it before aborting.
    let log_guard = match logging::init(&config.log_path) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    if let Some(details) = config_warning {
        warn!(path = CONFIG_PATH, details = %details, "Ignoring malformed config file");
    }

    if let Err(err) = run(config) {
        error!(error = %err, "Stocktake aborted");
        drop(log_guard);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let store = Store::open(&config.db_path).map_err(|source| StocktakeError::StoreOpen {
        path: config.db_path.clone(),
        source,
    })?;

    let (persist_sender, persist_receiver) = mpsc::sync_channel(0);
    let persist_worker = persist::spawn(store, persist_receiver);

    // The listener is dialed before the loop starts, so whether forwarding
    // is online is settled before the first count can be submitted.
    let (notify_sender, notify_worker) =
        match config.listener.as_deref().and_then(Notifier::connect) {
            Some(notifier) => {
                let (sender, receiver) = mpsc::sync_channel(0);
                (Some(sender), Some(notifier.spawn(receiver)))
            }
            None => (None, None),
        };

    let mut session = Session::new(Dispatcher::new(persist_sender, notify_sender));

    let mut stdin = io::stdin().lock();
    let mut input = String::new();
    loop {
        print!("{PROMPT}");
        io::stdout().flush().map_err(|source| StocktakeError::Io {
            context: "flushing prompt".to_string(),
            source,
        })?;

        input.clear();
        let read = stdin.read_line(&mut input).map_err(StocktakeError::Input)?;
        if read == 0 {
            // Input exhausted: flush the pending pair, same as a typed exit.
            session.process("exit");
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if session.process(line) == Flow::Stop {
            break;
        }
    }

    session.shutdown();
    if let Some(worker) = notify_worker {
        if worker.join().is_err() {
            warn!("Count forwarding worker exited abnormally");
        }
    }
    if persist_worker.join().is_err() {
        warn!("Persistence worker exited abnormally");
    }

    info!("Closing stocktake, your data is safe :^)");
    Ok(())
}
