//! Persistence worker: drains the record channel into the store.
//!
//! The worker owns the connection and one open transaction for the whole
//! session, so every count batches into a single commit after end-of-stream.
//! That trades per-record crash durability for throughput: a crash
//! mid-session loses the uncommitted writes. A record that fails to execute
//! is logged and skipped; it never aborts the session.

use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use rusqlite::params;
use stocktake_protocol::Record;
use tracing::{error, info};

use crate::store::{Store, UPSERT_COUNT};

pub fn spawn(store: Store, records: Receiver<Record>) -> JoinHandle<()> {
    thread::spawn(move || run(store, records))
}

fn run(mut store: Store, records: Receiver<Record>) {
    if let Err(err) = store_all(&mut store, &records) {
        error!(error = %err, "Persistence unavailable, discarding the remaining stream");
        // The producer must never block on a dead worker.
        while records.recv().is_ok() {}
    }
}

fn store_all(store: &mut Store, records: &Receiver<Record>) -> Result<(), rusqlite::Error> {
    let tx = store.begin()?;
    {
        let mut upsert = tx.prepare(UPSERT_COUNT)?;
        while let Ok(record) = records.recv() {
            let transaction = match record {
                Record::Data(transaction) => transaction,
                Record::EndOfStream => {
                    info!("End of transactions, committing counts");
                    break;
                }
            };

            if let Err(err) = upsert.execute(params![
                transaction.location,
                transaction.code,
                transaction.soh
            ]) {
                error!(
                    error = %err,
                    location = %transaction.location,
                    code = %transaction.code,
                    soh = transaction.soh,
                    "Failed to store count"
                );
            }
        }
    }

    if let Err(err) = tx.commit() {
        error!(error = %err, "Failed to commit counts");
    }
    Ok(())
}
