//! Wire and channel types for the stocktake tool.
//!
//! This crate is shared by the interactive counter and any count listener to
//! prevent schema drift. The counter remains the authority on what gets sent,
//! but a listener can reuse the same types to decode the stream.

use serde::{Deserialize, Serialize};
use std::io::Read;

/// A signed stock-on-hand delta for one (location, code) pair.
///
/// Negative deltas are produced by undo, which compensates a prior count
/// rather than deleting it; the store folds both into its running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub location: String,
    pub code: String,
    pub soh: i64,
}

impl Transaction {
    pub fn new(location: impl Into<String>, code: impl Into<String>, soh: i64) -> Self {
        Self {
            location: location.into(),
            code: code.into(),
            soh,
        }
    }

    /// The compensating delta that cancels this one out.
    pub fn inverse(&self) -> Self {
        Self {
            location: self.location.clone(),
            code: self.code.clone(),
            soh: -self.soh,
        }
    }
}

/// Channel item handed to the background workers.
///
/// End-of-stream is its own variant rather than a reserved data value, so
/// every `Transaction` that can be constructed is a legitimate delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Data(Transaction),
    EndOfStream,
}

/// One counted event as sent to the remote listener.
///
/// Serialized as a single compact JSON object with PascalCase keys, written
/// back-to-back on the connection with no framing beyond JSON structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CountEvent {
    pub sender: String,
    pub location: String,
    pub code: String,
    pub soh: i64,
}

impl CountEvent {
    pub fn new(sender: &str, transaction: &Transaction) -> Self {
        Self {
            sender: sender.to_string(),
            location: transaction.location.clone(),
            code: transaction.code.clone(),
            soh: transaction.soh,
        }
    }
}

/// Decodes a stream of back-to-back JSON count events, stopping at EOF.
pub fn read_events(reader: impl Read) -> Result<Vec<CountEvent>, serde_json::Error> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<CountEvent>()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_event_uses_pascal_case_keys() {
        let event = CountEvent::new("counter-01", &Transaction::new("A1", "SKU001", 5));
        let json = serde_json::to_string(&event).expect("serialize event");
        assert_eq!(
            json,
            r#"{"Sender":"counter-01","Location":"A1","Code":"SKU001","Soh":5}"#
        );
    }

    #[test]
    fn reads_concatenated_event_stream() {
        let transactions = [
            Transaction::new("A1", "SKU001", 1),
            Transaction::new("A1", "SKU002", 12),
            Transaction::new("B7", "SKU001", -12),
        ];
        let mut stream = Vec::new();
        for transaction in &transactions {
            let event = CountEvent::new("counter-01", transaction);
            stream.extend(serde_json::to_vec(&event).expect("serialize event"));
        }

        let events = read_events(stream.as_slice()).expect("decode stream");
        assert_eq!(events.len(), 3);
        for (event, transaction) in events.iter().zip(&transactions) {
            assert_eq!(event.sender, "counter-01");
            assert_eq!(event.location, transaction.location);
            assert_eq!(event.code, transaction.code);
            assert_eq!(event.soh, transaction.soh);
        }
    }

    #[test]
    fn read_events_rejects_malformed_tail() {
        let mut stream =
            serde_json::to_vec(&CountEvent::new("c", &Transaction::new("A1", "SKU001", 1)))
                .expect("serialize event");
        stream.extend(b"{\"Sender\":");
        assert!(read_events(stream.as_slice()).is_err());
    }

    #[test]
    fn inverse_negates_the_delta() {
        let transaction = Transaction::new("C3", "SKU009", 7);
        let inverse = transaction.inverse();
        assert_eq!(inverse.location, "C3");
        assert_eq!(inverse.code, "SKU009");
        assert_eq!(inverse.soh, -7);
        assert_eq!(inverse.inverse(), transaction);
    }
}
