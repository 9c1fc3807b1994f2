//! Best-effort count forwarding to a remote listener.
//!
//! One TCP connection, dialed exactly once and before the interactive loop
//! starts, so the online decision is settled before the first count can be
//! submitted. An unreachable listener leaves forwarding off for the whole
//! session; nothing is queued and nothing retries. Events go out as compact
//! JSON objects written back-to-back with no framing.

use std::io::Write;
use std::net::TcpStream;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use stocktake_protocol::{CountEvent, Record};
use tracing::{error, info, warn};

pub struct Notifier {
    stream: TcpStream,
    sender: String,
}

impl Notifier {
    /// Dials the listener once. `None` means the forwarding path is offline
    /// for the rest of the session.
    pub fn connect(addr: &str) -> Option<Self> {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                info!(addr, "Connected to count listener");
                Some(Self {
                    stream,
                    sender: local_hostname(),
                })
            }
            Err(err) => {
                warn!(addr, error = %err, "Count listener unreachable, forwarding disabled");
                None
            }
        }
    }

    pub fn spawn(self, records: Receiver<Record>) -> JoinHandle<()> {
        thread::spawn(move || run(self.stream, self.sender, records))
    }
}

fn run(mut stream: TcpStream, sender: String, records: Receiver<Record>) {
    let mut broken = false;
    while let Ok(record) = records.recv() {
        let transaction = match record {
            Record::Data(transaction) => transaction,
            Record::EndOfStream => break,
        };

        // Keep draining after a dead connection so the producer never blocks.
        if broken {
            continue;
        }

        match serde_json::to_vec(&CountEvent::new(&sender, &transaction)) {
            Ok(payload) => {
                if let Err(err) = stream.write_all(&payload) {
                    error!(error = %err, "Failed to forward count, dropping the rest of the stream");
                    broken = true;
                }
            }
            Err(err) => {
                error!(
                    error = %err,
                    location = %transaction.location,
                    code = %transaction.code,
                    "Failed to serialize count event"
                );
            }
        }
    }

    let _ = stream.flush();
    info!("Count forwarding finished");
}

fn local_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use stocktake_protocol::{read_events, Transaction};

    #[test]
    fn unreachable_listener_means_offline() {
        // Bind then drop to get a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr").to_string();
        drop(listener);

        assert!(Notifier::connect(&addr).is_none());
    }

    #[test]
    fn forwards_counts_as_a_concatenated_json_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr").to_string();

        let notifier = Notifier::connect(&addr).expect("connect");
        let (sender, receiver) = mpsc::sync_channel(0);
        let worker = notifier.spawn(receiver);

        let (connection, _) = listener.accept().expect("accept");

        sender
            .send(Record::Data(Transaction::new("A1", "SKU001", 1)))
            .expect("send");
        sender
            .send(Record::Data(Transaction::new("A1", "SKU002", -3)))
            .expect("send");
        sender.send(Record::EndOfStream).expect("send sentinel");
        worker.join().expect("join worker");

        let events = read_events(&connection).expect("decode stream");
        assert_eq!(events.len(), 2);
        assert!(!events[0].sender.is_empty());
        assert_eq!(events[0].location, "A1");
        assert_eq!(events[0].code, "SKU001");
        assert_eq!(events[0].soh, 1);
        assert_eq!(events[1].code, "SKU002");
        assert_eq!(events[1].soh, -3);
    }

    #[test]
    fn a_dead_connection_drains_without_blocking_the_producer() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr").to_string();

        let notifier = Notifier::connect(&addr).expect("connect");
        let (sender, receiver) = mpsc::sync_channel(0);
        let worker = notifier.spawn(receiver);

        // Accept and immediately close the listener side.
        let (connection, _) = listener.accept().expect("accept");
        drop(connection);
        drop(listener);

        // Writes start failing once the peer reset propagates; every send
        // must still be taken off the channel.
        for n in 0..64 {
            sender
                .send(Record::Data(Transaction::new("A1", "SKU001", n)))
                .expect("send");
        }
        sender.send(Record::EndOfStream).expect("send sentinel");
        worker.join().expect("join worker");
    }
}
