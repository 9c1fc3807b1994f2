//! The counting session: state machine plus dispatch pipeline.
//!
//! One session per process. The interactive loop owns the session and feeds
//! it trimmed lines; the session decides what each line means given the
//! current (location, code) context and hands committed counts to the
//! background workers through rendezvous channels.

use std::sync::mpsc::SyncSender;

use stocktake_protocol::{Record, Transaction};
use tracing::{error, info};

use crate::classifier::{classify, Token};

/// Outcome of feeding one line to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Hand-off side of the worker channels.
///
/// Both channels are rendezvous: a send parks the interactive loop until the
/// worker takes the record, so the loop never runs ahead of persistence by
/// more than one in-flight record. The notification sender exists only when
/// the listener connection succeeded at startup; there is no online flag to
/// race against.
pub struct Dispatcher {
    persist: SyncSender<Record>,
    notify: Option<SyncSender<Record>>,
}

impl Dispatcher {
    pub fn new(persist: SyncSender<Record>, notify: Option<SyncSender<Record>>) -> Self {
        Self { persist, notify }
    }

    fn dispatch(&self, transaction: Transaction) {
        if let Some(notify) = &self.notify {
            if notify.send(Record::Data(transaction.clone())).is_err() {
                error!("Count forwarding worker is gone, dropping its copy");
            }
        }
        if self.persist.send(Record::Data(transaction)).is_err() {
            error!("Persistence worker is gone, count not stored");
        }
    }

    /// Tells both workers that no further records will arrive.
    pub fn finish(&self) {
        if let Some(notify) = &self.notify {
            let _ = notify.send(Record::EndOfStream);
        }
        let _ = self.persist.send(Record::EndOfStream);
    }
}

pub struct Session {
    current_location: Option<String>,
    current_code: Option<String>,
    history: Vec<Transaction>,
    dispatcher: Dispatcher,
}

impl Session {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            current_location: None,
            current_code: None,
            history: Vec::new(),
            dispatcher,
        }
    }

    /// Feeds one trimmed, non-empty input line through the state machine.
    pub fn process(&mut self, line: &str) -> Flow {
        match line {
            "exit" => {
                self.close_pending();
                Flow::Stop
            }
            "undo" => {
                self.undo();
                Flow::Continue
            }
            _ => self.apply(classify(line)),
        }
    }

    fn apply(&mut self, token: Token<'_>) -> Flow {
        match token {
            Token::Location(next) => {
                // Switching location always closes the current tally; a
                // pending code never carries over to the new location.
                self.close_pending();
                info!(
                    from = self.current_location.as_deref().unwrap_or(""),
                    to = next,
                    "Location changed"
                );
                self.current_location = Some(next.to_string());
            }
            Token::Quantity(raw) => {
                let location = match &self.current_location {
                    Some(location) => location.clone(),
                    None => {
                        error!("A location must be set before a quantity can be counted");
                        return Flow::Continue;
                    }
                };
                let code = match &self.current_code {
                    Some(code) => code.clone(),
                    None => {
                        error!("An item code must be set before a quantity can be counted");
                        return Flow::Continue;
                    }
                };
                let quantity = match raw.parse::<i64>() {
                    Ok(quantity) => quantity,
                    Err(_) => {
                        error!(input = raw, "Quantity is not a usable number");
                        return Flow::Continue;
                    }
                };
                self.submit(location, code, quantity);
            }
            Token::Code(next) => {
                if self.current_location.is_none() {
                    error!("A location must be set before an item code");
                    return Flow::Continue;
                }
                // Entering the next code closes the previous one at the
                // implicit count of 1.
                self.close_pending();
                self.current_code = Some(next.to_string());
            }
        }
        Flow::Continue
    }

    /// Submits the pending (location, code) pair at the implicit count of 1,
    /// if there is one.
    fn close_pending(&mut self) {
        if let (Some(location), Some(code)) =
            (self.current_location.clone(), self.current_code.clone())
        {
            self.submit(location, code, 1);
        }
    }

    fn undo(&mut self) {
        match self.history.pop() {
            Some(last) => {
                info!(
                    location = %last.location,
                    code = %last.code,
                    soh = last.soh,
                    "Reverting transaction"
                );
                let inverse = last.inverse();
                self.submit(inverse.location, inverse.code, inverse.soh);
            }
            None => info!("No transactions left to revert"),
        }
    }

    /// Commits one (location, code, delta) triple: records it in the undo
    /// history, clears the pending code, and hands it to the workers. The
    /// history and the dispatched stream stay in lock-step by construction.
    fn submit(&mut self, location: String, code: String, soh: i64) {
        let transaction = Transaction::new(location, code, soh);
        info!(
            location = %transaction.location,
            code = %transaction.code,
            soh = transaction.soh,
            "Submitting count"
        );
        self.history.push(transaction.clone());
        self.current_code = None;
        self.dispatcher.dispatch(transaction);
    }

    /// Ends the session: signals end-of-stream on both worker channels.
    pub fn shutdown(self) {
        self.dispatcher.finish();
    }
}
