//! In-memory scripted channel for testing.
//!
//! Replays a queued script of reply frames, records everything sent, and
//! times out once the script runs dry. Lets session tests run without any
//! network I/O.

use std::{collections::VecDeque, time::Duration};

use crate::{
    Result,
    ports::{Channel, Received},
};

/// Scripted channel for tests.
///
/// Each `receive` pops the next scripted frame regardless of timeout; an
/// empty script yields `TimedOut` (the drain loop's exit signal) until the
/// channel is closed, after which every receive yields `Closed`.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    script: VecDeque<Received>,
    sent: Vec<Vec<u8>>,
    closed: bool,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply frame.
    pub fn push_frame(&mut self, frame: Vec<u8>) {
        self.script.push_back(Received::Frame(frame));
    }

    /// Queue an explicit timeout at this point of the script. Scripts
    /// place one after each reply so a drain probe finds silence instead
    /// of eating the next round's reply.
    pub fn push_timeout(&mut self) {
        self.script.push_back(Received::TimedOut);
    }

    /// Queue an explicit closure event at this point of the script.
    pub fn push_closure(&mut self) {
        self.script.push_back(Received::Closed);
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Channel for InMemoryChannel {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self, _timeout: Option<Duration>) -> Result<Received> {
        if self.closed {
            return Ok(Received::Closed);
        }
        match self.script.pop_front() {
            Some(Received::Closed) => {
                self.closed = true;
                Ok(Received::Closed)
            }
            Some(event) => Ok(event),
            None => Ok(Received::TimedOut),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
