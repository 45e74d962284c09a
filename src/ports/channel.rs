//! Channel port - duplex frame transport to the simulator.

use std::time::Duration;

use crate::Result;

/// Outcome of a bounded-wait receive.
///
/// `TimedOut` is a control-flow signal, not a failure: the drain loop after
/// every reset/step reply probes the channel with a short wait and treats
/// the timeout as "no stale frames remain".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A complete frame arrived.
    Frame(Vec<u8>),
    /// The bounded wait elapsed with no frame.
    TimedOut,
    /// The peer closed the channel.
    Closed,
}

/// Duplex frame channel to the simulator.
///
/// Exactly one session owns a channel at a time; no two operations are ever
/// outstanding concurrently. Implementations deliver whole frames, never
/// partial reads.
pub trait Channel {
    /// Send one frame.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive one frame, waiting at most `timeout` (forever when `None`).
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Received>;

    /// Close the channel. Idempotent; called again from teardown paths.
    fn close(&mut self) -> Result<()>;
}
