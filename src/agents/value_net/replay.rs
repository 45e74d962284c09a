//! Bounded experience replay buffer with ring-buffer eviction.

use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One learning record: the transition observed for a single round.
///
/// Immutable once stored. `actions` holds the chosen kind index per train,
/// in ascending train-id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Vec<f64>,
    pub actions: Vec<usize>,
    pub reward: f64,
    pub next_state: Vec<f64>,
    pub terminal: bool,
}

/// Fixed-capacity FIFO buffer of transitions.
///
/// Insertion past capacity evicts the oldest entry; sampling draws a
/// uniform random subset without replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayBuffer {
    entries: Vec<Transition>,
    capacity: usize,
    /// Ring cursor: index the next push overwrites once full.
    head: usize,
    /// Declared state-vector length, pinned by the first push.
    vector_len: Option<usize>,
}

impl ReplayBuffer {
    /// # Errors
    ///
    /// Fails on a zero capacity: the ring cursor needs at least one slot.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration {
                message: "replay buffer capacity must be at least 1".to_string(),
            });
        }
        Ok(Self {
            entries: Vec::with_capacity(capacity.min(1024)),
            capacity,
            head: 0,
            vector_len: None,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a transition, evicting the oldest entry once full.
    ///
    /// # Errors
    ///
    /// A state vector whose length disagrees with the first stored
    /// transition is a fatal configuration error: encoded length is an
    /// invariant of the run.
    pub fn push(&mut self, transition: Transition) -> Result<()> {
        let expected = *self.vector_len.get_or_insert(transition.state.len());
        if transition.state.len() != expected || transition.next_state.len() != expected {
            let got = if transition.state.len() != expected {
                transition.state.len()
            } else {
                transition.next_state.len()
            };
            return Err(Error::VectorLengthMismatch { expected, got });
        }

        if self.entries.len() < self.capacity {
            self.entries.push(transition);
        } else {
            self.entries[self.head] = transition;
            self.head = (self.head + 1) % self.capacity;
        }
        Ok(())
    }

    /// Uniform sample of `batch` distinct transitions.
    ///
    /// Returns `None` while the buffer holds fewer than `batch` entries.
    pub fn sample<R: Rng>(&self, rng: &mut R, batch: usize) -> Option<Vec<&Transition>> {
        if self.entries.len() < batch || batch == 0 {
            return None;
        }
        let picks = index::sample(rng, self.entries.len(), batch);
        Some(picks.iter().map(|i| &self.entries[i]).collect())
    }

    /// Whether a given transition is still held.
    pub fn contains(&self, transition: &Transition) -> bool {
        self.entries.iter().any(|t| t == transition)
    }
}
