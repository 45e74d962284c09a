//! Configuration types for sessions and agents.
//!
//! Builder-style configs with defaults matching the reference deployment:
//! the 8-train/16-station network, 100 ms drain probes, and the value
//! agent's published hyperparameters.

use std::time::Duration;

use crate::world::Topology;

/// Which wire codec to negotiate on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    /// Compact binary map/array format (preferred).
    #[default]
    MsgPack,
    /// JSON fallback.
    Json,
}

/// Configuration of one episode's session loop.
#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Fixed round budget of the episode.
    pub max_rounds: usize,
    /// Bounded wait per stale-frame drain probe.
    pub drain_timeout: Duration,
    /// How long to wait for the expected reset/step reply. `None` waits
    /// forever.
    pub reply_timeout: Option<Duration>,
    /// Network roster sizes; responses are validated against these.
    pub topology: Topology,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_rounds: 30,
            drain_timeout: Duration::from_millis(100),
            reply_timeout: Some(Duration::from_secs(10)),
            topology: Topology::default(),
        }
    }
}

impl EpisodeConfig {
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
}

/// Configuration of the instance-based cognitive agent.
#[derive(Debug, Clone)]
pub struct InstanceAgentConfig {
    /// Utility assumed for candidates with no matching instance.
    pub default_utility: f64,
    /// Activation noise scale.
    pub noise: f64,
    /// Memory decay exponent.
    pub decay: f64,
    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for InstanceAgentConfig {
    fn default() -> Self {
        Self {
            default_utility: 1.0,
            noise: 0.1,
            decay: 0.5,
            seed: None,
        }
    }
}

impl InstanceAgentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Configuration of the value-network agent.
#[derive(Debug, Clone)]
pub struct ValueAgentConfig {
    /// Discount factor γ.
    pub gamma: f64,
    /// Initial exploration rate ε.
    pub epsilon: f64,
    /// Multiplicative ε decay applied per episode.
    pub epsilon_decay: f64,
    /// Exploration floor.
    pub min_epsilon: f64,
    /// SGD learning rate.
    pub learning_rate: f64,
    /// Transitions per replay batch.
    pub batch_size: usize,
    /// Replay buffer capacity.
    pub buffer_capacity: usize,
    /// Hard target sync period, in update steps.
    pub target_sync_every: usize,
    /// Hidden layer widths of the shared trunk.
    pub hidden: [usize; 2],
    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for ValueAgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            min_epsilon: 0.01,
            learning_rate: 0.001,
            batch_size: 64,
            buffer_capacity: 10_000,
            target_sync_every: 100,
            hidden: [128, 64],
            seed: None,
        }
    }
}

impl ValueAgentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_target_sync_every(mut self, steps: usize) -> Self {
        self.target_sync_every = steps;
        self
    }
}
