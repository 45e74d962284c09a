//! Value-network reinforcement learner.
//!
//! A function-approximation policy over the dense state encoding: an
//! online estimator trained from replayed experience against a
//! periodically hard-synced target estimator.

pub mod agent;
pub mod network;
pub mod replay;

pub use agent::ValueNetworkAgent;
pub use network::ValueNetwork;
pub use replay::{ReplayBuffer, Transition};
