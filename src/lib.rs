//! Floodline: decision core for a flood-affected metro simulation.
//!
//! This crate provides:
//! - The round-based session protocol to the remote simulator, including
//!   stale-frame draining over a pluggable channel/codec boundary
//! - Typed world-state snapshots decoded from wire responses
//! - Legal-action enumeration and full joint-action expansion
//! - The decision-policy abstraction with an instance-based cognitive
//!   learner, a value-network reinforcement learner, and a random baseline

pub mod actions;
pub mod adapters;
pub mod agents;
pub mod config;
pub mod encoding;
pub mod error;
pub mod ports;
pub mod session;
pub mod wire;
pub mod world;

pub use actions::{ActionKind, ActionSpace, JointAction, legal_kinds};
pub use agents::{InstanceBasedAgent, RandomPolicy, ValueNetworkAgent};
pub use config::{CodecKind, EpisodeConfig, InstanceAgentConfig, ValueAgentConfig};
pub use error::{Error, Result};
pub use ports::{Channel, Codec, Policy, Received};
pub use session::{Session, run_episode};
pub use world::{Topology, WorldState};
