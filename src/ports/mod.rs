//! Ports (trait boundaries) for external dependencies.
//!
//! Following hexagonal architecture, these traits are owned by the domain
//! and implemented by adapters in the infrastructure layer: the byte channel
//! to the simulator, the wire codec negotiated on connect, and the decision
//! policy driving each round.

pub mod channel;
pub mod codec;
pub mod policy;

pub use channel::{Channel, Received};
pub use codec::Codec;
pub use policy::Policy;
