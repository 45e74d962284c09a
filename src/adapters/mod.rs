//! Adapters implementing domain ports.
//!
//! Infrastructure implementations of the traits defined in the ports
//! module: codecs over rmp-serde/serde_json, a TCP frame channel for live
//! runs, and an in-memory scripted channel for tests.

pub mod in_memory_channel;
pub mod json_codec;
pub mod msgpack_codec;
pub mod tcp_channel;

pub use in_memory_channel::InMemoryChannel;
pub use json_codec::JsonCodec;
pub use msgpack_codec::MsgPackCodec;
pub use tcp_channel::TcpChannel;
