//! Codec port - byte serialization negotiated at connect time.

use serde::{Serialize, de::DeserializeOwned};

use crate::Result;

/// Pluggable byte codec for wire messages.
///
/// The simulator negotiates a compact binary map/array format on connect;
/// JSON is the accepted fallback. Both sides of an exchange use the same
/// codec for the lifetime of a session.
pub trait Codec {
    /// Name announced during connection negotiation.
    fn name(&self) -> &'static str;

    /// Encode a wire message to bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a wire message from bytes.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}
