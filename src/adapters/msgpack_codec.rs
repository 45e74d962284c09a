//! MessagePack implementation of the wire codec.
//!
//! The simulator's preferred negotiation outcome: a compact binary
//! map/array format via rmp_serde. Maps are encoded with field names so the
//! peer sees `{trainId: ..}` records rather than positional tuples.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Result, error::Error, ports::Codec};

/// MessagePack wire codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl MsgPackCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for MsgPackCodec {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(|e| Error::Encode {
            operation: "MessagePack message".to_string(),
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::Decode {
            operation: "MessagePack message".to_string(),
            message: e.to_string(),
        })
    }
}
