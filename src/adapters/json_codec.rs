//! JSON implementation of the wire codec, the negotiation fallback.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Result, error::Error, ports::Codec};

/// JSON wire codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Encode {
            operation: "JSON message".to_string(),
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::Decode {
            operation: "JSON message".to_string(),
            message: e.to_string(),
        })
    }
}
