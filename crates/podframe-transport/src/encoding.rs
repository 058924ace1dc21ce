use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Result, TransportError};
use crate::traits::TransportEncoding;

/// Standard-alphabet, padded base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encoding;

impl TransportEncoding for Base64Encoding {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn encode(&self, raw: &[u8]) -> String {
        STANDARD.encode(raw)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        STANDARD
            .decode(text.trim())
            .map_err(|err| TransportError::Decode {
                encoding: self.name(),
                message: err.to_string(),
            })
    }
}
