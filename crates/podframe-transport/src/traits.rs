use podframe_buffer::SerializationBuffer;
use tracing::debug;

use crate::error::Result;

/// A reversible mapping between raw buffer bytes and transport text.
pub trait TransportEncoding {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn encode(&self, raw: &[u8]) -> String;

    fn decode(&self, text: &str) -> Result<Vec<u8>>;
}

/// Encode the message bytes of `buffer` for transport.
pub fn export<E: TransportEncoding + ?Sized>(buffer: &SerializationBuffer, encoding: &E) -> String {
    let raw = buffer.fetch_raw();
    let text = encoding.encode(raw);
    debug!(
        encoding = encoding.name(),
        raw_len = raw.len(),
        text_len = text.len(),
        "buffer exported"
    );
    text
}

/// Decode transport text and load it into `buffer`, ready for `read_block`.
pub fn import<E: TransportEncoding + ?Sized>(
    buffer: &mut SerializationBuffer,
    text: &str,
    encoding: &E,
) -> Result<()> {
    let raw = encoding.decode(text)?;
    buffer.replace_contents(&raw)?;
    debug!(
        encoding = encoding.name(),
        raw_len = raw.len(),
        "buffer imported"
    );
    Ok(())
}
