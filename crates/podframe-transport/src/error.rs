use podframe_buffer::BufferError;

/// Errors that can occur while moving a buffer through a transport encoding.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport text could not be decoded.
    #[error("{encoding} decode failed: {message}")]
    Decode {
        encoding: &'static str,
        message: String,
    },

    /// The decoded bytes could not be loaded into the buffer.
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),
}

pub type Result<T> = std::result::Result<T, TransportError>;
