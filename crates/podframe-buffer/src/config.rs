use crate::header::HeaderMode;

/// Default initial allocation: 1 KiB.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Default fixed header length.
pub const DEFAULT_HEADER_LEN: usize = 4;

/// Default growth ceiling: 256 MiB.
pub const DEFAULT_MAX_CAPACITY: usize = 256 * 1024 * 1024;

/// Configuration for a [`SerializationBuffer`](crate::SerializationBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Bytes allocated at construction. Must be non-zero. Default: 1 KiB.
    pub initial_capacity: usize,
    /// Block header layout. Default: fixed, 4 bytes.
    pub header_mode: HeaderMode,
    /// Growth stops with `CapacityLimit` beyond this size. Default: 256 MiB.
    pub max_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            header_mode: HeaderMode::Fixed {
                len: DEFAULT_HEADER_LEN,
            },
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl BufferConfig {
    /// Default configuration with a different header mode.
    pub fn with_header_mode(header_mode: HeaderMode) -> Self {
        Self {
            header_mode,
            ..Self::default()
        }
    }
}
