//! Plain-old-data block framing with a growable buffer.
//!
//! podframe packs named blocks of untagged scalar and string fields into one
//! contiguous byte region and replays them in write order.
//!
//! # Crate Structure
//!
//! - [`buffer`] — The framing engine (growth, signing, field codec, replay)
//! - [`transport`] — Text encodings that carry a buffer between endpoints

/// Re-export buffer types.
pub mod buffer {
    pub use podframe_buffer::*;
}

/// Re-export transport types.
pub mod transport {
    pub use podframe_transport::*;
}
