//! Text transport encodings for podframe buffers.
//!
//! A serialization buffer is raw host-order bytes. To move it over a text
//! channel it is encoded on one end and decoded straight into another
//! buffer on the other:
//!
//! ```text
//! SerializationBuffer ─fetch_raw─▶ encode ─▶ text ─▶ decode ─replace_contents─▶ SerializationBuffer
//! ```

pub mod encoding;
pub mod error;
pub mod traits;

pub use encoding::Base64Encoding;
pub use error::{Result, TransportError};
pub use traits::{export, import, TransportEncoding};
