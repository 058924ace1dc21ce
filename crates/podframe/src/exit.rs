use std::fmt;
use std::io;

use podframe_buffer::BufferError;
use podframe_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const RESOURCE_EXHAUSTED: i32 = 40;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn buffer_error(context: &str, err: BufferError) -> CliError {
    match err {
        BufferError::Io(source) => io_error(context, source),
        BufferError::AllocationFailure { .. }
        | BufferError::CapacityLimit { .. }
        | BufferError::CapacityOverflow { .. }
        | BufferError::BlockTooLarge { .. } => {
            CliError::new(RESOURCE_EXHAUSTED, format!("{context}: {err}"))
        }
        BufferError::InvalidConfig(_)
        | BufferError::InvalidId
        | BufferError::InteriorNul { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        BufferError::ReadOverrun { .. }
        | BufferError::UnterminatedString { .. }
        | BufferError::InvalidUtf8(_)
        | BufferError::MalformedBlock { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Buffer(err) => buffer_error(context, err),
        TransportError::Decode { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_map_to_resource_exhausted() {
        let err = buffer_error(
            "write failed",
            BufferError::CapacityLimit {
                requested: 128,
                max: 64,
            },
        );
        assert_eq!(err.code, RESOURCE_EXHAUSTED);
        assert!(err.message.starts_with("write failed: "));
    }

    #[test]
    fn decode_errors_map_to_data_invalid() {
        let err = transport_error(
            "import failed",
            TransportError::Decode {
                encoding: "base64",
                message: "bad".into(),
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn nested_buffer_errors_unwrap() {
        let err = transport_error(
            "import failed",
            TransportError::Buffer(BufferError::InvalidConfig("x")),
        );
        assert_eq!(err.code, USAGE);
    }
}
