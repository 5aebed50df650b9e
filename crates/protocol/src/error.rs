//! Protocol error types

use thiserror::Error;

/// Errors raised while encoding or decoding device traffic
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input ended before a field could be read
    #[error("Truncated data: missing {field} at offset {offset}")]
    Truncated { field: &'static str, offset: usize },

    /// Command opcode not understood
    #[error("Unknown command opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// Command has the wrong number of bytes for its opcode
    #[error("Invalid command length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Device answered a read with zero bytes
    #[error("Empty response from device")]
    EmptyResponse,
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
