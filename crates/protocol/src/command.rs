//! Host commands for the framer control endpoint
//!
//! Commands are a one-byte opcode followed by a little-endian register
//! address and, for writes, the value byte.

use crate::error::{ProtocolError, Result};

/// Opcode for a register read
pub const OPCODE_REGISTER_READ: u8 = 0x00;

/// Opcode for a register write
pub const OPCODE_REGISTER_WRITE: u8 = 0x01;

/// Register polled by the probe loop
pub const POLL_REGISTER: u16 = 0x01fe;

/// Encoded `RegisterRead { address: POLL_REGISTER }`
pub const POLL_COMMAND: [u8; 3] = [
    OPCODE_REGISTER_READ,
    (POLL_REGISTER & 0xff) as u8,
    (POLL_REGISTER >> 8) as u8,
];

/// Command sent from host to SoC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    RegisterRead { address: u16 },
    RegisterWrite { address: u16, value: u8 },
}

impl HostCommand {
    /// Encode to the bytes written on the OUT endpoint
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            HostCommand::RegisterRead { address } => {
                let [lo, hi] = address.to_le_bytes();
                vec![OPCODE_REGISTER_READ, lo, hi]
            }
            HostCommand::RegisterWrite { address, value } => {
                let [lo, hi] = address.to_le_bytes();
                vec![OPCODE_REGISTER_WRITE, lo, hi, value]
            }
        }
    }

    /// Decode a command from raw bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [OPCODE_REGISTER_READ, lo, hi] => Ok(HostCommand::RegisterRead {
                address: u16::from_le_bytes([*lo, *hi]),
            }),
            [OPCODE_REGISTER_WRITE, lo, hi, value] => Ok(HostCommand::RegisterWrite {
                address: u16::from_le_bytes([*lo, *hi]),
                value: *value,
            }),
            [] => Err(ProtocolError::Truncated {
                field: "opcode",
                offset: 0,
            }),
            [opcode, ..] if *opcode > OPCODE_REGISTER_WRITE => {
                Err(ProtocolError::UnknownOpcode(*opcode))
            }
            _ => Err(ProtocolError::InvalidLength {
                expected: if bytes[0] == OPCODE_REGISTER_READ { 3 } else { 4 },
                actual: bytes.len(),
            }),
        }
    }

    /// Whether the SoC answers this command with data
    pub fn expects_response(&self) -> bool {
        matches!(self, HostCommand::RegisterRead { .. })
    }

    /// Extract the register value from a register-read response
    pub fn register_value(response: &[u8]) -> Result<u8> {
        response.first().copied().ok_or(ProtocolError::EmptyResponse)
    }
}
