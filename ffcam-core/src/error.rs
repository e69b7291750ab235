use std::path::PathBuf;

use crate::script::opcode::Dialect;

/// Failures that prevent a call from producing a result at all.
#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("address out of range: addr=0x{addr:08X}, region=0x{base:08X}..0x{end:08X}")]
    AddressOutOfRange { addr: u32, base: u32, end: u64 },

    #[error("unsupported camera script selector: {selector}")]
    UnsupportedSelector { selector: i16 },

    #[error("camera function slot out of range: {slot} (slots={slots})")]
    SlotOutOfRange { slot: usize, slots: usize },

    #[error("opcode 0x{opcode:02X} is not terminal but never advances (args={arg_len})")]
    NonAdvancingOpcode { opcode: u8, arg_len: i8 },

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("logger init failed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CursorField {
    Position,
    FramesToWait,
}

impl std::fmt::Display for CursorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorField::Position => write!(f, "final position"),
            CursorField::FramesToWait => write!(f, "final frames to wait"),
        }
    }
}

/// Anomalies noticed while simulating or cross-checking a script.
///
/// None of these stop the host: the native executor stays authoritative. They are
/// logged when raised and handed back to the caller in the run report.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("script arg multiplication out of bound at 0x{addr:08X}: before is {before}, after is {after}")]
    ArgumentOverflow { addr: u32, before: u8, after: u8 },

    #[error("strange opcode 0x{opcode:02X} in camera script at position {position}")]
    UnknownOpcode { opcode: u8, position: u16 },

    #[error("camera script overrun: position {position} is past the end of the script (len={len})")]
    ScriptOverrun { position: u16, len: usize },

    #[error("argument patch at 0x{addr:08X} failed: {reason}")]
    PatchFault { addr: u32, reason: String },

    #[error("camera script simulation gave up after {steps} steps")]
    StepBudgetExhausted { steps: usize },

    #[error("{dialect} - camera script pointer simulation wrong! battle camera {field} does not match (simulation: {simulated} != real: {actual})")]
    CursorMismatch {
        dialect: Dialect,
        field: CursorField,
        simulated: u16,
        actual: u16,
    },
}
