//! Opcode tables for the two native battle camera interpreters.
//!
//! Both interpreters share the control opcodes (`F4`, `F5`, `FE`) and most of the
//! camera movement opcodes, but disagree on argument lengths, on which argument is
//! stored at half resolution and on which opcodes end a script.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::CameraError;

/// 0xF4: wait one frame while `frames_to_wait` is non-zero.
pub const OP_WAIT: u8 = 0xF4;
/// 0xF5: load `frames_to_wait` from the (doubled) argument byte.
pub const OP_SET_WAIT: u8 = 0xF5;
/// 0xFE: restart the script when followed by [`RESTART_MARKER`].
pub const OP_RESTART: u8 = 0xFE;
pub const RESTART_MARKER: u8 = 0xC0;
/// Conventional end-of-script marker in both dialects.
pub const OP_END: u8 = 0xFF;

/// The native camera script interpreters, named after their entry points.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum Dialect {
    #[strum(to_string = "5c3fd5", serialize = "sub_5c3fd5", ascii_case_insensitive)]
    #[serde(rename = "5c3fd5")]
    Sub5C3FD5,
    #[strum(to_string = "5c23d1", serialize = "sub_5c23d1", ascii_case_insensitive)]
    #[serde(rename = "5c23d1")]
    Sub5C23D1,
}

impl Dialect {
    /// Offset of this dialect's script directory inside the table-of-tables header.
    pub fn internal_offset(self) -> u32 {
        match self {
            Dialect::Sub5C3FD5 => 4,
            Dialect::Sub5C23D1 => 0,
        }
    }

    pub fn table(self) -> &'static OpcodeTable {
        match self {
            Dialect::Sub5C3FD5 => &*SUB_5C3FD5_TABLE,
            Dialect::Sub5C23D1 => &*SUB_5C23D1_TABLE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcodeDesc {
    /// Argument bytes following the opcode. `-1` steps back onto the opcode.
    pub arg_len: i8,
    /// Argument index (from the first argument byte) stored at half resolution.
    pub doubled_arg: Option<u8>,
    /// Whether the native interpreter stops for this frame after the opcode.
    pub terminal: bool,
}

impl OpcodeDesc {
    pub const fn new(arg_len: i8) -> Self {
        Self {
            arg_len,
            doubled_arg: None,
            terminal: false,
        }
    }

    pub const fn doubled(arg_len: i8, doubled_arg: u8) -> Self {
        Self {
            arg_len,
            doubled_arg: Some(doubled_arg),
            terminal: false,
        }
    }

    pub const fn terminal(arg_len: i8) -> Self {
        Self {
            arg_len,
            doubled_arg: None,
            terminal: true,
        }
    }
}

/// Short name used by listings.
pub fn mnemonic(opcode: u8) -> &'static str {
    match opcode {
        OP_WAIT => "wait",
        OP_SET_WAIT => "setwait",
        OP_RESTART => "restart",
        OP_END => "end",
        _ => "cam",
    }
}

#[derive(Clone, Debug)]
pub struct OpcodeTable {
    entries: [Option<OpcodeDesc>; 256],
}

impl OpcodeTable {
    pub fn empty() -> Self {
        Self {
            entries: [None; 256],
        }
    }

    /// Build a custom table. Control opcodes handled by the simulator itself
    /// (`F4`, `F5`, `FE`) are accepted as-is.
    pub fn from_entries<I>(entries: I) -> Result<Self, CameraError>
    where
        I: IntoIterator<Item = (u8, OpcodeDesc)>,
    {
        let mut table = Self::empty();
        for (opcode, desc) in entries {
            let control = matches!(opcode, OP_WAIT | OP_SET_WAIT | OP_RESTART);
            if !control && !desc.terminal && desc.arg_len < 0 {
                return Err(CameraError::NonAdvancingOpcode {
                    opcode,
                    arg_len: desc.arg_len,
                });
            }
            table.entries[opcode as usize] = Some(desc);
        }
        Ok(table)
    }

    fn from_static(entries: &[(u8, OpcodeDesc)]) -> Self {
        let mut table = Self::empty();
        for &(opcode, desc) in entries {
            table.entries[opcode as usize] = Some(desc);
        }
        table
    }

    #[inline]
    pub fn get(&self, opcode: u8) -> Option<&OpcodeDesc> {
        self.entries[opcode as usize].as_ref()
    }

    pub fn contains(&self, opcode: u8) -> bool {
        self.entries[opcode as usize].is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &OpcodeDesc)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(op, desc)| desc.as_ref().map(|d| (op as u8, d)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const SUB_5C3FD5_OPCODES: &[(u8, OpcodeDesc)] = &[
    (0xD8, OpcodeDesc::doubled(9, 8)),
    (0xD9, OpcodeDesc::new(0)),
    (0xDB, OpcodeDesc::new(0)),
    (0xDC, OpcodeDesc::new(0)),
    (0xDD, OpcodeDesc::new(1)),
    (0xDE, OpcodeDesc::new(1)),
    (0xDF, OpcodeDesc::new(0)),
    (0xE0, OpcodeDesc::new(2)),
    (0xE1, OpcodeDesc::new(0)),
    (0xE2, OpcodeDesc::doubled(1, 0)),
    (0xE3, OpcodeDesc::doubled(9, 8)),
    (0xE4, OpcodeDesc::doubled(8, 7)),
    (0xE5, OpcodeDesc::doubled(8, 7)),
    (0xE6, OpcodeDesc::doubled(7, 6)),
    (0xE8, OpcodeDesc::doubled(8, 7)),
    (0xEA, OpcodeDesc::doubled(8, 7)),
    (0xEC, OpcodeDesc::doubled(9, 8)),
    (0xF0, OpcodeDesc::terminal(8)),
    (OP_WAIT, OpcodeDesc::new(-1)),
    (OP_SET_WAIT, OpcodeDesc::new(1)),
    (0xF8, OpcodeDesc::terminal(7)),
    (0xF9, OpcodeDesc::terminal(7)),
    (0xFA, OpcodeDesc::new(6)),
    (OP_RESTART, OpcodeDesc::new(0)),
    (OP_END, OpcodeDesc::terminal(-1)),
];

// 0xE7 and 0xE9 register "special" camera functions, see `camera::dispatch`.
const SUB_5C23D1_OPCODES: &[(u8, OpcodeDesc)] = &[
    (0xD5, OpcodeDesc::new(2)),
    (0xD6, OpcodeDesc::new(0)),
    (0xD7, OpcodeDesc::new(2)),
    (0xD8, OpcodeDesc::doubled(9, 8)),
    (0xD9, OpcodeDesc::new(0)),
    (0xDA, OpcodeDesc::new(0)),
    (0xDB, OpcodeDesc::new(0)),
    (0xDC, OpcodeDesc::new(0)),
    (0xDD, OpcodeDesc::new(1)),
    (0xDE, OpcodeDesc::new(1)),
    (0xDF, OpcodeDesc::new(0)),
    (0xE0, OpcodeDesc::new(2)),
    (0xE1, OpcodeDesc::new(0)),
    (0xE2, OpcodeDesc::doubled(1, 0)),
    (0xE3, OpcodeDesc::doubled(9, 8)),
    (0xE4, OpcodeDesc::doubled(8, 7)),
    (0xE5, OpcodeDesc::doubled(8, 7)),
    (0xE6, OpcodeDesc::doubled(7, 6)),
    (0xE7, OpcodeDesc::new(8)),
    (0xE9, OpcodeDesc::new(8)),
    (0xEB, OpcodeDesc::doubled(9, 0)),
    (0xEF, OpcodeDesc::terminal(8)),
    (0xF0, OpcodeDesc::terminal(7)),
    (0xF1, OpcodeDesc::new(0)),
    (0xF2, OpcodeDesc::new(5)),
    (0xF3, OpcodeDesc::new(5)),
    (OP_WAIT, OpcodeDesc::new(-1)),
    (OP_SET_WAIT, OpcodeDesc::new(1)),
    (0xF7, OpcodeDesc::terminal(7)),
    (0xF8, OpcodeDesc::new(12)),
    (0xF9, OpcodeDesc::new(6)),
    (OP_RESTART, OpcodeDesc::new(0)),
    (OP_END, OpcodeDesc::terminal(-1)),
];

lazy_static! {
    static ref SUB_5C3FD5_TABLE: OpcodeTable = OpcodeTable::from_static(SUB_5C3FD5_OPCODES);
    static ref SUB_5C23D1_TABLE: OpcodeTable = OpcodeTable::from_static(SUB_5C23D1_OPCODES);
}
