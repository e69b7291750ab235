use serde::{Deserialize, Serialize};

use super::opcode::Dialect;

/// One address per dialect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectAddrs {
    pub sub_5c3fd5: u32,
    pub sub_5c23d1: u32,
}

impl DialectAddrs {
    pub fn get(&self, dialect: Dialect) -> u32 {
        match dialect {
            Dialect::Sub5C3FD5 => self.sub_5c3fd5,
            Dialect::Sub5C23D1 => self.sub_5c23d1,
        }
    }
}

/// Where the host keeps the camera script directories.
///
/// All fields are absolute addresses inside the host memory region. Values behind
/// them are read at resolve time, since the game reloads battle data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLayout {
    /// Script used for selector `-1`.
    pub fixed_scripts: DialectAddrs,
    /// u32 pointer arrays used for selector `-2`.
    pub history_tables: DialectAddrs,
    /// u32 "last script index" counter indexing `history_tables`.
    pub script_index_addr: u32,
    /// u32 pointer to the table-of-tables.
    pub table_origin_addr: u32,
    /// i32 load-time base subtracted from every offset stored in the table.
    pub offset_base_addr: u32,
}
