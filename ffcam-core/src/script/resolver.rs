//! Locating a camera script inside the battle data.
//!
//! Selectors:
//! - `-1`: the dialect's fixed script
//! - `-2`: the dialect's history table, indexed by the last script index
//! - `-3`: per-variation script from the second directory of the table-of-tables
//! - `>= 0`: script `selector` of the first directory, three variations per script
//!
//! Directory entries are stored as offsets relative to a single load-time base,
//! so every value read from the table has that base subtracted again.

use crate::{
    error::CameraError,
    memory::{HostMemory, ScriptView},
    trace::TraceFlags,
};

use super::{layout::ScriptLayout, opcode::Dialect};

pub const SELECTOR_FIXED: i16 = -1;
pub const SELECTOR_HISTORY: i16 = -2;
pub const SELECTOR_VARIATION: i16 = -3;

/// Variations stored per script in the first directory.
const VARIATIONS_PER_SCRIPT: i32 = 3;
/// Offset of the second (`-3`) directory pointers in the table header.
const VARIATION_DIRECTORY: u32 = 8;

pub fn resolve_script(
    mem: &HostMemory<'_>,
    layout: &ScriptLayout,
    variation: i8,
    selector: i16,
    dialect: Dialect,
    trace: TraceFlags,
) -> Result<ScriptView, CameraError> {
    let addr = match selector {
        SELECTOR_FIXED => layout.fixed_scripts.get(dialect),
        SELECTOR_HISTORY => {
            let index = mem.read_u32(layout.script_index_addr)?;
            let table = layout.history_tables.get(dialect);
            mem.read_u32(table.wrapping_add(index.wrapping_mul(4)))?
        }
        SELECTOR_VARIATION => {
            let slot = variation as i32;
            chained_lookup(mem, layout, VARIATION_DIRECTORY + dialect.internal_offset(), slot)?
        }
        s if s >= 0 => {
            let slot = VARIATIONS_PER_SCRIPT * s as i32 + variation as i32;
            chained_lookup(mem, layout, dialect.internal_offset(), slot)?
        }
        s => return Err(CameraError::UnsupportedSelector { selector: s }),
    };

    trace.camera(format_args!(
        "{} - camera script for variation {}, selector {} at 0x{:08x}",
        dialect, variation, selector, addr
    ));

    mem.view(addr)
}

fn chained_lookup(
    mem: &HostMemory<'_>,
    layout: &ScriptLayout,
    directory: u32,
    slot: i32,
) -> Result<u32, CameraError> {
    let origin = mem.read_u32(layout.table_origin_addr)?;
    let base = mem.read_i32(layout.offset_base_addr)?;

    let directory_off = mem.read_i32(origin.wrapping_add(directory))?;
    let outer = slot
        .wrapping_mul(4)
        .wrapping_add(directory_off)
        .wrapping_sub(base);
    let script_off = mem.read_i32(origin.wrapping_add(outer as u32))?.wrapping_sub(base);

    Ok(origin.wrapping_add(script_off as u32))
}
