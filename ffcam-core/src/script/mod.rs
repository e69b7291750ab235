pub mod layout;
pub mod opcode;
pub mod patcher;
pub mod resolver;
pub mod simulator;

pub use layout::{DialectAddrs, ScriptLayout};
pub use opcode::{Dialect, OpcodeDesc, OpcodeTable};
pub use patcher::{ArgPatcher, PatchOutcome};
pub use resolver::resolve_script;
pub use simulator::{Cursor, Halt, Simulation, Simulator};
