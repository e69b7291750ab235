//! Static simulation of the native camera script interpreter.
//!
//! The native interpreter is a black box. The simulator walks the same byte
//! stream with the same cursor rules so that half-resolution arguments can be
//! doubled right before the native code consumes them. Its final cursor is
//! later compared with the native one (see `camera::BattleCamera`).

use serde::{Deserialize, Serialize};

use crate::{
    error::Diagnostic,
    memory::{HostMemory, ScriptView},
    trace::{TraceFlags, TARGET},
};

use super::{
    opcode::{OpcodeTable, OP_RESTART, OP_SET_WAIT, OP_WAIT, RESTART_MARKER},
    patcher::ArgPatcher,
};

/// Native cursor position meaning "script not started yet".
pub const POSITION_UNINITIALIZED: u16 = 255;

pub const DEFAULT_STEP_LIMIT: usize = 0x10000;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub position: u16,
    pub frames_to_wait: u16,
}

impl Cursor {
    pub const START: Cursor = Cursor {
        position: 0,
        frames_to_wait: 0,
    };

    pub fn new(position: u16, frames_to_wait: u16) -> Self {
        Self {
            position,
            frames_to_wait,
        }
    }

    /// Cursor as stored by the native engine, with the uninitialized sentinel
    /// mapped to the script start.
    pub fn from_native(position: u16, frames_to_wait: u16) -> Self {
        if position == POSITION_UNINITIALIZED {
            Self::START
        } else {
            Self::new(position, frames_to_wait)
        }
    }
}

/// Why a simulation pass stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// `F4` with frames left: resume on the same opcode next frame.
    Yield,
    /// A terminal opcode of the dialect.
    Terminal(u8),
    /// `FE C0` hit a second time in one call without yielding.
    Restart,
    UnknownOpcode(u8),
    Overrun,
    /// An argument could not be patched.
    Fault,
    StepBudget,
}

impl Halt {
    /// Whether the pass ended the way the native interpreter would.
    pub fn is_clean(&self) -> bool {
        matches!(self, Halt::Yield | Halt::Terminal(_) | Halt::Restart)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub cursor: Cursor,
    pub halt: Halt,
    pub steps: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// One interpreter for both dialects, parameterized by the opcode table.
pub struct Simulator<'t> {
    table: &'t OpcodeTable,
    trace: TraceFlags,
    step_limit: usize,
}

enum Step {
    Continue,
    Stop(Halt),
}

struct Run<'a, 'm> {
    mem: &'a mut HostMemory<'m>,
    script: ScriptView,
    patcher: &'a mut ArgPatcher,
    cursor: Cursor,
    restarted: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Run<'_, '_> {
    fn raise(&mut self, diagnostic: Diagnostic) {
        log::error!(target: TARGET, "{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Byte at `position`; raises an overrun diagnostic past the end of the script.
    fn byte_at(&mut self, position: u16) -> Option<u8> {
        let value = self
            .script
            .addr_of(position)
            .and_then(|addr| self.mem.read_u8(addr).ok());
        if value.is_none() {
            self.raise(Diagnostic::ScriptOverrun {
                position,
                len: self.script.len(),
            });
        }
        value
    }

    /// Double the argument byte at `position`. `false` if it could not be patched.
    fn patch_arg(&mut self, position: u16) -> bool {
        let addr = self.script.start().wrapping_add(position as u32);
        if self.script.addr_of(position).is_none() {
            self.raise(Diagnostic::PatchFault {
                addr,
                reason: format!("position {} is outside the script", position),
            });
            return false;
        }
        match self.patcher.patch(self.mem, addr) {
            Ok(outcome) => {
                if let Some(diagnostic) = outcome.diagnostic(addr) {
                    // the patcher already logged the overflow
                    self.diagnostics.push(diagnostic);
                }
                true
            }
            Err(e) => {
                self.raise(Diagnostic::PatchFault {
                    addr,
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

impl<'t> Simulator<'t> {
    pub fn new(table: &'t OpcodeTable) -> Self {
        Self {
            table,
            trace: TraceFlags::OFF,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_trace(mut self, trace: TraceFlags) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit.max(1);
        self
    }

    /// Walk `script` from `cursor` until the interpreter would hand control back.
    pub fn run(
        &self,
        mem: &mut HostMemory<'_>,
        script: ScriptView,
        cursor: Cursor,
        patcher: &mut ArgPatcher,
    ) -> Simulation {
        self.trace.camera(format_args!(
            "simulate_camera_script - START LIST OF CAMERA SCRIPT OPCODE AND ARGS"
        ));

        let mut run = Run {
            mem,
            script,
            patcher,
            cursor,
            restarted: false,
            diagnostics: Vec::new(),
        };

        let mut steps = 0;
        let halt = loop {
            if steps == self.step_limit {
                run.raise(Diagnostic::StepBudgetExhausted { steps });
                break Halt::StepBudget;
            }
            steps += 1;

            match self.step(&mut run) {
                Step::Continue => {}
                Step::Stop(halt) => break halt,
            }
        };

        self.trace.camera(format_args!(
            "simulate_camera_script - END LIST OF CAMERA SCRIPT OPCODE AND ARGS"
        ));

        Simulation {
            cursor: run.cursor,
            halt,
            steps,
            diagnostics: run.diagnostics,
        }
    }

    fn step(&self, run: &mut Run<'_, '_>) -> Step {
        let op_position = run.cursor.position;
        let Some(opcode) = run.byte_at(op_position) else {
            return Step::Stop(Halt::Overrun);
        };
        run.cursor.position = op_position.wrapping_add(1);

        self.trace.camera(format_args!("opcode: 0x{:x}", opcode));

        match opcode {
            OP_WAIT => {
                // with no frames left the opcode is simply consumed
                if run.cursor.frames_to_wait != 0 {
                    run.cursor.frames_to_wait -= 1;
                    run.cursor.position = op_position;
                    return Step::Stop(Halt::Yield);
                }
                Step::Continue
            }
            OP_SET_WAIT => {
                let arg = run.cursor.position;
                if !run.patch_arg(arg) {
                    return Step::Stop(Halt::Fault);
                }
                let Some(frames) = run.byte_at(arg) else {
                    return Step::Stop(Halt::Overrun);
                };
                run.cursor.frames_to_wait = frames as u16;
                run.cursor.position = arg.wrapping_add(1);
                Step::Continue
            }
            OP_RESTART => {
                if run.cursor.frames_to_wait != 0 {
                    return Step::Continue;
                }
                let Some(next) = run.byte_at(run.cursor.position) else {
                    return Step::Stop(Halt::Overrun);
                };
                self.trace
                    .camera(format_args!("0xFE case: opcode 0x{:x}", next));
                if next == RESTART_MARKER {
                    run.cursor = Cursor::START;
                    // a second restart in the same call would loop forever
                    if run.restarted {
                        return Step::Stop(Halt::Restart);
                    }
                    run.restarted = true;
                }
                Step::Continue
            }
            _ => {
                let Some(desc) = self.table.get(opcode) else {
                    run.raise(Diagnostic::UnknownOpcode {
                        opcode,
                        position: op_position,
                    });
                    return Step::Stop(Halt::UnknownOpcode(opcode));
                };

                if let Some(idx) = desc.doubled_arg {
                    let arg = run.cursor.position.wrapping_add(idx as u16);
                    if !run.patch_arg(arg) {
                        return Step::Stop(Halt::Fault);
                    }
                }

                run.cursor.position = run
                    .cursor
                    .position
                    .wrapping_add_signed(desc.arg_len as i16);

                if desc.terminal {
                    return Step::Stop(Halt::Terminal(opcode));
                }
                Step::Continue
            }
        }
    }
}
