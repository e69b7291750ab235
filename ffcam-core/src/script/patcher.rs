use std::collections::HashSet;

use crate::{
    error::{CameraError, Diagnostic},
    memory::HostMemory,
    trace::TARGET,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Doubled { before: u8, after: u8 },
    /// Doubled, but the result no longer fits in a byte.
    Overflowed { before: u8, after: u8 },
    AlreadyPatched,
    Disabled,
}

impl PatchOutcome {
    pub fn diagnostic(&self, addr: u32) -> Option<Diagnostic> {
        match *self {
            PatchOutcome::Overflowed { before, after } => {
                Some(Diagnostic::ArgumentOverflow { addr, before, after })
            }
            _ => None,
        }
    }
}

/// Doubles script argument bytes exactly once per absolute address.
///
/// The set of patched addresses only ever grows: a script that runs again (or
/// another variation sharing the same bytes) must not be doubled a second time.
#[derive(Debug, Clone)]
pub struct ArgPatcher {
    patched: HashSet<u32>,
    enabled: bool,
}

impl Default for ArgPatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgPatcher {
    pub fn new() -> Self {
        Self {
            patched: HashSet::new(),
            enabled: true,
        }
    }

    /// A patcher that leaves memory untouched, for dry runs.
    pub fn disabled() -> Self {
        Self {
            patched: HashSet::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_patched(&self, addr: u32) -> bool {
        self.patched.contains(&addr)
    }

    pub fn patched_count(&self) -> usize {
        self.patched.len()
    }

    pub fn patched_addresses(&self) -> Vec<u32> {
        let mut addrs: Vec<u32> = self.patched.iter().copied().collect();
        addrs.sort_unstable();
        addrs
    }

    pub fn patch(
        &mut self,
        mem: &mut HostMemory<'_>,
        addr: u32,
    ) -> Result<PatchOutcome, CameraError> {
        if !self.enabled {
            return Ok(PatchOutcome::Disabled);
        }
        if self.patched.contains(&addr) {
            return Ok(PatchOutcome::AlreadyPatched);
        }

        let before = mem.read_u8(addr)?;
        let after = before.wrapping_mul(2);
        mem.write_u8(addr, after)?;
        // recorded even on overflow so the byte is never doubled again
        self.patched.insert(addr);

        if (before as u16) * 2 != after as u16 {
            log::error!(
                target: TARGET,
                "Script arg multiplication out of bound at 0x{:x}: before is {}, after is {}",
                addr,
                before,
                after
            );
            return Ok(PatchOutcome::Overflowed { before, after });
        }

        Ok(PatchOutcome::Doubled { before, after })
    }
}
