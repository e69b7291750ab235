//! Per-slot compensation for camera functions registered by `E7`/`E9`.
//!
//! Those opcodes hand a function to the native camera function array instead of
//! carrying the value inline, so the argument patcher never sees it. The slot's
//! timing field is doubled once, right before the slot first runs.

use crate::{error::CameraError, trace::TraceFlags};

pub const CAMERA_FN_SLOTS: usize = 16;

/// The host's camera function array.
pub trait CameraFunctionHost {
    /// Native allocator: stores `function` in a free slot and returns its index.
    fn add_function(&mut self, function: u32) -> usize;

    /// Handle stored in `slot`, `0` when the slot is free.
    fn function(&self, slot: usize) -> u32;

    /// Timing field of the slot's camera state.
    fn timing_mut(&mut self, slot: usize) -> &mut i16;

    /// Native routine running every registered camera function once.
    fn execute_functions(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialFunctionFlags {
    flags: [bool; CAMERA_FN_SLOTS],
}

impl SpecialFunctionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, slot: usize) -> bool {
        self.flags.get(slot).copied().unwrap_or(false)
    }

    pub fn pending(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Register `function` through the native allocator and mark its slot.
    pub fn on_function_registered<H: CameraFunctionHost + ?Sized>(
        &mut self,
        host: &mut H,
        function: u32,
    ) -> Result<usize, CameraError> {
        let slot = host.add_function(function);
        let Some(flag) = self.flags.get_mut(slot) else {
            return Err(CameraError::SlotOutOfRange {
                slot,
                slots: CAMERA_FN_SLOTS,
            });
        };
        *flag = true;
        Ok(slot)
    }

    /// Compensate marked slots, then run the native dispatch.
    pub fn before_dispatch<H: CameraFunctionHost + ?Sized>(
        &mut self,
        host: &mut H,
        trace: TraceFlags,
    ) {
        for slot in 0..CAMERA_FN_SLOTS {
            let function = host.function(slot);
            if function == 0 || !self.flags[slot] {
                continue;
            }

            trace.camera(format_args!(
                "execute_camera_functions - function started 0x{:x}",
                function
            ));

            let timing = host.timing_mut(slot);
            *timing = timing.wrapping_mul(2);
            self.flags[slot] = false;
        }

        host.execute_functions();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Default)]
    pub(crate) struct FakeSlots {
        pub functions: [u32; CAMERA_FN_SLOTS],
        pub timings: [i16; CAMERA_FN_SLOTS],
        pub executed: usize,
        pub force_slot: Option<usize>,
    }

    impl CameraFunctionHost for FakeSlots {
        fn add_function(&mut self, function: u32) -> usize {
            if let Some(slot) = self.force_slot {
                return slot;
            }
            let slot = self.functions.iter().position(|f| *f == 0).unwrap_or(0);
            self.functions[slot] = function;
            slot
        }

        fn function(&self, slot: usize) -> u32 {
            self.functions[slot]
        }

        fn timing_mut(&mut self, slot: usize) -> &mut i16 {
            &mut self.timings[slot]
        }

        fn execute_functions(&mut self) {
            self.executed += 1;
        }
    }

    #[test]
    fn doubles_timing_once_per_registration() {
        let mut host = FakeSlots::default();
        let mut flags = SpecialFunctionFlags::new();

        let slot = flags.on_function_registered(&mut host, 0x5C_1234).unwrap();
        assert_eq!(slot, 0);
        assert!(flags.is_set(0));
        host.timings[0] = 15;

        flags.before_dispatch(&mut host, TraceFlags::OFF);
        assert_eq!(host.timings[0], 30);
        assert!(!flags.is_set(0));

        flags.before_dispatch(&mut host, TraceFlags::OFF);
        assert_eq!(host.timings[0], 30);
        assert_eq!(host.executed, 2);
    }

    #[test]
    fn leaves_plain_and_empty_slots_alone() {
        let mut host = FakeSlots::default();
        let mut flags = SpecialFunctionFlags::new();

        // registered by the native code itself, not through the special opcodes
        host.functions[0] = 0x5C_0001;
        host.timings[0] = 8;
        let slot = flags.on_function_registered(&mut host, 0x5C_0002).unwrap();
        assert_eq!(slot, 1);
        host.timings[1] = 8;

        // flagged but freed before dispatch
        host.force_slot = Some(5);
        flags.on_function_registered(&mut host, 0x5C_0003).unwrap();
        host.timings[5] = 8;

        flags.before_dispatch(&mut host, TraceFlags::OFF);
        assert_eq!(host.timings[0], 8);
        assert_eq!(host.timings[1], 16);
        assert_eq!(host.timings[5], 8);
        assert!(flags.is_set(5));
        assert_eq!(flags.pending(), 1);
    }

    #[test]
    fn rejects_allocator_slots_out_of_range() {
        let mut host = FakeSlots {
            force_slot: Some(CAMERA_FN_SLOTS),
            ..Default::default()
        };
        let mut flags = SpecialFunctionFlags::new();
        assert!(matches!(
            flags.on_function_registered(&mut host, 1),
            Err(CameraError::SlotOutOfRange { slot: 16, slots: 16 })
        ));
        assert_eq!(flags.pending(), 0);
    }
}
