//! Bounds-checked access to the host's script memory.
//!
//! Camera scripts live in game data owned by the host process. The region is
//! borrowed, never allocated or freed here; addresses are absolute (as the game
//! sees them) and translated through the region's load `base`.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::CameraError;

pub struct HostMemory<'a> {
    base: u32,
    bytes: &'a mut [u8],
}

impl<'a> HostMemory<'a> {
    pub fn new(base: u32, bytes: &'a mut [u8]) -> Self {
        Self { base, bytes }
    }

    #[inline]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// One past the last mapped address.
    #[inline]
    pub fn end(&self) -> u64 {
        self.base as u64 + self.bytes.len() as u64
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn offset_of(&self, addr: u32, size: usize) -> Result<usize, CameraError> {
        if addr < self.base || addr as u64 + size as u64 > self.end() {
            return Err(self.out_of_range(addr));
        }
        Ok((addr - self.base) as usize)
    }

    fn out_of_range(&self, addr: u32) -> CameraError {
        CameraError::AddressOutOfRange {
            addr,
            base: self.base,
            end: self.end(),
        }
    }

    /// safely read a u8 from the region
    pub fn read_u8(&self, addr: u32) -> Result<u8, CameraError> {
        let off = self.offset_of(addr, 1)?;
        Ok(self.bytes[off])
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> Result<(), CameraError> {
        let off = self.offset_of(addr, 1)?;
        self.bytes[off] = value;
        Ok(())
    }

    /// safely read a little-endian u32 from the region
    pub fn read_u32(&self, addr: u32) -> Result<u32, CameraError> {
        let off = self.offset_of(addr, 4)?;
        Ok(LittleEndian::read_u32(&self.bytes[off..off + 4]))
    }

    /// safely read a little-endian i32 from the region
    pub fn read_i32(&self, addr: u32) -> Result<i32, CameraError> {
        let off = self.offset_of(addr, 4)?;
        Ok(LittleEndian::read_i32(&self.bytes[off..off + 4]))
    }

    /// A script view starting at `addr` and running to the end of the region.
    pub fn view(&self, addr: u32) -> Result<ScriptView, CameraError> {
        let off = self.offset_of(addr, 0)?;
        if off >= self.bytes.len() {
            return Err(self.out_of_range(addr));
        }
        Ok(ScriptView {
            start: addr,
            len: self.bytes.len() - off,
        })
    }
}

/// A script buffer inside a [`HostMemory`] region.
///
/// Cursor positions are relative to `start`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScriptView {
    start: u32,
    len: usize,
}

impl ScriptView {
    #[inline]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute address of a cursor position, if it lies inside the view.
    pub fn addr_of(&self, position: u16) -> Option<u32> {
        if (position as usize) < self.len {
            Some(self.start.wrapping_add(position as u32))
        } else {
            None
        }
    }

    /// Shrink the view, e.g. when the script length is known from a dump.
    pub fn truncated(self, len: usize) -> Self {
        Self {
            start: self.start,
            len: self.len.min(len),
        }
    }
}
