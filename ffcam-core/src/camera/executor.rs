use crate::script::{Cursor, Dialect};

/// The game's own camera script interpreters.
///
/// Implemented by the host over the real entry points; tests substitute fakes
/// that return canned cursor states.
pub trait NativeCameraExecutor {
    fn execute_5c3fd5(&mut self, variation: i8, param: u32, selector: i16);

    fn execute_5c23d1(&mut self, variation: i8, param: u32, selector: i16);

    /// Cursor stored by the native engine for `variation`, as-is (the position
    /// may hold the uninitialized sentinel).
    fn cursor(&self, dialect: Dialect, variation: i8) -> Cursor;

    fn execute(&mut self, dialect: Dialect, variation: i8, param: u32, selector: i16) {
        match dialect {
            Dialect::Sub5C3FD5 => self.execute_5c3fd5(variation, param, selector),
            Dialect::Sub5C23D1 => self.execute_5c23d1(variation, param, selector),
        }
    }
}
