//! The battle camera subsystem as the host sees it.
//!
//! [`BattleCamera`] wraps the native camera script interpreters: it resolves the
//! script, simulates it (doubling half-resolution arguments on the way), lets
//! the native interpreter run, then checks that both ended on the same cursor.

pub mod dispatch;
pub mod executor;

use crate::{
    config::CameraConfig,
    error::{CameraError, CursorField, Diagnostic},
    memory::{HostMemory, ScriptView},
    script::{resolve_script, ArgPatcher, Cursor, Dialect, ScriptLayout, Simulation, Simulator},
    trace::{TraceFlags, TARGET},
};

pub use dispatch::{CameraFunctionHost, SpecialFunctionFlags, CAMERA_FN_SLOTS};
pub use executor::NativeCameraExecutor;

/// Outcome of one wrapped native call.
#[derive(Debug, Clone)]
pub struct CameraRun {
    pub dialect: Dialect,
    pub script: ScriptView,
    /// Cursor the simulation started from (sentinel already mapped).
    pub start: Cursor,
    pub simulation: Simulation,
    /// Native cursor after the native interpreter ran.
    pub native: Cursor,
    /// Cross-check failures; empty when cross-checking is disabled.
    pub mismatches: Vec<Diagnostic>,
}

impl CameraRun {
    pub fn matched(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.simulation.diagnostics.iter().chain(self.mismatches.iter())
    }
}

/// Process-lifetime state of the subsystem: patched addresses and special
/// function flags. Owned by the host and driven from its frame loop.
#[derive(Debug, Clone)]
pub struct BattleCamera {
    layout: ScriptLayout,
    patcher: ArgPatcher,
    special: SpecialFunctionFlags,
    trace: TraceFlags,
    cross_check: bool,
    step_limit: usize,
}

impl BattleCamera {
    pub fn new(layout: ScriptLayout) -> Self {
        Self::from_config(&CameraConfig::default(), layout)
    }

    /// `layout` is used when the config does not carry one.
    pub fn from_config(config: &CameraConfig, layout: ScriptLayout) -> Self {
        let patcher = if config.patch_script_args {
            ArgPatcher::new()
        } else {
            ArgPatcher::disabled()
        };
        Self {
            layout: config.layout.unwrap_or(layout),
            patcher,
            special: SpecialFunctionFlags::new(),
            trace: config.effective_trace(),
            cross_check: config.cross_check,
            step_limit: config.step_limit,
        }
    }

    pub fn with_trace(mut self, trace: TraceFlags) -> Self {
        self.trace = trace;
        self
    }

    pub fn layout(&self) -> &ScriptLayout {
        &self.layout
    }

    pub fn patcher(&self) -> &ArgPatcher {
        &self.patcher
    }

    pub fn special_functions(&self) -> &SpecialFunctionFlags {
        &self.special
    }

    /// Wrapper around the native `5C3FD5` interpreter.
    pub fn sub_5c3fd5<E: NativeCameraExecutor + ?Sized>(
        &mut self,
        mem: &mut HostMemory<'_>,
        executor: &mut E,
        variation: i8,
        param: u32,
        selector: i16,
    ) -> Result<CameraRun, CameraError> {
        self.run_script(mem, executor, Dialect::Sub5C3FD5, variation, param, selector)
    }

    /// Wrapper around the native `5C23D1` interpreter.
    pub fn sub_5c23d1<E: NativeCameraExecutor + ?Sized>(
        &mut self,
        mem: &mut HostMemory<'_>,
        executor: &mut E,
        variation: i8,
        param: u32,
        selector: i16,
    ) -> Result<CameraRun, CameraError> {
        self.run_script(mem, executor, Dialect::Sub5C23D1, variation, param, selector)
    }

    pub fn run_script<E: NativeCameraExecutor + ?Sized>(
        &mut self,
        mem: &mut HostMemory<'_>,
        executor: &mut E,
        dialect: Dialect,
        variation: i8,
        param: u32,
        selector: i16,
    ) -> Result<CameraRun, CameraError> {
        self.trace.camera(format_args!(
            "{} - Parameters: {}, {}, {}",
            dialect, variation, param, selector
        ));

        let script = resolve_script(mem, &self.layout, variation, selector, dialect, self.trace)?;
        let raw = executor.cursor(dialect, variation);
        let start = Cursor::from_native(raw.position, raw.frames_to_wait);

        let simulation = Simulator::new(dialect.table())
            .with_trace(self.trace)
            .with_step_limit(self.step_limit)
            .run(mem, script, start, &mut self.patcher);

        executor.execute(dialect, variation, param, selector);

        let native = executor.cursor(dialect, variation);
        let mismatches = if self.cross_check {
            cross_check(dialect, simulation.cursor, native)
        } else {
            Vec::new()
        };

        Ok(CameraRun {
            dialect,
            script,
            start,
            simulation,
            native,
            mismatches,
        })
    }

    /// Replacement for the native "add camera function" call of `E7`/`E9`.
    pub fn add_special_function<H: CameraFunctionHost + ?Sized>(
        &mut self,
        host: &mut H,
        function: u32,
    ) -> Result<usize, CameraError> {
        self.special.on_function_registered(host, function)
    }

    /// Replacement for the native per-frame camera function dispatch.
    pub fn execute_camera_functions<H: CameraFunctionHost + ?Sized>(&mut self, host: &mut H) {
        self.special.before_dispatch(host, self.trace);
    }
}

fn cross_check(dialect: Dialect, simulated: Cursor, native: Cursor) -> Vec<Diagnostic> {
    let mut mismatches = Vec::new();
    let fields = [
        (CursorField::Position, simulated.position, native.position),
        (
            CursorField::FramesToWait,
            simulated.frames_to_wait,
            native.frames_to_wait,
        ),
    ];
    for (field, simulated, actual) in fields {
        if simulated != actual {
            let diagnostic = Diagnostic::CursorMismatch {
                dialect,
                field,
                simulated,
                actual,
            };
            log::error!(target: TARGET, "{}", diagnostic);
            mismatches.push(diagnostic);
        }
    }
    mismatches
}
