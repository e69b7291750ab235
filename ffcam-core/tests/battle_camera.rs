use std::collections::{HashMap, VecDeque};

use byteorder::{ByteOrder, LittleEndian};
use pretty_assertions::assert_eq;

use ffcam_core::{
    camera::CameraFunctionHost,
    config::CameraConfigReader,
    script::DialectAddrs,
    BattleCamera, CameraConfigBuilder, Cursor, Diagnostic, Dialect, Halt, HostMemory,
    NativeCameraExecutor, ScriptLayout, TraceFlags,
};

const BASE: u32 = 0x0090_0000;
const ORIGIN: u32 = BASE + 0x400;
const LOAD_BASE: i32 = 0x1000;

/// Native side replaying the cursor it would leave behind after each call.
#[derive(Default)]
struct ReplayExecutor {
    cursors: HashMap<(Dialect, i8), Cursor>,
    script: VecDeque<Cursor>,
    calls: usize,
}

impl ReplayExecutor {
    fn new(initial: Cursor, after_each_call: impl IntoIterator<Item = Cursor>) -> Self {
        let mut cursors = HashMap::new();
        cursors.insert((Dialect::Sub5C3FD5, 0), initial);
        cursors.insert((Dialect::Sub5C23D1, 0), initial);
        Self {
            cursors,
            script: after_each_call.into_iter().collect(),
            calls: 0,
        }
    }

    fn step(&mut self, dialect: Dialect, variation: i8) {
        self.calls += 1;
        if let Some(next) = self.script.pop_front() {
            self.cursors.insert((dialect, variation), next);
        }
    }
}

impl NativeCameraExecutor for ReplayExecutor {
    fn execute_5c3fd5(&mut self, variation: i8, _param: u32, _selector: i16) {
        self.step(Dialect::Sub5C3FD5, variation);
    }

    fn execute_5c23d1(&mut self, variation: i8, _param: u32, _selector: i16) {
        self.step(Dialect::Sub5C23D1, variation);
    }

    fn cursor(&self, dialect: Dialect, variation: i8) -> Cursor {
        self.cursors
            .get(&(dialect, variation))
            .copied()
            .unwrap_or(Cursor::new(255, 0))
    }
}

#[derive(Default)]
struct Slots {
    functions: [u32; 16],
    timings: [i16; 16],
    executed: usize,
}

impl CameraFunctionHost for Slots {
    fn add_function(&mut self, function: u32) -> usize {
        let slot = self.functions.iter().position(|f| *f == 0).unwrap_or(15);
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

fn put(image: &mut [u8], addr: u32, value: i32) {
    let off = (addr - BASE) as usize;
    LittleEndian::write_i32(&mut image[off..off + 4], value);
}

/// Battle image with one indexed script per dialect at slot 3 (script 1, variation 0).
fn battle_image() -> (Vec<u8>, ScriptLayout) {
    let mut image = vec![0u8; 0x1000];
    let layout = ScriptLayout {
        fixed_scripts: DialectAddrs {
            sub_5c3fd5: BASE + 0x10,
            sub_5c23d1: BASE + 0x20,
        },
        history_tables: DialectAddrs::default(),
        script_index_addr: BASE,
        table_origin_addr: BASE + 4,
        offset_base_addr: BASE + 8,
    };
    put(&mut image, layout.table_origin_addr, ORIGIN as i32);
    put(&mut image, layout.offset_base_addr, LOAD_BASE);

    // directories: 5C23D1 at +0x40, 5C3FD5 at +0x80
    put(&mut image, ORIGIN, 0x40 + LOAD_BASE);
    put(&mut image, ORIGIN + 4, 0x80 + LOAD_BASE);
    put(&mut image, ORIGIN + 0x40 + 4 * 3, 0x200 + LOAD_BASE);
    put(&mut image, ORIGIN + 0x80 + 4 * 3, 0x300 + LOAD_BASE);

    let script_5c23d1 = [0xE2, 6, 0xD6, 0xF0, 1, 2, 3, 4, 5, 6, 7];
    let off = (ORIGIN + 0x200 - BASE) as usize;
    image[off..off + script_5c23d1.len()].copy_from_slice(&script_5c23d1);

    let script_5c3fd5 = [0xF5, 2, 0xF4, 0xD9, 0xFF];
    let off = (ORIGIN + 0x300 - BASE) as usize;
    image[off..off + script_5c3fd5.len()].copy_from_slice(&script_5c3fd5);

    (image, layout)
}

fn camera(layout: ScriptLayout) -> BattleCamera {
    let config = CameraConfigBuilder::new().without_logger().get();
    BattleCamera::from_config(&config, layout).with_trace(TraceFlags::OFF)
}

#[test]
fn wait_script_over_several_frames() {
    let (mut image, layout) = battle_image();
    let mut mem = HostMemory::new(BASE, &mut image);
    let mut camera = camera(layout);
    let mut native = ReplayExecutor::new(
        Cursor::new(255, 0),
        [
            Cursor::new(2, 3),
            Cursor::new(2, 2),
            Cursor::new(2, 1),
            Cursor::new(2, 0),
            Cursor::new(4, 0),
            Cursor::new(4, 0),
        ],
    );

    let mut halts = Vec::new();
    for _ in 0..6 {
        let run = camera
            .sub_5c3fd5(&mut mem, &mut native, 0, 0x10, 1)
            .unwrap();
        assert!(run.matched(), "{:?}", run.mismatches);
        halts.push(run.simulation.halt);
    }

    assert_eq!(
        halts,
        vec![
            Halt::Yield,
            Halt::Yield,
            Halt::Yield,
            Halt::Yield,
            Halt::Terminal(0xFF),
            Halt::Terminal(0xFF),
        ]
    );
    // the wait argument was doubled exactly once
    assert_eq!(mem.read_u8(ORIGIN + 0x301).unwrap(), 4);
    assert_eq!(camera.patcher().patched_addresses(), vec![ORIGIN + 0x301]);
    assert_eq!(native.calls, 6);
}

#[test]
fn both_dialects_share_one_patch_set() {
    let (mut image, layout) = battle_image();
    let mut mem = HostMemory::new(BASE, &mut image);
    let mut camera = camera(layout);
    let mut native = ReplayExecutor::new(Cursor::START, [Cursor::new(2, 3), Cursor::new(11, 0)]);

    camera.sub_5c3fd5(&mut mem, &mut native, 0, 0, 1).unwrap();
    let run = camera.sub_5c23d1(&mut mem, &mut native, 0, 0, 1).unwrap();

    // E2 6, D6, F0 with seven arguments
    assert_eq!(run.simulation.cursor, Cursor::new(11, 0));
    assert_eq!(run.simulation.halt, Halt::Terminal(0xF0));
    assert_eq!(mem.read_u8(ORIGIN + 0x201).unwrap(), 12);
    assert_eq!(
        camera.patcher().patched_addresses(),
        vec![ORIGIN + 0x201, ORIGIN + 0x301]
    );
}

#[test]
fn looping_script_stays_in_step_with_the_native_engine() {
    let (mut image, layout) = battle_image();
    let looping = [0xF5, 1, 0xF4, 0xFE, 0xC0];
    let off = (layout.fixed_scripts.sub_5c23d1 - BASE) as usize;
    image[off..off + looping.len()].copy_from_slice(&looping);

    let mut mem = HostMemory::new(BASE, &mut image);
    let mut camera = camera(layout);
    let mut native = ReplayExecutor::new(
        Cursor::new(255, 0),
        [
            Cursor::new(2, 1),
            Cursor::new(2, 0),
            Cursor::new(2, 1),
            Cursor::new(2, 0),
            Cursor::new(2, 1),
        ],
    );

    for frame in 0..5 {
        let run = camera.sub_5c23d1(&mut mem, &mut native, 0, 0, -1).unwrap();
        assert!(run.matched(), "frame {}: {:?}", frame, run.mismatches);
        assert_eq!(run.simulation.halt, Halt::Yield);
    }
    assert_eq!(mem.read_u8(BASE + 0x21).unwrap(), 2);
    assert_eq!(camera.patcher().patched_count(), 1);
}

#[test]
fn native_drift_is_reported_but_not_fatal() {
    let (mut image, layout) = battle_image();
    let mut mem = HostMemory::new(BASE, &mut image);
    let mut camera = camera(layout);
    let mut native = ReplayExecutor::new(Cursor::START, [Cursor::new(11, 2)]);

    let run = camera.sub_5c23d1(&mut mem, &mut native, 0, 0, 1).unwrap();
    assert!(!run.matched());
    let messages: Vec<String> = run.diagnostics().map(ToString::to_string).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("5c23d1 - camera script pointer simulation wrong!"));
    assert!(matches!(
        run.mismatches.as_slice(),
        [Diagnostic::CursorMismatch {
            simulated: 0,
            actual: 2,
            ..
        }]
    ));
}

#[test]
fn layout_from_config_file_wins() {
    let (mut image, layout) = battle_image();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ffcam.json");

    let config = CameraConfigBuilder::new()
        .without_logger()
        .with_layout(layout)
        .with_cross_check(false)
        .get();
    CameraConfigReader::write_json(&path, &config).unwrap();

    let loaded = CameraConfigReader::read_json(&path).unwrap();
    let mut camera =
        BattleCamera::from_config(&loaded, ScriptLayout::default()).with_trace(TraceFlags::OFF);
    assert_eq!(camera.layout(), &layout);

    let mut mem = HostMemory::new(BASE, &mut image);
    let mut native = ReplayExecutor::new(Cursor::START, Vec::<Cursor>::new());
    let run = camera.sub_5c3fd5(&mut mem, &mut native, 0, 0, -1).unwrap();
    assert_eq!(run.script.start(), BASE + 0x10);
    assert!(run.matched());
}

#[test]
fn registered_functions_are_slowed_down_once() {
    let (_, layout) = battle_image();
    let mut camera = camera(layout);
    let mut host = Slots::default();

    // a function the native code registered on its own
    host.functions[0] = 0x5D_0000;
    host.timings[0] = 10;

    let a = camera.add_special_function(&mut host, 0x5D_1000).unwrap();
    let b = camera.add_special_function(&mut host, 0x5D_2000).unwrap();
    host.timings[a] = 10;
    host.timings[b] = i16::MAX;

    camera.execute_camera_functions(&mut host);
    camera.execute_camera_functions(&mut host);

    assert_eq!(host.timings[0], 10);
    assert_eq!(host.timings[a], 20);
    assert_eq!(host.timings[b], -2);
    assert_eq!(host.executed, 2);
}
