use std::env;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Log target used for everything the battle camera subsystem emits.
pub const TARGET: &str = "ffcam::battle_camera";

/// Trace categories, enabled via environment variables.
///
/// Supported:
/// - FFCAM_TRACE="all,battle_camera" (comma/semicolon/space separated)
/// - FFCAM_TRACE_ALL=1, FFCAM_TRACE_BATTLE_CAMERA=1
///
/// The subsystem only reads these flags. Hosts that carry their own settings
/// (config file, CLI switch) build a [`TraceFlags`] directly instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceFlags {
    pub all: bool,
    pub battle_camera: bool,
}

impl TraceFlags {
    pub const OFF: TraceFlags = TraceFlags {
        all: false,
        battle_camera: false,
    };

    pub fn battle_camera() -> Self {
        Self {
            all: false,
            battle_camera: true,
        }
    }

    /// Parse a category list such as `"all"` or `"battle_camera; other"`.
    /// Unknown categories are ignored.
    pub fn parse_list(s: &str) -> Self {
        let mut flags = TraceFlags::OFF;
        for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            let t = raw.trim().to_ascii_lowercase();
            match t.as_str() {
                "all" => flags.all = true,
                "battle_camera" | "camera" | "bcam" => flags.battle_camera = true,
                _ => {}
            }
        }
        flags
    }

    pub fn from_env() -> Self {
        let mut flags = match env::var("FFCAM_TRACE") {
            Ok(list) => Self::parse_list(&list),
            Err(_) => TraceFlags::OFF,
        };
        if parse_bool_env("FFCAM_TRACE_ALL") {
            flags.all = true;
        }
        if parse_bool_env("FFCAM_TRACE_BATTLE_CAMERA") {
            flags.battle_camera = true;
        }
        flags
    }

    pub fn merge(self, other: TraceFlags) -> Self {
        Self {
            all: self.all || other.all,
            battle_camera: self.battle_camera || other.battle_camera,
        }
    }

    #[inline]
    pub fn camera_enabled(&self) -> bool {
        self.all || self.battle_camera
    }

    pub fn camera(&self, args: fmt::Arguments) {
        if !self.camera_enabled() {
            return;
        }
        log::trace!(target: TARGET, "{}", args);
    }
}

fn parse_bool_env(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let s = v.trim().to_ascii_lowercase();
            !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
        }
        Err(_) => false,
    }
}

/// Flags from the environment, read once per process.
pub fn env_flags() -> TraceFlags {
    static CFG: OnceLock<TraceFlags> = OnceLock::new();
    *CFG.get_or_init(TraceFlags::from_env)
}
