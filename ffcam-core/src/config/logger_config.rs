use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;

/// Module prefixes filtered with `app_level_filter`.
const APP_MODULES: &[&str] = &["ffcam", "ffcam_core", "ffcam_disasm"];

/// Logger configuration used by ffcam.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub app_level_filter: LevelFilter,
    pub level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { app_level_filter: LevelFilter::Info, level_filter: LevelFilter::Warn }
    }
}

impl LoggerConfig {
    /// Install `env_logger` with these filters. `RUST_LOG` still wins when set.
    pub fn init(&self) -> Result<(), CameraError> {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(self.level_filter);
        for module in APP_MODULES {
            builder.filter_module(module, self.app_level_filter);
        }
        builder.parse_default_env();
        builder.try_init()?;
        Ok(())
    }
}
