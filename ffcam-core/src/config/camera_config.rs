use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    config::logger_config::LoggerConfig,
    error::CameraError,
    script::{simulator::DEFAULT_STEP_LIMIT, ScriptLayout},
    trace::TraceFlags,
};

/// Settings of the battle camera subsystem.
/// Please use [`CameraConfigBuilder`] if you want to build it from code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Logger configuration to use, if the host lets ffcam install one.
    pub logger_config: Option<LoggerConfig>,
    /// Trace categories, merged with the `FFCAM_TRACE*` environment.
    pub trace: TraceFlags,
    /// Double half-resolution script arguments before the native code runs.
    pub patch_script_args: bool,
    /// Compare the simulated cursor against the native one after each call.
    pub cross_check: bool,
    /// Upper bound of opcodes simulated per call.
    pub step_limit: usize,
    /// Script directory addresses in the host.
    pub layout: Option<ScriptLayout>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            logger_config: Some(Default::default()),
            trace: TraceFlags::OFF,
            patch_script_args: true,
            cross_check: true,
            step_limit: DEFAULT_STEP_LIMIT,
            layout: None,
        }
    }
}

impl CameraConfig {
    /// Trace flags from the file combined with the environment.
    pub fn effective_trace(&self) -> TraceFlags {
        self.trace.merge(crate::trace::env_flags())
    }
}

/// `CameraConfigBuilder` is a convenience builder to create a `CameraConfig` from code.
#[derive(Default)]
pub struct CameraConfigBuilder {
    config: CameraConfig,
}

impl CameraConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_logger_config(mut self, logger_config: LoggerConfig) -> Self {
        self.config.logger_config = Some(logger_config);
        self
    }

    pub fn without_logger(mut self) -> Self {
        self.config.logger_config = None;
        self
    }

    pub fn with_trace(mut self, trace: TraceFlags) -> Self {
        self.config.trace = trace;
        self
    }

    pub fn with_patch_script_args(mut self, enabled: bool) -> Self {
        self.config.patch_script_args = enabled;
        self
    }

    pub fn with_cross_check(mut self, enabled: bool) -> Self {
        self.config.cross_check = enabled;
        self
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.config.step_limit = step_limit;
        self
    }

    pub fn with_layout(mut self, layout: ScriptLayout) -> Self {
        self.config.layout = Some(layout);
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> CameraConfig {
        self.config
    }
}

pub struct CameraConfigReader;

impl CameraConfigReader {
    pub fn read_json(path: impl AsRef<Path>) -> Result<CameraConfig, CameraError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CameraError::ConfigNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let config = serde_json::from_slice(&bytes)?;
        Ok(config)
    }

    pub fn write_json(path: impl AsRef<Path>, config: &CameraConfig) -> Result<(), CameraError> {
        let bytes = serde_json::to_vec_pretty(config)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::script::DialectAddrs;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: CameraConfig =
            serde_json::from_str(r#"{ "cross_check": false, "trace": { "battle_camera": true } }"#)
                .unwrap();
        assert!(!config.cross_check);
        assert!(config.patch_script_args);
        assert_eq!(config.trace, TraceFlags::battle_camera());
        assert_eq!(config.step_limit, DEFAULT_STEP_LIMIT);
        assert_eq!(config.layout, None);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffcam.json");

        let config = CameraConfigBuilder::new()
            .without_logger()
            .with_patch_script_args(false)
            .with_step_limit(512)
            .with_layout(ScriptLayout {
                fixed_scripts: DialectAddrs {
                    sub_5c3fd5: 0x8FEE30,
                    sub_5c23d1: 0x8FEE2C,
                },
                ..Default::default()
            })
            .get();

        CameraConfigReader::write_json(&path, &config).unwrap();
        assert_eq!(CameraConfigReader::read_json(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = CameraConfigReader::read_json(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CameraError::ConfigNotFound(_)));
    }
}
