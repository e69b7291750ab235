pub mod camera_config;
pub mod logger_config;

pub use camera_config::{CameraConfig, CameraConfigBuilder, CameraConfigReader};
pub use logger_config::LoggerConfig;
