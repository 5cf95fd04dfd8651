//! Infrastructure: logging and configuration.

pub mod config;
pub mod logging;

pub use config::{ConversionConfig, DispatchConfig, LoggingConfig, ReflectConfig};
pub use logging::{init_dev_logging, init_logging, init_prod_logging, LogConfig, LogFormat, LogOutput};
