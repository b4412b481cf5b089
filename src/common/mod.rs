//! Common utilities and types shared across hellopi

pub mod config;
pub mod error;
pub mod tracing_middleware;
pub mod utils;

pub use config::{Config, CoordinatorConfig, MountConfig, Profile, ReporterConfig};
pub use error::{Error, Result};
pub use utils::{
    escape_html, format_display_time, now_local, parse_duration, parse_millis, validate_text,
    MAX_TEXT_LEN,
};
