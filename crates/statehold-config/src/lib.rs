/// Configuration for statehold: where state lives, how the dark-mode flag
/// is keyed and defaulted, and the default log filter.
pub mod config;

pub use config::{AppConfig, DATA_DIR_ENV};
