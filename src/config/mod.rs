#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command, SimulateArgs};
pub use toml_config::{LoggingConfig, ReferenceConfig, SimulatorConfig};
