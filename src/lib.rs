pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::Cli;
pub use config::SimulatorConfig;

pub use adapters::{CsvReferenceSource, InMemoryRows};
pub use crate::core::{
    commune_cache::CommuneCodeCache,
    engine::{CalculationEngine, EngineSettings},
    simulator::PayrollSimulator,
    CalculationRequest, CalculationResult, ContractType, RawCell, ReferenceRows,
};
pub use utils::error::{PortageError, Result};
