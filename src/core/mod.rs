pub mod commune_cache;
pub mod engine;
pub mod simulator;

pub use crate::domain::model::{
    CalculationRequest, CalculationResult, ContractCharges, ContractModifiers, ContractType,
};
pub use crate::domain::ports::{RawCell, ReferenceRows};
pub use crate::utils::error::Result;
