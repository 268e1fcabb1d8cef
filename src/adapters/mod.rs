// Adapters layer: concrete reference-data providers.

pub mod csv_source;
pub mod memory;

pub use csv_source::CsvReferenceSource;
pub use memory::InMemoryRows;
