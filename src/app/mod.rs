pub mod batch;

pub use batch::{BatchOutcome, BatchRow, BatchRunner, BatchStatus, BatchSummary};
