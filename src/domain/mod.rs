// Domain layer: request/result models and the reference-data port.

pub mod model;
pub mod ports;
