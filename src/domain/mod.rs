// Domain layer: record and result models plus the ports the pipeline is built on.

pub mod model;
pub mod ports;
