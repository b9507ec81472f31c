// src/communication/mod.rs
pub mod port;

pub use port::{Exclusivity, FlowStatus, InputPort, OutputPort, PortError};
