// src/lib.rs

//! Serial bridge between Scratch 2 HTTP extensions and a micro:bit running
//! the companion line-protocol firmware.

pub mod bridge;
pub mod common;
pub mod gateway;
pub mod transport;

// Re-export key types for convenience
pub use bridge::{Bridge, RunningBridge};
pub use common::BridgeConfig;
pub use common::BridgeError;
pub use common::Command;
pub use gateway::{Gateway, GatewayResponse};
pub use transport::LineSession;
