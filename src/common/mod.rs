// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod config;
pub mod error;
pub mod escape;
pub mod gesture;
pub mod hal_traits;
pub mod images;
pub mod response;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From command.rs
pub use command::{encode_command, CodecError, Command, WireCommand, WireLine};

// From config.rs
pub use config::BridgeConfig;

// From error.rs
pub use error::{BridgeError, HandshakeStage};

// From escape.rs / images.rs
pub use escape::decode_escapes;
pub use images::translate_image_name;

// From gesture.rs
pub use gesture::{GestureState, Gestures, PollReport};

// From hal_traits.rs
pub use hal_traits::{DeviceClock, DeviceInstant, LineSerial};

// From response/mod.rs
pub use response::{parse_poll_reply, PollReply, ResponseParseError, POLL_FIELD_COUNT};
