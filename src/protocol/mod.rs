//! 실시간 채널 프로토콜

pub mod messages;

pub use messages::{ClientMessage, ServerMessage};
