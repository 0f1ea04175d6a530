pub mod messages;

pub use messages::{ClientMessage, InboundFrame, OutboundFrame, ServerMessage};
