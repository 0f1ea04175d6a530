use serde::{Deserialize, Serialize};

/// Control message sent to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Echo of a finalized user utterance
    Transcript { text: String },
    /// Reply text for display
    Response { text: String },
    /// Instruction to synthesize and play `text`
    Speak { text: String },
}

/// Control message received from the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Playback of the last `speak` instruction finished
    Unmute,
}

impl ClientMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Frame queued for the connection writer
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Message(ServerMessage),
    /// Synthesized reply audio
    Audio(Vec<u8>),
}

impl From<ServerMessage> for OutboundFrame {
    fn from(message: ServerMessage) -> Self {
        OutboundFrame::Message(message)
    }
}

/// Frame read from the connection, transport-independent
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// PCM16 LE mono chunk
    Audio(Vec<u8>),
    /// Raw JSON control payload
    Control(String),
}
