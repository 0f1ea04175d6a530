use super::state::AppState;
use crate::protocol::{InboundFrame, OutboundFrame};
use crate::session::VoiceSession;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{future, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Client capture rate in Hz
    pub sample_rate: Option<u32>,
}

/// GET /ws/audio?sample_rate=N
/// Upgrade to a voice conversation
pub async fn audio_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let sample_rate = params
        .sample_rate
        .filter(|rate| *rate > 0)
        .unwrap_or(state.config.audio.default_sample_rate);

    ws.on_upgrade(move |socket| handle_socket(socket, state, sample_rate))
}

async fn handle_socket(socket: WebSocket, state: AppState, sample_rate: u32) {
    info!("WebSocket connected (client sample rate: {}Hz)", sample_rate);

    let (mut sink, stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundFrame>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let message = match frame {
                OutboundFrame::Message(message) => match serde_json::to_string(&message) {
                    Ok(text) => Message::Text(text),
                    Err(e) => {
                        error!("Failed to serialize outbound message: {}", e);
                        continue;
                    }
                },
                OutboundFrame::Audio(audio) => Message::Binary(audio),
            };

            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    // Ends at the first close frame or transport error
    let inbound = stream
        .take_while(|message| {
            future::ready(match message {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    warn!("WebSocket receive error: {}", e);
                    false
                }
            })
        })
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Binary(data)) => Some(InboundFrame::Audio(data)),
                Ok(Message::Text(text)) => Some(InboundFrame::Control(text)),
                _ => None,
            })
        });

    let session = VoiceSession::new(state.config.session_config(sample_rate), state.services.clone());
    let session_id = session.session_id().to_string();
    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session.handle());
    }

    let report = session.run(inbound, out_tx).await;

    {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id);
    }

    // Every outbound sender is gone; the writer drains and exits
    if let Err(e) = writer.await {
        error!("WebSocket writer task panicked: {}", e);
    }
    info!(
        "WebSocket closed: session {} ({} turns, {} speak cycles)",
        session_id, report.stats.turns, report.stats.speak_cycles
    );
}
