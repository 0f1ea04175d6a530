use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use super::config::SessionConfig;
use super::conversation::{Conversation, Turn};
use super::duplex::DuplexController;
use super::stats::SessionCounters;
use crate::scheduling::{BridgeOutcome, SchedulingBridge};
use crate::services::Responder;

/// Single consumer of utterances: reply, speak, and trigger scheduling,
/// strictly one utterance at a time in arrival order.
pub struct TurnSequencer {
    conversation: Arc<Mutex<Conversation>>,
    duplex: Arc<DuplexController>,
    responder: Arc<dyn Responder>,
    bridge: SchedulingBridge,
    trigger_phrase: String,
    fallback_reply: String,
    counters: Arc<SessionCounters>,
}

impl TurnSequencer {
    pub fn new(
        config: &SessionConfig,
        duplex: Arc<DuplexController>,
        responder: Arc<dyn Responder>,
        bridge: SchedulingBridge,
        counters: Arc<SessionCounters>,
    ) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(Conversation::new(config.system_prompt.clone()))),
            duplex,
            responder,
            bridge,
            trigger_phrase: config.trigger_phrase.to_lowercase(),
            fallback_reply: config.fallback_reply.clone(),
            counters,
        }
    }

    /// Shared view of the history, readable after the loop is gone
    pub fn conversation(&self) -> Arc<Mutex<Conversation>> {
        Arc::clone(&self.conversation)
    }

    /// Process utterances until the queue closes
    pub async fn run(mut self, mut utterances: mpsc::UnboundedReceiver<String>) -> Conversation {
        info!("Starting conversation processing loop");

        while let Some(utterance) = utterances.recv().await {
            self.handle_utterance(&utterance).await;
        }

        info!("Conversation processing loop stopped");
        self.conversation.lock().await.clone()
    }

    /// Run one full turn. Returns `false` for blank utterances, which are
    /// ignored.
    pub async fn handle_utterance(&mut self, utterance: &str) -> bool {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            debug!("Ignoring blank utterance");
            return false;
        }

        info!("Processing transcript: {}", utterance);
        let (history, system_prompt) = {
            let mut conversation = self.conversation.lock().await;
            conversation.push_user(utterance);
            (
                conversation.turns().to_vec(),
                conversation.system_prompt().to_string(),
            )
        };
        SessionCounters::incr(&self.counters.turns);

        let reply = match self.responder.reply(&history, &system_prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Reply generation failed: {}", e);
                self.fallback_reply.clone()
            }
        };
        info!("Agent reply: {}", reply);

        let history = self.append_assistant(&reply).await;
        self.duplex.speak(&reply).await;

        if !reply.to_lowercase().contains(&self.trigger_phrase) {
            return true;
        }

        info!("Reply indicates event creation, extracting details");
        let outcome = self.bridge.handle_trigger(&history).await;
        match &outcome {
            BridgeOutcome::Scheduled(_) => SessionCounters::incr(&self.counters.events_scheduled),
            BridgeOutcome::Failed(_) => SessionCounters::incr(&self.counters.scheduling_failures),
            BridgeOutcome::NoAction => {}
        }

        if let Some(confirmation) = self.bridge.confirmation(&outcome).map(str::to_string) {
            self.append_assistant(&confirmation).await;
            self.duplex.speak(&confirmation).await;
        }

        true
    }

    async fn append_assistant(&self, text: &str) -> Vec<Turn> {
        let mut conversation = self.conversation.lock().await;
        conversation.push_assistant(text);
        SessionCounters::incr(&self.counters.turns);
        conversation.turns().to_vec()
    }
}
