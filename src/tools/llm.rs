use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use rig::completion::{Chat, Message as RigMessage};
use rig::prelude::*;
use rig::providers::openai;
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::conversation::{ConversationLog, Message, Role};
use crate::error::TransportError;
use crate::extraction::is_complete;
use crate::gateway::{GenerativeResponder, TurnBudget};
use crate::models::Topic;

type LLMAgent = rig::agent::Agent<openai::CompletionModel>;

/// Sent on behalf of the user while the responder has not emitted the sentinel.
const CONTINUE_NUDGE: &str =
    "Continue. When your answer is complete, end it with TASK_COMPLETE on a new line.";

pub fn persona(topic: Topic) -> &'static str {
    match topic {
        Topic::Sights => {
            r#"You are an expert travel guide specializing in attractions, sightseeing and entertainment.

For each destination, recommend historical landmarks, museums, natural attractions and hidden gems with:
- Brief descriptions highlighting what makes each place special
- Practical visiting information (opening hours, fees, transport)
- Suggested duration and insider tips
- Grouping by neighbourhood or proximity

Format your response in markdown with clear headings and bullet points.
After providing your complete response, add "TASK_COMPLETE" on a new line."#
        }
        Topic::Food => {
            r#"You are a culinary expert with deep knowledge of local cuisines and restaurant scenes.

For each destination, recommend:
- Must-try local dishes with their ingredients and flavours
- Restaurants across high-end, mid-range and budget price points
- Food markets, street food areas and culinary experiences
- Local dining etiquette and tipping customs

Format your response in markdown with clear headings and bullet points.
After providing your complete response, add "TASK_COMPLETE" on a new line."#
        }
        Topic::Lodging => {
            r#"You are an accommodation specialist with expert knowledge of hotels, rentals and lodging worldwide.

For each destination, recommend:
- Options across price points and neighbourhoods
- Key features and amenities of each option
- Neighbourhood character and proximity to attractions
- Typical nightly rates and booking tips

Format your response in markdown with clear headings and bullet points.
After providing your complete response, add "TASK_COMPLETE" on a new line."#
        }
        Topic::Insights | Topic::Images | Topic::Synthesis => {
            r#"You are a comprehensive travel planner who turns specialist recommendations into one cohesive, practical itinerary.

Balance must-see attractions with authentic local experiences, respect the traveller's budget and interests, and minimise travel time between activities.
When asked to preserve a section verbatim, copy it exactly, including headings and links.

Format your response in markdown with clear headings and a day-by-day structure.
After providing your complete response, add "TASK_COMPLETE" on a new line."#
        }
    }
}

#[derive(Default)]
struct SessionState {
    last: Option<Message>,
    transcript: Vec<Message>,
}

/// OpenAI-backed responder driven through rig's chat interface.
///
/// Besides the log returned from [`GenerativeResponder::converse`], it keeps
/// its own transcript and last-message slot, which the gateway falls back to.
pub struct RigResponder {
    name: String,
    preamble: String,
    client: openai::Client,
    model: String,
    temperature: f64,
    state: Mutex<SessionState>,
}

impl RigResponder {
    pub fn new(config: &OpenAiConfig, name: impl Into<String>, preamble: impl Into<String>) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key not configured"))?;
        Ok(Self {
            name: name.into(),
            preamble: preamble.into(),
            client: openai::Client::new(api_key),
            model: config.model.clone(),
            temperature: config.temperature,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn for_topic(config: &OpenAiConfig, topic: Topic) -> Result<Self> {
        Self::new(config, format!("{topic}_responder"), persona(topic))
    }

    fn agent(&self, max_tokens: u64) -> LLMAgent {
        self.client
            .agent(&self.model)
            .preamble(&self.preamble)
            .temperature(self.temperature)
            .max_tokens(max_tokens)
            .build()
    }

    fn record(&self, message: Message) {
        if let Ok(mut state) = self.state.lock() {
            if message.role == Role::Responder {
                state.last = Some(message.clone());
            }
            state.transcript.push(message);
        }
    }
}

#[async_trait]
impl GenerativeResponder for RigResponder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = SessionState::default();
        }
    }

    async fn converse(
        &self,
        prompt: &str,
        budget: TurnBudget,
    ) -> Result<ConversationLog, TransportError> {
        let agent = self.agent(budget.max_output_tokens);
        let mut log = Vec::new();
        let mut history: Vec<RigMessage> = Vec::new();
        let mut next = prompt.to_string();

        // The opening turn plus at most `max_auto_replies` automated nudges.
        for turn in 0..=budget.max_auto_replies {
            log.push(Message::user(next.clone()));
            self.record(Message::user(next.clone()));

            let reply = match agent.chat(RigMessage::user(next.clone()), history.clone()).await {
                Ok(reply) => reply,
                Err(e) if turn == 0 => {
                    return Err(TransportError::new(format!("{}: {}", self.name, e)));
                }
                Err(e) => {
                    warn!(responder = %self.name, turn, "exchange cut short: {}", e);
                    break;
                }
            };

            history.push(RigMessage::user(next));
            history.push(RigMessage::assistant(reply.clone()));
            log.push(Message::responder(reply.clone()));
            self.record(Message::responder(reply.clone()));

            if is_complete(&reply) {
                debug!(responder = %self.name, turns = turn + 1, "responder signalled completion");
                break;
            }
            next = CONTINUE_NUDGE.to_string();
        }

        Ok(ConversationLog::new(log))
    }

    async fn last_message(&self) -> Option<Message> {
        self.state.lock().ok().and_then(|state| state.last.clone())
    }

    async fn alternate_log(&self) -> Option<ConversationLog> {
        self.state
            .lock()
            .ok()
            .map(|state| ConversationLog::new(state.transcript.clone()))
    }
}
