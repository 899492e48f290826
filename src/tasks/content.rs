use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument, warn};

use super::prompts::{content_prompt, unavailable_section};
use super::{finish_step, load_plan, log_call_error};
use crate::gateway::{ResponderGateway, ResponderRegistry};
use crate::models::{Query, Topic};

/// Asks one content responder (sights, food or lodging) for its section.
pub struct ContentTask {
    topic: Topic,
    registry: Arc<ResponderRegistry>,
    gateway: Arc<ResponderGateway>,
}

impl ContentTask {
    pub fn new(topic: Topic, registry: Arc<ResponderRegistry>, gateway: Arc<ResponderGateway>) -> Self {
        Self {
            topic,
            registry,
            gateway,
        }
    }
}

#[async_trait]
impl Task for ContentTask {
    fn id(&self) -> &str {
        self.topic.as_str()
    }

    #[instrument(skip(self, context), fields(topic = %self.topic))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting {} task", self.topic);

        let mut plan = load_plan(&context).await?;
        let destination = plan.preferences.destination.clone();
        let query = Query::new(self.topic, content_prompt(self.topic, &plan.preferences));

        let section = match self.registry.responder(self.topic) {
            Some(handle) => match self.gateway.call_with_budget(handle, &query).await {
                Ok(text) => {
                    info!("Received {} section with {} characters", self.topic, text.len());
                    text
                }
                Err(e) => {
                    log_call_error(self.topic, &e);
                    unavailable_section(self.topic, &destination)
                }
            },
            None => {
                warn!("No responder registered for {}", self.topic);
                unavailable_section(self.topic, &destination)
            }
        };

        if let Some(slot) = plan.section_mut(self.topic) {
            *slot = section;
        }
        finish_step(&context, plan, self.topic.as_str(), start_time).await;

        Ok(TaskResult::new(
            Some(format!("{} section ready", self.topic)),
            NextAction::ContinueAndExecute,
        ))
    }
}
