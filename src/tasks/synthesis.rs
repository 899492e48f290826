use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument, warn};

use super::prompts::{synthesis_prompt, unavailable_itinerary};
use super::{finish_step, load_plan, log_call_error};
use crate::gateway::{ResponderGateway, ResponderRegistry};
use crate::models::{Query, Topic};

/// Has the planner responder merge every section into one itinerary.
pub struct SynthesisTask {
    registry: Arc<ResponderRegistry>,
    gateway: Arc<ResponderGateway>,
}

impl SynthesisTask {
    pub fn new(registry: Arc<ResponderRegistry>, gateway: Arc<ResponderGateway>) -> Self {
        Self { registry, gateway }
    }
}

#[async_trait]
impl Task for SynthesisTask {
    fn id(&self) -> &str {
        "synthesis"
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting synthesis task");

        let mut plan = load_plan(&context).await?;
        let query = Query::new(Topic::Synthesis, synthesis_prompt(&plan));

        plan.itinerary = match self.registry.responder(Topic::Synthesis) {
            Some(handle) => match self.gateway.call_with_budget(handle, &query).await {
                Ok(itinerary) => itinerary,
                Err(e) => {
                    log_call_error(Topic::Synthesis, &e);
                    unavailable_itinerary(&plan.preferences.destination)
                }
            },
            None => {
                warn!("No synthesis responder registered");
                unavailable_itinerary(&plan.preferences.destination)
            }
        };

        info!("Generated itinerary with {} characters", plan.itinerary.len());
        finish_step(&context, plan, self.id(), start_time).await;

        Ok(TaskResult::new(
            Some("Itinerary synthesized".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}
