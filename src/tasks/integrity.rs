use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument};

use super::{finish_step, load_plan};
use crate::integrity::DocumentIntegrityValidator;

/// Final step: make sure the mandatory sections survived synthesis.
pub struct IntegrityTask {
    validator: DocumentIntegrityValidator,
}

impl IntegrityTask {
    pub fn new() -> Self {
        Self {
            validator: DocumentIntegrityValidator::new(),
        }
    }
}

impl Default for IntegrityTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Task for IntegrityTask {
    fn id(&self) -> &str {
        "integrity"
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        let mut plan = load_plan(&context).await?;

        let before = plan.itinerary.len();
        plan.itinerary = self
            .validator
            .validate_and_repair(&plan.itinerary, &plan.insights, &plan.images);
        info!(
            repaired = plan.itinerary.len() != before,
            "Integrity check finished"
        );

        finish_step(&context, plan, self.id(), start_time).await;

        Ok(TaskResult::new(
            Some("Plan validated".to_string()),
            NextAction::End,
        ))
    }
}
