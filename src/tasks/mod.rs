mod content;
mod images;
mod insights;
mod integrity;
pub mod prompts;
mod synthesis;

pub use content::ContentTask;
pub use images::ImagesTask;
pub use insights::InsightsTask;
pub use integrity::IntegrityTask;
pub use synthesis::SynthesisTask;

pub(crate) use images::gather_images;
pub(crate) use insights::gather_insights;

use std::collections::HashMap;
use std::time::Instant;

use graph_flow::{Context, GraphError};
use tracing::warn;

use crate::error::CallError;
use crate::models::{PlanContext, Topic};

pub const PLAN_CONTEXT: &str = "plan_context";
pub const STEP_TIMES: &str = "step_times";

pub(crate) async fn load_plan(context: &Context) -> Result<PlanContext, GraphError> {
    context
        .get(PLAN_CONTEXT)
        .await
        .ok_or_else(|| GraphError::ContextError("Plan context not found".to_string()))
}

/// Store the updated plan and the step's elapsed time.
pub(crate) async fn finish_step(context: &Context, plan: PlanContext, step: &str, start: Instant) {
    context.set(PLAN_CONTEXT, plan).await;

    let elapsed = start.elapsed().as_millis() as u64;
    let mut step_times: HashMap<String, u64> = context.get(STEP_TIMES).await.unwrap_or_default();
    step_times.insert(step.to_string(), elapsed);
    context.set(STEP_TIMES, step_times).await;
}

pub(crate) fn log_call_error(topic: Topic, err: &CallError) {
    match err {
        CallError::TransportFailure(detail) => {
            warn!(%topic, %detail, "responder unreachable, substituting placeholder")
        }
        CallError::NoUsableContent(outcome) => {
            warn!(%topic, ?outcome, "responder produced no usable content, substituting placeholder")
        }
    }
}
