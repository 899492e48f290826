//! Sequences the responder calls that make up one travel plan.
//!
//! Each step is a graph-flow task reading and writing a shared [`PlanContext`]:
//!
//! `sights → food → lodging → insights → images → synthesis → integrity`
//!
//! Steps degrade on their own (placeholder text, fallback documents), so a
//! run always reaches the integrity step. Only workflow infrastructure
//! failures surface as [`PlannerError::Workflow`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use graph_flow::{ExecutionStatus, FlowRunner, GraphBuilder, InMemorySessionStorage, Session, SessionStorage};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ResponderConfig;
use crate::gateway::{ResponderGateway, ResponderRegistry};
use crate::images::ImageDeduplicator;
use crate::insights::SearchResultFormatter;
use crate::models::{PlanContext, PlanDocument, Query, Topic, TravelPreferences};
use crate::error::PlannerError;
use crate::tasks::{
    gather_images, gather_insights, log_call_error, ContentTask, ImagesTask, InsightsTask,
    IntegrityTask, SynthesisTask, PLAN_CONTEXT, STEP_TIMES,
};

const FIRST_STEP: &str = "sights";

/// Upper bound on runner invocations per plan; every step continues straight
/// into the next, so a healthy run finishes in one.
const MAX_RUNS: usize = 16;

/// Heading subject for insights answered from a free-text question, which
/// has no destination of its own.
const ASK_INSIGHTS_LABEL: &str = "your search";

pub const NO_ANSWER: &str =
    "No information available for this query. Please try with a different query or category.";

pub struct Orchestrator {
    runner: FlowRunner,
    storage: Arc<dyn SessionStorage>,
    registry: Arc<ResponderRegistry>,
    gateway: Arc<ResponderGateway>,
    formatter: SearchResultFormatter,
    deduplicator: ImageDeduplicator,
    settings: ResponderConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<ResponderRegistry>, settings: ResponderConfig) -> Self {
        let gateway = Arc::new(ResponderGateway::default());
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());

        let graph = GraphBuilder::new("travel_plan_workflow")
            .add_task(Arc::new(ContentTask::new(Topic::Sights, registry.clone(), gateway.clone())))
            .add_task(Arc::new(ContentTask::new(Topic::Food, registry.clone(), gateway.clone())))
            .add_task(Arc::new(ContentTask::new(Topic::Lodging, registry.clone(), gateway.clone())))
            .add_task(Arc::new(InsightsTask::new(
                registry.clone(),
                settings.insight_results,
                settings.min_insights_chars,
            )))
            .add_task(Arc::new(ImagesTask::new(
                registry.clone(),
                settings.image_results,
                settings.image_target,
            )))
            .add_task(Arc::new(SynthesisTask::new(registry.clone(), gateway.clone())))
            .add_task(Arc::new(IntegrityTask::new()))
            .add_edge("sights", "food")
            .add_edge("food", "lodging")
            .add_edge("lodging", "insights")
            .add_edge("insights", "images")
            .add_edge("images", "synthesis")
            .add_edge("synthesis", "integrity")
            .build();

        let runner = FlowRunner::new(Arc::new(graph), storage.clone());

        Self {
            runner,
            storage,
            registry,
            gateway,
            formatter: SearchResultFormatter::new(),
            deduplicator: ImageDeduplicator::default(),
            settings,
        }
    }

    #[instrument(skip(self, preferences), fields(destination = %preferences.destination))]
    pub async fn build_plan(&self, preferences: TravelPreferences) -> Result<PlanDocument, PlannerError> {
        let start_time = Instant::now();
        let session_id = Uuid::new_v4().to_string();
        info!("Starting travel plan workflow for session {}", session_id);

        let session = Session::new_from_task(session_id.clone(), FIRST_STEP);
        session
            .context
            .set(PLAN_CONTEXT, PlanContext::new(preferences))
            .await;
        self.storage
            .save(session)
            .await
            .map_err(|e| PlannerError::Workflow(e.to_string()))?;

        let mut completed = false;
        for _ in 0..MAX_RUNS {
            let result = self
                .runner
                .run(&session_id)
                .await
                .map_err(|e| PlannerError::Workflow(e.to_string()))?;

            match &result.status {
                ExecutionStatus::Completed => {
                    info!("Workflow completed in {:?}", start_time.elapsed());
                    completed = true;
                    break;
                }
                ExecutionStatus::Paused { next_task_id, .. } => {
                    info!("Workflow paused, next task: {}", next_task_id);
                    continue;
                }
                ExecutionStatus::Error(e) => {
                    error!("Workflow error: {}", e);
                    return Err(PlannerError::Workflow(e.to_string()));
                }
                _ => continue,
            }
        }
        if !completed {
            return Err(PlannerError::Workflow(format!(
                "workflow did not complete within {MAX_RUNS} runs"
            )));
        }

        let session = self
            .storage
            .get(&session_id)
            .await
            .map_err(|e| PlannerError::Workflow(e.to_string()))?
            .ok_or_else(|| PlannerError::Workflow(format!("session {session_id} disappeared")))?;

        let plan: PlanContext = session
            .context
            .get(PLAN_CONTEXT)
            .await
            .ok_or_else(|| PlannerError::Workflow("plan context missing after run".to_string()))?;
        let step_times: HashMap<String, u64> = session.context.get(STEP_TIMES).await.unwrap_or_default();

        if let Err(e) = self.storage.delete(&session_id).await {
            warn!("Failed to drop workflow session {}: {}", session_id, e);
        }

        let prefs = plan.preferences;
        Ok(PlanDocument {
            id: session_id,
            destination: prefs.destination,
            trip_length: prefs.trip_length,
            budget: prefs.budget,
            interests: prefs.interests,
            itinerary: plan.itinerary,
            sights: plan.sights,
            food: plan.food,
            lodging: plan.lodging,
            insights: plan.insights,
            images: plan.images,
            created_at: chrono::Utc::now(),
            total_time_ms: start_time.elapsed().as_millis() as u64,
            step_times,
        })
    }

    /// Put a free-text question to one responder category.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, category: &str, question: &str) -> Result<String, PlannerError> {
        let topic: Topic = category.parse()?;

        match topic {
            Topic::Insights => Ok(gather_insights(
                &self.registry,
                &self.formatter,
                question.trim(),
                ASK_INSIGHTS_LABEL,
                self.settings.insight_results,
                self.settings.min_insights_chars,
            )
            .await),
            Topic::Images => Ok(gather_images(
                &self.registry,
                &self.deduplicator,
                question,
                self.settings.image_results,
                self.settings.image_target,
            )
            .await
            .join("\n")),
            _ => {
                let Some(handle) = self.registry.responder(topic) else {
                    warn!("No responder registered for {}", topic);
                    return Ok(NO_ANSWER.to_string());
                };
                match self
                    .gateway
                    .call_with_budget(handle, &Query::new(topic, question))
                    .await
                {
                    Ok(answer) => Ok(answer),
                    Err(e) => {
                        log_call_error(topic, &e);
                        Ok(NO_ANSWER.to_string())
                    }
                }
            }
        }
    }
}
