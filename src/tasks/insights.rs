use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument};

use super::prompts::insights_query;
use super::{finish_step, load_plan};
use crate::gateway::ResponderRegistry;
use crate::insights::{fallback_insights, SearchResultFormatter};

/// Searches for traveler reviews and formats them into the insights document.
pub struct InsightsTask {
    registry: Arc<ResponderRegistry>,
    formatter: SearchResultFormatter,
    max_results: usize,
    min_chars: usize,
}

impl InsightsTask {
    pub fn new(registry: Arc<ResponderRegistry>, max_results: usize, min_chars: usize) -> Self {
        Self {
            registry,
            formatter: SearchResultFormatter::new(),
            max_results,
            min_chars,
        }
    }
}

/// Search then format, substituting the fallback document for thin results.
pub(crate) async fn gather_insights(
    registry: &ResponderRegistry,
    formatter: &SearchResultFormatter,
    query: &str,
    destination: &str,
    max_results: usize,
    min_chars: usize,
) -> String {
    let hits = registry.search().search(query, max_results).await;
    if hits.is_empty() {
        info!("Search returned no results, using fallback insights");
        return fallback_insights(destination);
    }

    let formatted = formatter.format_insights(&hits, destination);
    if formatted.len() < min_chars {
        info!(
            chars = formatted.len(),
            min_chars, "Formatted insights too short, using fallback insights"
        );
        return fallback_insights(destination);
    }
    formatted
}

#[async_trait]
impl Task for InsightsTask {
    fn id(&self) -> &str {
        "insights"
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        info!("Starting insights task");

        let mut plan = load_plan(&context).await?;
        let destination = plan.preferences.destination.clone();
        plan.insights = gather_insights(
            &self.registry,
            &self.formatter,
            &insights_query(&destination),
            &destination,
            self.max_results,
            self.min_chars,
        )
        .await;

        info!("Prepared insights with {} characters", plan.insights.len());
        finish_step(&context, plan, self.id(), start_time).await;

        Ok(TaskResult::new(
            Some("Insights gathered".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}
