use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument};

use super::prompts::images_query;
use super::{finish_step, load_plan};
use crate::gateway::ResponderRegistry;
use crate::images::{signature, ImageDeduplicator};

/// Collects a bounded set of visually distinct destination images.
pub struct ImagesTask {
    registry: Arc<ResponderRegistry>,
    deduplicator: ImageDeduplicator,
    max_results: usize,
    target: usize,
}

impl ImagesTask {
    pub fn new(registry: Arc<ResponderRegistry>, max_results: usize, target: usize) -> Self {
        Self {
            registry,
            deduplicator: ImageDeduplicator::default(),
            max_results,
            target,
        }
    }
}

pub(crate) async fn gather_images(
    registry: &ResponderRegistry,
    deduplicator: &ImageDeduplicator,
    query: &str,
    max_results: usize,
    target: usize,
) -> Vec<String> {
    let urls: Vec<String> = registry
        .search()
        .image_search(query, max_results)
        .await
        .into_iter()
        .map(|hit| hit.link)
        .collect();

    if !urls.iter().any(|url| signature(url).is_some()) {
        info!("Image search returned no usable urls, using fallback images");
        return deduplicator.fallback().iter().take(target).cloned().collect();
    }
    deduplicator.dedupe(&urls, target)
}

#[async_trait]
impl Task for ImagesTask {
    fn id(&self) -> &str {
        "images"
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        let mut plan = load_plan(&context).await?;

        if plan.preferences.get_images {
            info!("Starting image task");
            plan.images = gather_images(
                &self.registry,
                &self.deduplicator,
                &images_query(&plan.preferences.destination),
                self.max_results,
                self.target,
            )
            .await;
            info!("Selected {} images", plan.images.len());
        } else {
            info!("Images not requested, skipping");
        }

        finish_step(&context, plan, self.id(), start_time).await;

        Ok(TaskResult::new(
            Some("Images selected".to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}
