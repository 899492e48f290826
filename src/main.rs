use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use travel_plan_service::api::{self, AppState};
use travel_plan_service::config::AppConfig;
use travel_plan_service::gateway::{ResponderHandle, ResponderRegistry};
use travel_plan_service::models::Topic;
use travel_plan_service::orchestrator::Orchestrator;
use travel_plan_service::store::PlanStore;
use travel_plan_service::tools::{google::GoogleSearch, llm::RigResponder};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log.filter.as_str())
        .init();

    config.validate()?;

    let mut registry = ResponderRegistry::new(Arc::new(GoogleSearch::new(config.google.clone())));
    for topic in Topic::ALL.into_iter().filter(|topic| topic.is_generative()) {
        let budget = if topic == Topic::Synthesis {
            config.responders.synthesis_budget()
        } else {
            config.responders.content_budget()
        };
        let responder = RigResponder::for_topic(&config.openai, topic)?;
        registry = registry.with_responder(topic, ResponderHandle::new(Arc::new(responder), budget));
    }

    let orchestrator = Orchestrator::new(Arc::new(registry), config.responders.clone());
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        store: Arc::new(PlanStore::new()),
    };
    let app = api::router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Travel plan service running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
