use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::error::PlannerError;
use crate::models::{AgentQuery, AgentResponse, PlanDocument, TravelPreferences};
use crate::orchestrator::Orchestrator;
use crate::store::PlanStore;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<PlanStore>,
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let status = match &self {
            PlannerError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            PlannerError::NotFound(_) => StatusCode::NOT_FOUND,
            PlannerError::Workflow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/agents/travel-plan", post(create_travel_plan))
        .route("/api/agents/travel-plan/:id", get(get_travel_plan))
        .route("/api/agents/query", post(query_agent))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "Travel plan service is running" }))
}

#[instrument(skip(state, preferences), fields(destination = %preferences.destination))]
async fn create_travel_plan(
    State(state): State<AppState>,
    Json(preferences): Json<TravelPreferences>,
) -> Result<Json<PlanDocument>, PlannerError> {
    let plan = state.orchestrator.build_plan(preferences).await?;
    info!(id = %plan.id, total_time_ms = plan.total_time_ms, "Travel plan created");
    state.store.put(plan.id.clone(), plan.clone());
    Ok(Json(plan))
}

async fn get_travel_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlanDocument>, PlannerError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or(PlannerError::NotFound(id))
}

#[instrument(skip(state, request), fields(agent_type = %request.agent_type))]
async fn query_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentQuery>,
) -> Result<Json<AgentResponse>, PlannerError> {
    let response = state
        .orchestrator
        .ask(&request.agent_type, &request.query)
        .await?;
    Ok(Json(AgentResponse { response }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponderConfig;
    use crate::gateway::testing::{ScriptedResponder, StaticSearch};
    use crate::gateway::{ResponderHandle, ResponderRegistry};
    use crate::models::Topic;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        let settings = ResponderConfig::default();
        let registry = ResponderRegistry::new(StaticSearch::empty())
            .with_responder(
                Topic::Food,
                ResponderHandle::new(
                    ScriptedResponder::answering("food", "Francesinha"),
                    settings.content_budget(),
                ),
            )
            .with_responder(
                Topic::Synthesis,
                ResponderHandle::new(
                    ScriptedResponder::answering("planner", "# Porto\n\nDay 1: Ribeira"),
                    settings.synthesis_budget(),
                ),
            );
        router(AppState {
            orchestrator: Arc::new(Orchestrator::new(Arc::new(registry), settings)),
            store: Arc::new(PlanStore::new()),
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn created_plan_can_be_fetched_by_id() {
        let app = app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/agents/travel-plan",
                json!({ "destination": "Porto", "trip_length": 2 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let plan = body_json(response).await;
        assert_eq!(plan["budget"], "moderate");
        assert!(plan["itinerary"].as_str().unwrap().starts_with("# Porto"));

        let id = plan["id"].as_str().unwrap();
        let response = app
            .oneshot(
                Request::get(format!("/api/agents/travel-plan/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], id);
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let response = app()
            .oneshot(
                Request::get("/api/agents/travel-plan/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn query_routes_to_category() {
        let response = app()
            .oneshot(post_json(
                "/api/agents/query",
                json!({ "agent_type": "food", "query": "What to eat?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "Francesinha");
    }

    #[tokio::test]
    async fn unknown_category_is_bad_request() {
        let response = app()
            .oneshot(post_json(
                "/api/agents/query",
                json!({ "agent_type": "weather", "query": "Rain?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("weather"));
    }
}
