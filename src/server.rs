//! HTTP surface: flow routes, health, and collaborator endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use log::{error, info, warn};
use crate::registry::FlowRegistry;
use crate::request::{
  ChatRequest, ErrorBody, ErrorCode, FlowResponse, GenerateRequest, PromptRequest
};
use crate::FlowName;

#[derive(Clone)]
pub struct AppState
{   pub registry: FlowRegistry
}

pub fn build_router(registry: FlowRegistry) -> Router
{   Router::new()
      .route("/health", get(health))
      .route("/chat", post(chat))
      .route("/breathing", post(breathing))
      .route("/thought-clarify", post(thought_clarify))
      .route("/flows/:flow", post(run_flow))
      .route("/classify", post(classify))
      .route("/build", post(build_prompt))
      .route("/generate", post(generate))
      .with_state(AppState
      {   registry
      })
}

/// Bind and serve until Ctrl+C
pub async fn serve(
  router: Router
, host: &str
, port: u16
) -> Result<(), crate::error::Error>
{   let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
      .await
      .map_err(|e| {
        crate::error::Error::InvalidConfiguration(
          format!("cannot bind {}: {}", addr, e)
        )
      })?;
    info!("emoflow listening on {}", addr);

    axum::serve(listener, router)
      .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await
        {   error!("Ctrl+C handler failed: {}", e);
        }
        info!("Shutdown signal received");
      })
      .await
      .map_err(|e| crate::error::Error::Other(e.to_string()))
}

fn error_response(
  status: StatusCode
, code: ErrorCode
, detail: String
) -> Response
{   let body = ErrorBody
    {   code
      , detail
    };
    (status, Json(json!({ "error": body }))).into_response()
}

async fn health() -> Json<serde_json::Value>
{   Json(json!({ "status": "ok" }))
}

/// Read a flow body; unreadable bodies become an `invalid_input`
/// envelope instead of a plain-text rejection.
async fn run(
  state: &AppState
, flow: FlowName
, body: Result<Json<ChatRequest>, JsonRejection>
) -> Json<FlowResponse>
{   match body
    {   Ok(Json(body)) => {
          Json(state.registry.dispatch(flow, body.text()).await)
        }
      , Err(rejection) => {
          warn!("Unreadable {} body: {}", flow, rejection.body_text());
          Json(state.registry.reject(
            flow,
            format!("invalid request body: {}", rejection.body_text())
          ))
        }
    }
}

async fn chat(
  State(state): State<AppState>
, body: Result<Json<ChatRequest>, JsonRejection>
) -> Json<FlowResponse>
{   run(&state, FlowName::Chat, body).await
}

async fn breathing(
  State(state): State<AppState>
, body: Result<Json<ChatRequest>, JsonRejection>
) -> Json<FlowResponse>
{   run(&state, FlowName::Breathing, body).await
}

async fn thought_clarify(
  State(state): State<AppState>
, body: Result<Json<ChatRequest>, JsonRejection>
) -> Json<FlowResponse>
{   run(&state, FlowName::ThoughtClarify, body).await
}

async fn run_flow(
  State(state): State<AppState>
, Path(flow): Path<String>
, body: Result<Json<ChatRequest>, JsonRejection>
) -> Response
{   match flow.parse::<FlowName>()
    {   Ok(name) => run(&state, name, body).await.into_response()
      , Err(e) => {
          warn!("Rejected flow '{}': {}", flow, e);
          error_response(StatusCode::NOT_FOUND, ErrorCode::UnknownFlow, e.to_string())
        }
    }
}

async fn classify(
  State(state): State<AppState>
, body: Result<Json<ChatRequest>, JsonRejection>
) -> Response
{   let body = match body
    {   Ok(Json(body)) => body
      , Err(rejection) => {
          return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInput,
            rejection.body_text()
          );
        }
    };
    if body.text().trim().is_empty()
    {   return error_response(
          StatusCode::BAD_REQUEST,
          ErrorCode::InvalidInput,
          "text is required".to_string()
        );
    }
    let classifier = state.registry.orchestrator().classifier();
    match classifier.classify(body.text()).await
    {   Ok(result) => Json(result).into_response()
      , Err(e) => {
          error!("Classification failed: {}", e);
          error_response(StatusCode::BAD_GATEWAY, e.code(), e.to_string())
        }
    }
}

async fn build_prompt(
  State(state): State<AppState>
, Json(body): Json<PromptRequest>
) -> Response
{   let builder = state.registry.orchestrator().prompt_builder();
    match builder.build(&body).await
    {   Ok(result) => Json(result).into_response()
      , Err(e) => {
          error!("Prompt building failed: {}", e);
          error_response(StatusCode::BAD_GATEWAY, e.code(), e.to_string())
        }
    }
}

async fn generate(
  State(state): State<AppState>
, Json(body): Json<GenerateRequest>
) -> Response
{   if body.prompt.trim().is_empty()
    {   return error_response(
          StatusCode::BAD_REQUEST,
          ErrorCode::InvalidInput,
          "prompt is required".to_string()
        );
    }
    let generator = state.registry.orchestrator().generator();
    match generator.generate_tagged(&body).await
    {   Ok(tagged) => Json(tagged.result).into_response()
      , Err(e) => {
          error!("Generation failed: {}", e);
          error_response(StatusCode::BAD_GATEWAY, e.code(), e.to_string())
        }
    }
}
