mod common;

use std::sync::Arc;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use common::{calls, CallLog, HarnessBuilder};
use emoflow::config::OrchestratorConfig;
use emoflow::server::build_router;
use emoflow::{FlowOrchestrator, FlowRegistry};

fn stub_app() -> (Router, CallLog)
{   let harness = HarnessBuilder::new().build();
    let log = harness.log.clone();
    let registry = FlowRegistry::new(Arc::new(harness.orchestrator));
    (build_router(registry), log)
}

fn default_app() -> Router
{   let orchestrator = FlowOrchestrator::from_config(
      &OrchestratorConfig::default()
    ).unwrap();
    build_router(FlowRegistry::new(Arc::new(orchestrator)))
}

async fn post_json(
  app: Router
, uri: &str
, body: &str
) -> (StatusCode, serde_json::Value)
{   let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health()
{   let (app, _) = stub_app();
    let req = Request::builder()
      .method("GET")
      .uri("/health")
      .body(Body::empty())
      .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_chat_route_returns_envelope()
{   let (app, log) = stub_app();
    let (status, json) = post_json(app, "/chat", r#"{"text":"I feel low"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["error"].is_null());
    assert_eq!(json["message"], json["reply"]);
    assert!(!json["traceId"].as_str().unwrap().is_empty());
    assert_eq!(json["meta"]["traceId"], json["traceId"]);
    assert_eq!(json["meta"]["flow"], "chat");
    assert_eq!(json["meta"]["llmProvider"], "stub");
    assert_eq!(json["suggestedExercise"], "thought_log");
    assert_eq!(json["emotion"]["label"], "sad");
    assert_eq!(calls(&log), vec!["classify", "build", "generate"]);
}

#[tokio::test]
async fn test_chat_route_empty_and_missing_text()
{   for body in [r#"{"text":""}"#, r#"{}"#]
    {   let (app, log) = stub_app();
        let (status, json) = post_json(app, "/chat", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["error"]["code"], "invalid_input");
        assert_eq!(json["message"], "Something went wrong. Please try again.");
        assert!(calls(&log).is_empty());
    }
}

#[tokio::test]
async fn test_unreadable_bodies_still_get_an_envelope()
{   for (content_type, body) in [
      ("application/json", r#"{"text":null}"#)
    , ("application/json", "not json")
    , ("application/json", r#"{"text":42}"#)
    , ("text/plain", "I feel low")
    ]
    {   let (app, log) = stub_app();
        let req = Request::builder()
          .method("POST")
          .uri("/chat")
          .header("content-type", content_type)
          .body(Body::from(body))
          .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "body: {}", body);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["error"]["code"], "invalid_input");
        assert_eq!(json["message"], "Something went wrong. Please try again.");
        assert!(!json["traceId"].as_str().unwrap().is_empty());
        assert_eq!(json["meta"]["flow"], "chat");
        assert!(calls(&log).is_empty());
    }
}

#[tokio::test]
async fn test_named_flow_rejects_malformed_body_with_envelope()
{   let (app, _) = stub_app();
    let (status, json) = post_json(app, "/flows/thought-clarify", "{").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"]["code"], "invalid_input");
    assert_eq!(json["meta"]["flow"], "thought-clarify");
}

#[tokio::test]
async fn test_breathing_route()
{   let (app, _) = stub_app();
    let (status, json) = post_json(app, "/breathing", r#"{"text":"help"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["emotion"].is_null());
    assert_eq!(json["suggestedExercise"], "breathing");
    assert!(json["message"]
      .as_str()
      .unwrap()
      .to_lowercase()
      .contains("box breathing"));
}

#[tokio::test]
async fn test_thought_clarify_route()
{   let (app, _) = stub_app();
    let (_, json) = post_json(
      app, "/thought-clarify", r#"{"text":"I lost my job"}"#
    ).await;
    assert!(json["meta"]["facts"].as_str().unwrap().contains("I lost my job"));
    assert_eq!(json["meta"]["flow"], "thought-clarify");
}

#[tokio::test]
async fn test_named_flow_route_and_unknown_flow()
{   let (app, log) = stub_app();
    let (status, json) = post_json(
      app.clone(), "/flows/breathing", r#"{"text":""}"#
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meta"]["flow"], "breathing");

    let (status, json) = post_json(app, "/flows/yoga", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "unknown_flow");
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_default_pipeline_end_to_end()
{   let (status, json) = post_json(
      default_app(), "/chat", r#"{"text":"I am so anxious and worried"}"#
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["error"].is_null());
    assert_eq!(json["mode"], "high_safety");
    assert_eq!(json["suggestedExercise"], "breathing");
    assert_eq!(json["meta"]["template"], "high_intensity");
    assert_eq!(json["meta"]["llmProvider"], "mock");
    assert_eq!(json["emotion"]["label"], "anxious");
    assert_eq!(json["emotion"]["intensity"], "high");
    assert!(json["message"].as_str().unwrap().starts_with("(mock)"));
}

#[tokio::test]
async fn test_collaborator_routes()
{   let (status, json) = post_json(
      default_app(), "/classify", r#"{"text":"I feel tired and drained"}"#
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["label"], "tired");
    assert_eq!(json["intensity"], 2);

    let (status, json) = post_json(
      default_app(),
      "/build",
      r#"{"label":"sad","intensity":"low","text":"hi","context":{}}"#
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "normal");
    assert_eq!(json["templateName"], "normal_intensity");

    let (status, json) = post_json(
      default_app(),
      "/generate",
      r#"{"prompt":"Hello","providerOverride":"nope"}"#
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["provider"], "mock");
    assert_eq!(json["usage"]["fallbackFrom"], "nope");

    let (status, json) = post_json(default_app(), "/generate", r#"{"prompt":" "}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "invalid_input");
}
