use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use truvo_db::{create_pool, init_schema, DbPool, DbRuntimeSettings};
use truvo_server::{app, AppState};
use truvo_types::AgentDefaults;
use truvo_voice::{LiveKitConfig, VoiceService};

fn setup_app() -> (Router, DbPool) {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        init_schema(&conn).unwrap();
    }

    let state = AppState {
        pool: pool.clone(),
        voice_service: Arc::new(VoiceService::new(LiveKitConfig::default())),
        defaults: Arc::new(AgentDefaults::default()),
        dashboard_dir: None,
    };

    (app(state), pool)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    let request = match body {
        Some(json) => request.body(Body::from(json.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_call(app: &Router, agent_id: Option<&str>, room: &str) -> Value {
    let (status, call) = send(
        app,
        "POST",
        "/api/calls",
        Some(json!({ "agent_id": agent_id, "room_name": room })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    call
}

#[tokio::test]
async fn test_create_call() {
    let (app, _pool) = setup_app();

    let (status, call) = send(
        &app,
        "POST",
        "/api/calls",
        Some(json!({
            "room_name": "agent-a1-1700000000000",
            "agent_id": "a1",
            "metadata": { "source": "dashboard" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(call["room_name"], "agent-a1-1700000000000");
    assert_eq!(call["agent_id"], "a1");
    assert_eq!(call["metadata"]["source"], "dashboard");
    assert!(call["started_at"].is_string());
    assert!(call["ended_at"].is_null());
    assert!(call["duration_seconds"].is_null());
}

#[tokio::test]
async fn test_create_call_requires_room_name() {
    let (app, pool) = setup_app();

    for body in [json!({ "agent_id": "a1" }), json!({ "room_name": "" })] {
        let (status, error) = send(&app, "POST", "/api/calls", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "room_name is required");
    }

    let conn = pool.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM calls", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_list_calls_filters_by_agent_newest_first() {
    let (app, _pool) = setup_app();

    let a_old = create_call(&app, Some("A"), "r1").await;
    create_call(&app, Some("B"), "r2").await;
    create_call(&app, None, "r3").await;
    let a_new = create_call(&app, Some("A"), "r4").await;

    let (status, calls) = send(&app, "GET", "/api/calls?agent_id=A", None).await;
    assert_eq!(status, StatusCode::OK);
    let calls = calls.as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["id"], a_new["id"]);
    assert_eq!(calls[1]["id"], a_old["id"]);
    assert!(calls.iter().all(|c| c["agent_id"] == "A"));

    let (_, all) = send(&app, "GET", "/api/calls", None).await;
    assert_eq!(all.as_array().unwrap().len(), 4);

    // An empty filter is no filter.
    let (_, all) = send(&app, "GET", "/api/calls?agent_id=", None).await;
    assert_eq!(all.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_list_calls_limit() {
    let (app, _pool) = setup_app();
    for i in 0..3 {
        create_call(&app, None, &format!("room-{i}")).await;
    }

    let (status, calls) = send(&app, "GET", "/api/calls?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let calls = calls.as_array().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["room_name"], "room-2");

    let (status, calls) = send(&app, "GET", "/api/calls?limit=100000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.as_array().unwrap().len(), 3);

    let (status, _) = send(&app, "GET", "/api/calls?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_calls_includes_agent_name() {
    let (app, _pool) = setup_app();

    let (_, agent) = send(
        &app,
        "POST",
        "/api/agents",
        Some(json!({ "name": "Leasing Desk", "system_prompt": "p" })),
    )
    .await;
    let agent_id = agent["id"].as_str().unwrap();
    create_call(&app, Some(agent_id), "with-agent").await;
    create_call(&app, Some("deleted-agent"), "orphan").await;

    let (_, calls) = send(&app, "GET", "/api/calls", None).await;
    let calls = calls.as_array().unwrap();
    assert_eq!(calls[0]["room_name"], "orphan");
    assert!(calls[0]["agents"].is_null());
    assert_eq!(calls[1]["room_name"], "with-agent");
    assert_eq!(calls[1]["agents"]["name"], "Leasing Desk");
}
