#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use switchyard_core::{SwitchyardError, SwitchyardResult, ToolCall, ToolInvoker};
use switchyard_fabric::{AgentDirectory, DispatchTable, HttpForwarder, RoutingFabric};
use switchyard_gateway::{AppState, AuthConfig, GatewayServer};
use switchyard_pipeline::{
    DecisionModel, Pipeline, PipelineConfig, VectorRetriever, DISPATCH_TOOL, NORMALIZE_TOOL,
};
use switchyard_vector::{
    DeterministicEmbedding, EmbedderSet, FileVectorStore, LocalVectorService, VectorService,
};
use tokio::net::TcpListener;

/// Normalizes to a fixed healthy context; dispatch fails on demand.
struct Tools {
    fail_dispatch: bool,
}

#[async_trait]
impl ToolInvoker for Tools {
    async fn invoke(&self, call: ToolCall) -> SwitchyardResult<Value> {
        match call.name.as_str() {
            NORMALIZE_TOOL => Ok(json!({
                "systemStatus": "healthy",
                "requestType": "query",
                "skillCategory": "read",
                "securityLevel": "low",
                "agentLoad": "low",
                "contextComplexity": "simple"
            })),
            DISPATCH_TOOL if self.fail_dispatch => Err(SwitchyardError::remote(503, DISPATCH_TOOL)),
            DISPATCH_TOOL => Ok(json!({"accepted": true})),
            other => Err(SwitchyardError::Tool(format!("unexpected tool {other}"))),
        }
    }
}

/// Start a gateway on a random port, returning its base URL.
async fn start(auth: AuthConfig, fail_dispatch: bool) -> (String, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileVectorStore::open(tmp.path().join("vectors.jsonl"), None)
        .await
        .unwrap();
    let vectors: Arc<dyn VectorService> =
        Arc::new(LocalVectorService::new(Arc::new(store), EmbedderSet::local()));
    let pipeline = Pipeline::new(
        Arc::new(Tools { fail_dispatch }),
        Arc::new(VectorRetriever::new(vectors.clone(), "evidence")),
        Arc::new(DecisionModel::builtin()),
        PipelineConfig::default(),
    );
    let fabric = RoutingFabric::new(
        Arc::new(AgentDirectory::builtin()),
        Arc::new(DispatchTable::standard()),
        Arc::new(pipeline),
        vectors.clone(),
        Arc::new(HttpForwarder::new().unwrap()),
    );
    let state = Arc::new(AppState {
        fabric: Arc::new(fabric),
        vectors,
    });
    let app = GatewayServer::build_with_auth(state, "/v1", auth);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://127.0.0.1:{}", addr.port()), tmp)
}

async fn post(url: String, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_healthz() {
    let (base, _tmp) = start(AuthConfig::default(), false).await;
    let resp = reqwest::get(format!("{base}/v1/healthz")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_upsert_then_query() {
    let (base, _tmp) = start(AuthConfig::default(), false).await;

    let items: Vec<Value> = ["alpha", "beta", "gamma", "delta"]
        .iter()
        .map(|t| {
            json!({
                "id": format!("doc:{t}"),
                "vector": DeterministicEmbedding::vector(t, 64),
                "text": t,
                "meta": {"file": "doc.md"}
            })
        })
        .collect();
    let (status, body) = post(
        format!("{base}/v1/vectors"),
        json!({"namespace": "repo", "items": items}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["upserted"], 4);

    let (status, body) = post(
        format!("{base}/v1/query"),
        json!({
            "namespace": "repo",
            "vector": DeterministicEmbedding::vector("gamma", 64),
            "topK": 2,
            "includeText": true
        }),
    )
    .await;
    assert_eq!(status, 200);
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["id"], "doc:gamma");
    assert_eq!(matches[0]["text"], "gamma");
    assert_eq!(matches[0]["meta"]["file"], "doc.md");

    let (_, body) = post(
        format!("{base}/v1/query"),
        json!({"namespace": "repo", "vector": DeterministicEmbedding::vector("gamma", 64)}),
    )
    .await;
    assert!(body["matches"][0].get("text").is_none());
}

#[tokio::test]
async fn test_embed_and_dot() {
    let (base, _tmp) = start(AuthConfig::default(), false).await;

    let (status, body) = post(
        format!("{base}/v1/embed"),
        json!({"texts": ["hello", ""], "dim": 8}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["dim"], 8);
    assert_eq!(body["embeddings"].as_array().unwrap().len(), 2);
    assert_eq!(body["embeddings"][0]["vector"].as_array().unwrap().len(), 8);

    let (status, body) = post(
        format!("{base}/v1/dot"),
        json!({
            "query": [1.0, 0.0],
            "vectors": [{"id": "b", "vector": [0.5, 0.5]}, {"id": "a", "vector": [2.0, 1.0]}]
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["scores"][0]["id"], "b");
    assert_eq!(body["scores"][1]["score"], 2.0);
}

#[tokio::test]
async fn test_failures_are_structured() {
    let (base, _tmp) = start(AuthConfig::default(), false).await;

    post(
        format!("{base}/v1/vectors"),
        json!({"items": [{"id": "x", "vector": [1.0, 0.0, 0.0]}]}),
    )
    .await;
    let (status, body) = post(
        format!("{base}/v1/query"),
        json!({"vector": [1.0, 0.0]}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["kind"], "dimension_mismatch");
    assert_eq!(body["details"]["expected"], 3);

    let (status, body) = post(format!("{base}/v1/query"), json!({"topK": 3})).await;
    assert_eq!(status, 400);
    assert_eq!(body["kind"], "invalid_request");
}

#[tokio::test]
async fn test_route_surface() {
    let (base, _tmp) = start(AuthConfig::default(), false).await;

    let (status, body) = post(
        format!("{base}/route"),
        json!({"source": "CLI001", "task": "deploy.rocket", "payload": {}}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["kind"], "unknown_task");

    let (status, body) = post(
        format!("{base}/route"),
        json!({"task": "vector.query", "targetRole": "nonexistent-role", "payload": {}}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["kind"], "no_agent_for_role");

    let (status, body) = post(
        format!("{base}/route"),
        json!({"task": "dmn.orchestrate", "payload": {"request": "status"}}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["agent"], "CDYP71");
    assert_eq!(body["response"]["status"], "COMPLETED");
    assert_eq!(body["response"]["rag_support"], json!([]));
}

#[tokio::test]
async fn test_dispatch_failure_carries_partial_state() {
    let (base, _tmp) = start(AuthConfig::default(), true).await;
    let (status, body) = post(
        format!("{base}/route"),
        json!({"task": "dmn.orchestrate", "payload": {}}),
    )
    .await;
    assert_eq!(status, 502);
    assert_eq!(body["kind"], "dispatch_failed");
    assert_eq!(body["details"]["status"], "FAILED");
    assert_eq!(body["details"]["plan"], "direct");
}

#[tokio::test]
async fn test_agents_listing() {
    let (base, _tmp) = start(AuthConfig::default(), false).await;
    let agents: Vec<Value> = reqwest::get(format!("{base}/agents"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(agents.len(), 12);
    assert_eq!(agents[0]["id"], "CDYP71");
    assert_eq!(agents[0]["transport"], "in-process");
}

#[tokio::test]
async fn test_api_key_auth() {
    let (base, _tmp) = start(AuthConfig::new(vec!["sekrit".into()]), false).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/agents")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "unauthorized");

    let resp = client
        .get(format!("{base}/agents"))
        .bearer_auth("sekrit")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The health check stays open.
    let resp = client.get(format!("{base}/v1/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
