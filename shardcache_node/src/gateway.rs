use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::cors::CorsLayer;

use crate::node::CacheNode;

#[derive(Debug, Serialize)]
struct ApiHealthResponse {
    healthy: bool,
    node_id: String,
}

#[derive(Debug, Serialize)]
struct ApiSetResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    detail: String,
}

/// Client-facing HTTP surface of a node. Keys live in the path, so the
/// wildcard route accepts keys containing slashes; values travel as JSON.
pub fn router(node: Arc<CacheNode>) -> Router {
    Router::new()
        .route("/health", any(handle_health))
        .route("/", post(handle_set).fallback(handle_not_found))
        .route(
            "/*key",
            get(handle_get).delete(handle_del).fallback(handle_not_found),
        )
        .fallback(handle_not_found)
        .layer(CorsLayer::permissive())
        .with_state(node)
}

async fn handle_health(State(node): State<Arc<CacheNode>>) -> Json<ApiHealthResponse> {
    Json(ApiHealthResponse {
        healthy: true,
        node_id: node.node_id().to_string(),
    })
}

// Batch set: every member of a flat JSON object becomes one entry.
// String values are stored verbatim, anything else as its JSON text.
async fn handle_set(
    State(node): State<Arc<CacheNode>>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<ApiSetResponse>, (StatusCode, Json<ApiErrorResponse>)> {
    let Json(entries) = body.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse {
                detail: "invalid JSON body".to_string(),
            }),
        )
    })?;

    let mut success = true;
    for (key, value) in entries {
        let value = match value {
            Value::String(text) => text,
            other => other.to_string(),
        };
        if !node.set(&key, &value).await {
            success = false;
        }
    }
    Ok(Json(ApiSetResponse { success }))
}

async fn handle_get(
    State(node): State<Arc<CacheNode>>,
    Path(key): Path<String>,
) -> Result<Json<Map<String, Value>>, (StatusCode, Json<ApiErrorResponse>)> {
    match node.get(&key).await {
        Some(value) => {
            let mut body = Map::new();
            body.insert(key, Value::String(value));
            Ok(Json(body))
        }
        None => Err(not_found()),
    }
}

async fn handle_del(State(node): State<Arc<CacheNode>>, Path(key): Path<String>) -> String {
    if node.del(&key).await {
        "1".to_string()
    } else {
        "0".to_string()
    }
}

async fn handle_not_found() -> (StatusCode, Json<ApiErrorResponse>) {
    not_found()
}

fn not_found() -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse {
            detail: "not found".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::Node;

    fn test_node() -> Arc<CacheNode> {
        Arc::new(CacheNode::new(Node::new(
            "n1".to_string(),
            "127.0.0.1".to_string(),
            50051,
            9527,
        )))
    }

    #[tokio::test]
    async fn health_reports_node_id() {
        let Json(body) = handle_health(State(test_node())).await;
        assert!(body.healthy);
        assert_eq!(body.node_id, "n1");
    }

    #[tokio::test]
    async fn batch_set_stores_every_member() {
        let node = test_node();

        let mut entries = Map::new();
        entries.insert("user:1".to_string(), Value::String("Alice".to_string()));
        entries.insert("count".to_string(), serde_json::json!(7));

        let result = handle_set(State(node.clone()), Ok(Json(entries))).await;
        let Json(body) = result.expect("batch set should succeed");
        assert!(body.success);

        assert_eq!(node.get_local("user:1").as_deref(), Some("Alice"));
        assert_eq!(node.get_local("count").as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn get_returns_key_value_object_or_404() {
        let node = test_node();
        node.set_local("user:1", "Alice");

        let result = handle_get(State(node.clone()), Path("user:1".to_string())).await;
        let Json(body) = result.expect("key should be found");
        assert_eq!(
            body.get("user:1"),
            Some(&Value::String("Alice".to_string()))
        );

        let missing = handle_get(State(node), Path("user:2".to_string())).await;
        let (status, _) = missing.expect_err("missing key should 404");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_reports_presence_as_text() {
        let node = test_node();
        node.set_local("user:1", "Alice");

        assert_eq!(handle_del(State(node.clone()), Path("user:1".to_string())).await, "1");
        assert_eq!(handle_del(State(node), Path("user:1".to_string())).await, "0");
    }

    #[tokio::test]
    async fn unknown_routes_return_json_404() {
        let (status, Json(body)) = handle_not_found().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.detail, "not found");
    }
}
