//! HTTP query service over the version store.
//!
//! Read-only collaborator of the mining pipeline: it serves the records the
//! miners write and never writes anything itself. Every record visible here
//! was visible the moment its insert returned.
//!
//! The store pool is opened once at startup and shared by all requests
//! through [`AppState`]; it lives for the lifetime of the service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/artifact/{name}/versions` | All stored versions of an artifact |
//! | `GET`  | `/artifact/{name}/version/{version}` | Schema location at a specific version |
//!
//! # Error Contract
//!
//! Error responses carry a machine-readable code and a message:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "artifact not found: WeatherObserved" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based catalog
//! viewers can call the API directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::store;

/// Shared application state passed to route handlers via Axum's `State`.
#[derive(Clone)]
struct AppState {
    pool: SqlitePool,
}

/// Start the query service on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    let app = build_router(pool.clone());

    println!("query service listening on http://{}", bind_addr);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            pool.close().await;
            return Err(e.into());
        }
    };

    let result = axum::serve(listener, app).await;
    pool.close().await;
    result?;

    Ok(())
}

fn build_router(pool: SqlitePool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/artifact/{name}/versions", get(handle_list_versions))
        .route(
            "/artifact/{name}/version/{version}",
            get(handle_get_version),
        )
        .layer(cors)
        .with_state(AppState { pool })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /artifact/{name}/versions ============

async fn handle_list_versions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let versions = store::list_versions(&state.pool, &name)
        .await
        .map_err(|e| internal(e.to_string()))?;

    if versions.is_empty() {
        return Err(not_found(format!("artifact not found: {}", name)));
    }

    Ok(Json(versions))
}

// ============ GET /artifact/{name}/version/{version} ============

#[derive(Serialize)]
struct VersionResponse {
    version: String,
    #[serde(rename = "schemaUrl")]
    schema_url: String,
}

async fn handle_get_version(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, AppError> {
    let record = store::find_version(&state.pool, &name, &version)
        .await
        .map_err(|e| internal(e.to_string()))?
        .ok_or_else(|| not_found(format!("artifact version not found: {} {}", name, version)))?;

    Ok(Json(VersionResponse {
        version: record.version,
        schema_url: record.schema_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use crate::models::VersionRecord;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    async fn seeded_router() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::apply(&pool).await.unwrap();

        let records = vec![
            VersionRecord {
                subject: "Weather".to_string(),
                artifact: "WeatherObserved".to_string(),
                version: "1.0".to_string(),
                schema_url: "fake://raw/c2".to_string(),
                commit_hash: "c2".to_string(),
                commit_date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            },
            VersionRecord {
                subject: "Weather".to_string(),
                artifact: "WeatherObserved".to_string(),
                version: "2.0".to_string(),
                schema_url: "fake://raw/c1".to_string(),
                commit_hash: "c1".to_string(),
                commit_date: Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
            },
        ];
        store::insert_new(&pool, &records).await.unwrap();

        build_router(pool)
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let router = seeded_router().await;
        let (status, body) = get_json(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn versions_listed_for_known_artifact() {
        let router = seeded_router().await;
        let (status, body) = get_json(&router, "/artifact/WeatherObserved/versions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["1.0", "2.0"]));
    }

    #[tokio::test]
    async fn unknown_artifact_is_not_found() {
        let router = seeded_router().await;
        let (status, body) = get_json(&router, "/artifact/Nope/versions").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn version_lookup_returns_schema_url() {
        let router = seeded_router().await;
        let (status, body) = get_json(&router, "/artifact/WeatherObserved/version/2.0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "2.0");
        assert_eq!(body["schemaUrl"], "fake://raw/c1");
    }

    #[tokio::test]
    async fn requests_share_one_pool() {
        // An in-memory database exists only on its own pool: both requests
        // succeeding proves the handlers reuse the startup pool instead of
        // opening a fresh one per request.
        let router = seeded_router().await;
        let (first, _) = get_json(&router, "/artifact/WeatherObserved/versions").await;
        let (second, _) = get_json(&router, "/artifact/WeatherObserved/version/1.0").await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
    }
}
