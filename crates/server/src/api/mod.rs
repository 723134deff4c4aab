mod analysis;
mod leads;

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderName, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use profile_scout_domain::usecases::{AnalyzeError, AnalyzeUseCase, BatchAnalyzer, BatchConfig};
use profile_scout_domain::{
    AnalysisStore, Clock, ProfileSource, ProfileSourceError, SnapshotError, StoreError,
};
use serde::Serialize;
use time::OffsetDateTime;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{AuthState, RequestId, request_id, require_bearer_auth};

pub type ServerUseCase = AnalyzeUseCase<dyn ProfileSource, dyn AnalysisStore, dyn Clock>;
type ServerBatch = BatchAnalyzer<dyn ProfileSource, dyn AnalysisStore, dyn Clock>;

#[derive(Clone)]
pub struct AppState {
    usecase: Arc<ServerUseCase>,
    batch: Arc<ServerBatch>,
    store: Arc<dyn AnalysisStore>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// `store` and `clock` must be the ones `usecase` was built with
    pub fn new(
        usecase: ServerUseCase,
        store: Arc<dyn AnalysisStore>,
        clock: Arc<dyn Clock>,
        batch: BatchConfig,
    ) -> Self {
        let usecase = Arc::new(usecase);
        let batch = Arc::new(BatchAnalyzer::new(Arc::clone(&usecase), batch));
        Self {
            usecase,
            batch,
            store,
            clock,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    profiles: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analyses: Option<u64>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "invalid_snapshot" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

pub(super) fn validate_min_score(
    request_id: &str,
    min_score: Option<f64>,
    default: f64,
) -> Result<f64, ApiError> {
    let min_score = min_score.unwrap_or(default);
    if !(0.0..=10.0).contains(&min_score) {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("min_score must be between 0 and 10 (got {min_score})"),
        ));
    }
    Ok(min_score)
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    tracing::error!(error = %error, "analysis store query failed");
    ApiError::new(request_id, "internal_error", "analysis store query failed")
}

pub(super) fn map_analyze_error(request_id: String, error: &AnalyzeError) -> ApiError {
    let code = match error {
        AnalyzeError::Snapshot(SnapshotError::InvalidUsername(_)) => "validation_error",
        AnalyzeError::Snapshot(_) => "invalid_snapshot",
        AnalyzeError::Source(ProfileSourceError::NotFound(_)) => "not_found",
        AnalyzeError::Source(ProfileSourceError::RateLimited(_)) => "rate_limited",
        AnalyzeError::Source(_) => "upstream_error",
        AnalyzeError::Store(e) => return map_store_error(request_id, e),
    };
    tracing::warn!(error = %error, code, "analysis failed");
    ApiError::new(request_id, code, error.to_string())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analyze", post(analysis::analyze))
        .route("/api/v1/batch-analyze", post(analysis::batch_analyze))
        .route("/api/v1/opportunities", get(leads::list_opportunities))
        .route(
            "/api/v1/opportunities/report",
            get(leads::opportunity_report),
        )
        .route(
            "/api/v1/profiles/{username}/history",
            get(leads::profile_history),
        )
        .route(
            "/api/v1/profiles/{username}/contact",
            post(leads::mark_contacted),
        )
        .route(
            "/api/v1/profiles/{username}/convert",
            post(leads::mark_converted),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match state.store.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            ApiResponse::new(
                HealthData {
                    status: "ok",
                    store: "ok",
                    profiles: Some(stats.profiles),
                    analyses: Some(stats.analyses),
                },
                req_id.0,
            ),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: analysis store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        store: "unavailable",
                        profiles: None,
                        analyses: None,
                    },
                    req_id.0,
                ),
            )
        }
    }
}
