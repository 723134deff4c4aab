use axum::{Extension, Json, extract::State};
use profile_scout_domain::AnalysisReport;
use profile_scout_domain::usecases::{BatchError, BatchOutcome};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse, AppState, map_analyze_error, validate_min_score};
use crate::middleware::RequestId;

const MAX_BATCH_USERNAMES: usize = 50;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    username: String,
    /// Skip the stored-analysis shortcut
    #[serde(default)]
    force_refresh: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchAnalyzeRequest {
    usernames: Vec<String>,
    min_opportunity_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchAnalyzeData {
    total: usize,
    successful: usize,
    failed: usize,
    /// Analyses at or above the requested score, best first
    results: Vec<AnalysisReport>,
    errors: Vec<BatchFailure>,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchFailure {
    username: String,
    error: String,
    transient: bool,
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalysisReport>>, ApiError> {
    let outcome = if request.force_refresh {
        state.usecase.refresh_username(&request.username).await
    } else {
        state.usecase.analyze_username(&request.username).await
    };
    let report = outcome.map_err(|e| map_analyze_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}

pub(super) async fn batch_analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<BatchAnalyzeRequest>,
) -> Result<Json<ApiResponse<BatchAnalyzeData>>, ApiError> {
    let min_score = validate_min_score(&req_id.0, request.min_opportunity_score, 0.0)?;
    if request.usernames.len() > MAX_BATCH_USERNAMES {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!(
                "at most {MAX_BATCH_USERNAMES} usernames per batch (got {})",
                request.usernames.len()
            ),
        ));
    }

    let entries = state
        .batch
        .run(&request.usernames)
        .await
        .map_err(|e| match e {
            BatchError::NoUsernames => {
                ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
            }
        })?;

    let total = entries.len();
    let mut results = Vec::new();
    let mut errors = Vec::new();
    for entry in entries {
        match entry.outcome {
            BatchOutcome::Analyzed(report) => results.push(*report),
            BatchOutcome::Failed { error, transient } => errors.push(BatchFailure {
                username: entry.username,
                error,
                transient,
            }),
        }
    }
    let successful = results.len();
    results.retain(|r| r.result.opportunity_score >= min_score);
    results.sort_by(|a, b| {
        b.result
            .opportunity_score
            .total_cmp(&a.result.opportunity_score)
    });

    tracing::info!(total, successful, failed = errors.len(), "Batch analysis served");

    Ok(ApiResponse::new(
        BatchAnalyzeData {
            total,
            successful,
            failed: errors.len(),
            results,
            errors,
        },
        req_id.0,
    ))
}
