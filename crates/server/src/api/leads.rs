use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use profile_scout_domain::usecases::{Digest, DigestConfig, OpportunityDigest};
use profile_scout_domain::{AnalysisRecord, GrowthPotential, PotentialReason, normalize_username};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
    ApiError, ApiResponse, AppState, map_store_error, normalize_limit, validate_min_score,
};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct OpportunitiesQuery {
    limit: Option<usize>,
    min_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReportQuery {
    days: Option<i64>,
    min_score: Option<f64>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OutreachRequest {
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OpportunityItem {
    id: Uuid,
    username: String,
    full_name: String,
    followers: u64,
    opportunity_score: f64,
    growth_potential: GrowthPotential,
    potential_reason: PotentialReason,
    engagement_rate: f64,
    top_issues: Vec<String>,
    contacted: bool,
    converted: bool,
    #[serde(with = "time::serde::rfc3339")]
    analyzed_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryItem {
    id: Uuid,
    opportunity_score: f64,
    growth_potential: GrowthPotential,
    engagement_rate: f64,
    followers: u64,
    issue_count: usize,
    contacted: bool,
    converted: bool,
    notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    analyzed_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub(super) struct OutreachData {
    username: String,
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    at: OffsetDateTime,
}

impl From<AnalysisRecord> for OpportunityItem {
    fn from(record: AnalysisRecord) -> Self {
        let AnalysisRecord { result, outreach } = record;
        Self {
            id: result.id,
            top_issues: result
                .issues
                .iter()
                .take(3)
                .map(|issue| issue.detail.clone())
                .collect(),
            username: result.username,
            full_name: result.full_name,
            followers: result.followers,
            opportunity_score: result.opportunity_score,
            growth_potential: result.growth_potential,
            potential_reason: result.potential_reason,
            engagement_rate: result.metrics.engagement_rate,
            contacted: outreach.contacted,
            converted: outreach.converted,
            analyzed_at: result.analyzed_at,
        }
    }
}

impl From<AnalysisRecord> for HistoryItem {
    fn from(record: AnalysisRecord) -> Self {
        let AnalysisRecord { result, outreach } = record;
        Self {
            id: result.id,
            opportunity_score: result.opportunity_score,
            growth_potential: result.growth_potential,
            engagement_rate: result.metrics.engagement_rate,
            followers: result.followers,
            issue_count: result.issues.len(),
            contacted: outreach.contacted,
            converted: outreach.converted,
            notes: outreach.notes,
            analyzed_at: result.analyzed_at,
        }
    }
}

fn path_username(request_id: &str, raw: &str) -> Result<String, ApiError> {
    normalize_username(raw)
        .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

pub(super) async fn list_opportunities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OpportunitiesQuery>,
) -> Result<Json<ApiResponse<Vec<OpportunityItem>>>, ApiError> {
    let min_score = validate_min_score(&req_id.0, query.min_score, 5.0)?;
    let limit = normalize_limit(query.limit, 20, 100);

    let records = state
        .store
        .top_opportunities(min_score, limit)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        records.into_iter().map(OpportunityItem::from).collect(),
        req_id.0,
    ))
}

pub(super) async fn opportunity_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<Digest>>, ApiError> {
    let defaults = DigestConfig::default();
    let config = DigestConfig {
        window: query
            .days
            .map_or(defaults.window, |days| Duration::days(days.clamp(1, 90))),
        min_score: validate_min_score(&req_id.0, query.min_score, defaults.min_score)?,
        limit: normalize_limit(query.limit, defaults.limit, 100),
    };

    let digest = OpportunityDigest::new(Arc::clone(&state.store), Arc::clone(&state.clock), config)
        .build()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(digest, req_id.0))
}

pub(super) async fn profile_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryItem>>>, ApiError> {
    let username = path_username(&req_id.0, &username)?;
    let limit = normalize_limit(query.limit, 10, 50);

    let records = state
        .store
        .history(&username, limit)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    if records.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("No history found for @{username}"),
        ));
    }

    Ok(ApiResponse::new(
        records.into_iter().map(HistoryItem::from).collect(),
        req_id.0,
    ))
}

#[derive(Debug, Clone, Copy)]
enum Outreach {
    Contacted,
    Converted,
}

impl Outreach {
    fn as_str(self) -> &'static str {
        match self {
            Self::Contacted => "contacted",
            Self::Converted => "converted",
        }
    }
}

pub(super) async fn mark_contacted(
    state: State<AppState>,
    req_id: Extension<RequestId>,
    username: Path<String>,
    body: Json<OutreachRequest>,
) -> Result<Json<ApiResponse<OutreachData>>, ApiError> {
    record_outreach(state, req_id, username, body, Outreach::Contacted).await
}

pub(super) async fn mark_converted(
    state: State<AppState>,
    req_id: Extension<RequestId>,
    username: Path<String>,
    body: Json<OutreachRequest>,
) -> Result<Json<ApiResponse<OutreachData>>, ApiError> {
    record_outreach(state, req_id, username, body, Outreach::Converted).await
}

async fn record_outreach(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
    Json(request): Json<OutreachRequest>,
    outreach: Outreach,
) -> Result<Json<ApiResponse<OutreachData>>, ApiError> {
    let username = path_username(&req_id.0, &username)?;
    let notes = request.notes.as_deref();
    let at = state.clock.now();

    let updated = match outreach {
        Outreach::Contacted => state.store.mark_contacted(&username, notes, at).await,
        Outreach::Converted => state.store.mark_converted(&username, notes, at).await,
    }
    .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    if !updated {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("Profile @{username} has not been analyzed yet"),
        ));
    }
    tracing::info!(username = %username, status = outreach.as_str(), "Outreach recorded");

    Ok(ApiResponse::new(
        OutreachData {
            username,
            status: outreach.as_str(),
            at,
        },
        req_id.0,
    ))
}
