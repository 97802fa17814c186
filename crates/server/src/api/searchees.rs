//! Searchee API handlers: decision listings, collisions and bulk search.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use reseed_core::decide::Decision;
use reseed_core::indexer::{BulkSearchOptions, BulkSearchSummary};
use reseed_core::store::{CollisionRow, DecisionRow, StoreError};

use crate::state::AppState;

/// Maximum allowed page size for candidate queries
const MAX_LIMIT: i64 = 200;

/// Default page size
const DEFAULT_LIMIT: i64 = 50;

/// Maximum names per bulk search
const MAX_BULK_NAMES: usize = 20;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub searchee: String,
    pub guid: String,
    pub info_hash: Option<String>,
    pub decision: Decision,
    pub first_seen: String,
    pub last_seen: String,
    pub fuzzy_size_factor: f64,
}

impl From<DecisionRow> for CandidateResponse {
    fn from(row: DecisionRow) -> Self {
        Self {
            searchee: row.searchee_name,
            guid: row.guid,
            info_hash: row.info_hash,
            decision: row.decision,
            first_seen: row.first_seen.to_rfc3339(),
            last_seen: row.last_seen.to_rfc3339(),
            fuzzy_size_factor: row.fuzzy_size_factor,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<CandidateResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct CollisionResponse {
    pub searchee: String,
    pub guid: String,
    pub info_hash: Option<String>,
    pub candidate_trackers: Vec<String>,
    pub known_trackers: Vec<String>,
    pub first_seen: String,
    pub last_seen: String,
    pub updated_at: String,
}

impl From<(CollisionRow, DecisionRow)> for CollisionResponse {
    fn from((collision, decision): (CollisionRow, DecisionRow)) -> Self {
        Self {
            searchee: decision.searchee_name,
            guid: decision.guid,
            info_hash: decision.info_hash,
            candidate_trackers: collision.candidate_trackers,
            known_trackers: collision.known_trackers,
            first_seen: collision.first_seen.to_rfc3339(),
            last_seen: collision.last_seen.to_rfc3339(),
            updated_at: collision.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollisionFiltersResponse {
    pub names: Vec<String>,
    pub trackers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkSearchBody {
    pub names: Vec<String>,
    #[serde(default)]
    pub exclude_recent_search: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn candidates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<CandidateListResponse>, ApiError> {
    let (limit, offset) = validate_page(&params)?;
    let rows = state.decisions().list(limit, offset).map_err(internal)?;
    let total = state.decisions().count().map_err(internal)?;
    Ok(Json(CandidateListResponse {
        candidates: rows.into_iter().map(CandidateResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

pub async fn collisions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<CollisionResponse>>, ApiError> {
    let (limit, offset) = validate_page(&params)?;
    let rows = state
        .decisions()
        .list_collisions(limit, offset)
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(CollisionResponse::from).collect()))
}

pub async fn collision_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CollisionFiltersResponse>, ApiError> {
    let (names, trackers) = state.decisions().collision_filters().map_err(internal)?;
    Ok(Json(CollisionFiltersResponse { names, trackers }))
}

pub async fn bulk_search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BulkSearchBody>,
) -> Result<Json<BulkSearchSummary>, ApiError> {
    let names: Vec<String> = body
        .names
        .into_iter()
        .filter(|n| !n.trim().is_empty())
        .collect();
    if names.is_empty() {
        return Err(bad_request("names must not be empty"));
    }
    if names.len() > MAX_BULK_NAMES {
        return Err(bad_request(&format!(
            "too many names: {} (limit {})",
            names.len(),
            MAX_BULK_NAMES
        )));
    }

    let Some(searcher) = state.bulk_searcher() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "no search backend configured".to_string(),
            }),
        ));
    };

    let options = BulkSearchOptions {
        exclude_recent_search: body.exclude_recent_search,
    };
    let summary = searcher
        .bulk_search_by_names(&names, &options)
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;
    Ok(Json(summary))
}

fn validate_page(params: &PageParams) -> Result<(i64, i64), ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(bad_request(&format!(
            "limit must be within [1, {}]",
            MAX_LIMIT
        )));
    }
    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(bad_request("offset must not be negative"));
    }
    Ok((limit, offset))
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn internal(e: StoreError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
