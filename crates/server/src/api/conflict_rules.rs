//! Conflict-rule API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use reseed_core::store::{ConflictRule, ConflictRuleInput, StoreError};

use crate::state::AppState;

/// One rule as presented to the operator.
#[derive(Debug, Serialize)]
pub struct RuleResponse {
    pub priority: u32,
    pub all_indexers: bool,
    pub trackers: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ConflictRule> for RuleResponse {
    fn from(rule: ConflictRule) -> Self {
        Self {
            priority: rule.priority,
            all_indexers: rule.all_indexers,
            trackers: rule.trackers,
            created_at: rule.created_at.to_rfc3339(),
            updated_at: rule.updated_at.to_rfc3339(),
        }
    }
}

/// Tracker sets offered by the rule editor.
#[derive(Debug, Serialize)]
pub struct TrackerOptionsResponse {
    /// Trackers observed through configured indexers.
    pub indexer_trackers: Vec<String>,
    /// Every tracker known to any connected client.
    pub client_trackers: Vec<String>,
    /// Client trackers not reachable through any indexer.
    pub third_party_trackers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn get_rules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RuleResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let rules = state.rules().get_rules().map_err(internal)?;
    Ok(Json(rules.into_iter().map(RuleResponse::from).collect()))
}

pub async fn save_rules(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Vec<ConflictRuleInput>>,
) -> Result<Json<Vec<RuleResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let saved = state.rules().save_rules(&body).map_err(|e| match e {
        StoreError::EmptyRule { .. } | StoreError::MisplacedAllIndexersRule => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        ),
        other => internal(other),
    })?;
    Ok(Json(saved.into_iter().map(RuleResponse::from).collect()))
}

pub async fn tracker_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackerOptionsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let indexer_trackers = state.indexers().all_trackers().map_err(internal)?;
    let client_trackers = state.clients().known_trackers().map_err(internal)?;
    let third_party_trackers = client_trackers
        .iter()
        .filter(|t| !indexer_trackers.contains(t))
        .cloned()
        .collect();
    Ok(Json(TrackerOptionsResponse {
        indexer_trackers,
        client_trackers,
        third_party_trackers,
    }))
}

fn internal(e: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
