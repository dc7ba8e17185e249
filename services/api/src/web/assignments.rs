//! services/api/src/web/assignments.rs
//!
//! Handler for the review-assignment listing used by the editorial office
//! to audit the fan-out ledger.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::web::state::AppState;
use peer_review_core::domain::{EntityId, Page, ReviewStatus};
use peer_review_core::ports::{AssignmentFilter, WorkflowError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsQuery {
    pub paper_id: Option<EntityId>,
    pub section_head_id: Option<EntityId>,
    pub status: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /assignments — filterable listing of review assignments.
pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Query(params): Query<AssignmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(ReviewStatus::parse(raw).ok_or_else(|| {
            WorkflowError::InvalidInput(format!("Invalid assignment status: {raw}"))
        })?),
        None => None,
    };

    let page = Page::new(params.offset.unwrap_or(0), params.limit.unwrap_or(10));
    let view = state
        .assignments
        .list(
            AssignmentFilter {
                paper_id: params.paper_id,
                section_head_id: params.section_head_id,
                status,
            },
            page,
        )
        .await?;
    Ok(Json(view))
}
