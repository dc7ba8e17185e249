//! services/api/src/web/papers.rs
//!
//! Axum handlers for the paper endpoints: multipart submission, the chief
//! editor's status transition, the section head's review decision, and the
//! role-scoped read views.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::web::middleware::Identity;
use crate::web::state::AppState;
use peer_review_core::domain::{Contributor, EntityId, Page, Paper, PaperDraft};
use peer_review_core::ports::{AuthorPaperFilter, WorkflowError};
use peer_review_core::views::{PaperPage, PaperStatusPage};

//=========================================================================================
// Asset URL rehydration
//=========================================================================================

/// Rewrites the paper's relative file references into absolute URLs under
/// the configured base. Storage only ever sees relative paths.
pub(crate) fn with_asset_urls(mut paper: Paper, base: &str) -> Paper {
    paper.main_manuscript = absolutize(base, &paper.main_manuscript);
    paper.cover_letter = paper.cover_letter.map(|r| absolutize(base, &r));
    paper.supplementary_file = paper.supplementary_file.map(|r| absolutize(base, &r));
    paper
}

fn absolutize(base: &str, reference: &str) -> String {
    if reference.is_empty() || reference.starts_with("http") {
        reference.to_string()
    } else {
        format!("{base}{reference}")
    }
}

fn page_of(offset: Option<u64>, limit: Option<u64>) -> Page {
    Page::new(offset.unwrap_or(0), limit.unwrap_or(10))
}

//=========================================================================================
// Submission
//=========================================================================================

/// POST /papers — multipart manuscript submission by an author.
///
/// Text parts carry the metadata (with `authors` and `reviewers` as JSON
/// strings, as the original clients send them); file parts are stored and
/// replaced by their relative references before the draft reaches the core.
pub async fn submit_paper_handler(
    State(state): State<AppState>,
    Extension(Identity(author_id)): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut main_manuscript = None;
    let mut cover_letter = None;
    let mut supplementary_file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read multipart data: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "mainManuscript" | "coverLetter" | "supplementaryFile" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Internal(format!("Failed to read file bytes: {e}")))?;
                let reference = state.assets.save(&file_name, &data).await?;
                match name.as_str() {
                    "mainManuscript" => main_manuscript = Some(reference),
                    "coverLetter" => cover_letter = Some(reference),
                    _ => supplementary_file = Some(reference),
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Internal(format!("Failed to read form field: {e}")))?;
                fields.insert(name, value);
            }
        }
    }

    let authors = parse_contributors(&fields, "authors")?;
    let reviewers = parse_contributors(&fields, "reviewers")?;
    let no_of_authors = match fields.get("noOfAuthors") {
        Some(raw) => raw.parse::<i32>().map_err(|_| {
            WorkflowError::InvalidInput("noOfAuthors must be an integer".into())
        })?,
        None => authors.len() as i32,
    };

    let take = |key: &str| fields.get(key).cloned().unwrap_or_default();
    let draft = PaperDraft {
        manu_script_title: take("manuScriptTitle"),
        manu_script_type: take("manuScriptType"),
        running_title: take("runningTitle"),
        subject: take("subject"),
        abstract_text: take("abstract"),
        corresponding_author_name: take("correspondingAuthorName"),
        corresponding_author_email: take("correspondingAuthorEmail"),
        no_of_authors,
        authors,
        reviewers,
        authors_conflict: fields.get("authorsConflict").cloned(),
        data_availability: fields.get("dataAvailability").cloned(),
        main_manuscript,
        cover_letter,
        supplementary_file,
        apcs: fields.get("apcs").map(|v| v == "true").unwrap_or(false),
        studied_and_understood: fields
            .get("studiedAndUnderstood")
            .map(|v| v == "true")
            .unwrap_or(false),
    };

    let paper = state.lifecycle.submit_paper(author_id, draft).await?;
    let paper = with_asset_urls(paper, &state.config.base_url);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Paper added successfully!", "paper": paper })),
    ))
}

fn parse_contributors(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<Vec<Contributor>, WorkflowError> {
    match fields.get(key) {
        Some(raw) => serde_json::from_str(raw).map_err(|_| {
            WorkflowError::InvalidInput(format!("{key} must be a JSON array of objects"))
        }),
        None => Ok(Vec::new()),
    }
}

//=========================================================================================
// Transitions
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub comment: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub section_head_ids: Option<Vec<EntityId>>,
}

/// PUT /papers/{paper_id}/status — chief editor's lifecycle transition.
pub async fn update_status_handler(
    State(state): State<AppState>,
    Path(paper_id): Path<EntityId>,
    Extension(Identity(actor_id)): Extension<Identity>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let paper = state
        .lifecycle
        .transition_paper_status(
            paper_id,
            actor_id,
            &body.status,
            body.comment,
            body.date,
            body.section_head_ids,
        )
        .await?;
    let paper = with_asset_urls(paper, &state.config.base_url);
    Ok(Json(json!({
        "message": "Paper status updated successfully",
        "paper": paper,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub status: String,
    pub comment: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// PUT /papers/{paper_id}/decision — section head accepts or rejects their
/// review assignment. The paper itself is untouched.
pub async fn review_decision_handler(
    State(state): State<AppState>,
    Path(paper_id): Path<EntityId>,
    Extension(Identity(section_head_id)): Extension<Identity>,
    Json(body): Json<DecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state
        .lifecycle
        .record_section_head_decision(paper_id, section_head_id, &body.status, body.comment, body.date)
        .await?;
    Ok(Json(json!({
        "message": "Review decision recorded successfully",
        "assignment": assignment,
    })))
}

//=========================================================================================
// Read views
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub status: Option<String>,
    pub id: Option<EntityId>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /papers/status — the editorial queue, filtered by the user-facing
/// status keyword (`accepted`, `submitted`, `rejected`, `assigned`).
pub async fn papers_by_status_handler(
    State(state): State<AppState>,
    Query(params): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .views
        .papers_by_status(
            params.status.as_deref(),
            params.id,
            page_of(params.offset, params.limit),
        )
        .await?;

    let base = &state.config.base_url;
    let view = PaperStatusPage {
        papers: view
            .papers
            .into_iter()
            .map(|mut p| {
                p.paper = with_asset_urls(p.paper, base);
                p
            })
            .collect(),
        pagination: view.pagination,
    };
    Ok(Json(view))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedQuery {
    pub section_head_id: Option<EntityId>,
    pub status: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /papers/assigned — a section head's queue. Zero assignments is a
/// valid empty response, not a 404.
pub async fn assigned_papers_handler(
    State(state): State<AppState>,
    Query(params): Query<AssignedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let section_head_id = params.section_head_id.ok_or_else(|| {
        WorkflowError::InvalidInput("sectionHeadId query parameter is required".into())
    })?;
    let queue = state
        .views
        .assigned_papers_for_section_head(
            section_head_id,
            params.status.as_deref(),
            page_of(params.offset, params.limit),
        )
        .await?;
    Ok(Json(queue))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorQuery {
    pub user_id: Option<EntityId>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub manu_script_title: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /papers/author — an author's own papers with optional search
/// filters against the owning user.
pub async fn author_papers_handler(
    State(state): State<AppState>,
    Query(params): Query<AuthorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .views
        .papers_for_author(
            AuthorPaperFilter {
                user_id: params.user_id,
                manu_script_title: params.manu_script_title,
                title: params.title,
                name: params.name,
            },
            page_of(params.offset, params.limit),
        )
        .await?;
    Ok(Json(hydrate_page(view, &state.config.base_url)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuery {
    pub id: Option<EntityId>,
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /papers — the public listing of published papers, split into
/// `archive` and `inPress` windows, or a point lookup when `id` is given.
pub async fn public_papers_handler(
    State(state): State<AppState>,
    Query(params): Query<PublicQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(id) = params.id {
        let paper = state.views.paper_by_id(id).await?;
        let paper = with_asset_urls(paper, &state.config.base_url);
        return Ok(Json(json!(paper)).into_response());
    }

    let view = state
        .views
        .public_papers(
            params.listing_type.as_deref(),
            page_of(params.offset, params.limit),
        )
        .await?;
    Ok(Json(json!(hydrate_page(view, &state.config.base_url))).into_response())
}

fn hydrate_page(view: PaperPage, base: &str) -> PaperPage {
    PaperPage {
        papers: view
            .papers
            .into_iter()
            .map(|p| with_asset_urls(p, base))
            .collect(),
        pagination: view.pagination,
    }
}
