//! services/api/src/web/users.rs
//!
//! Handlers for user profiles: public author registration, chief-editor
//! managed section head creation, and the paginated user listing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::web::middleware::Identity;
use crate::web::state::AppState;
use peer_review_core::domain::{EntityId, NewUser, Page, PageMeta, Role, User};
use peer_review_core::ports::WorkflowError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRequest {
    pub title: Option<String>,
    pub country: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub affiliation: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

impl UserProfileRequest {
    fn into_new_user(self, role: Role) -> Result<NewUser, WorkflowError> {
        if self.first_name.trim().is_empty() {
            return Err(WorkflowError::InvalidInput("firstName is required".into()));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(WorkflowError::InvalidInput(
                "a valid email address is required".into(),
            ));
        }
        Ok(NewUser {
            title: self.title,
            country: self.country,
            first_name: self.first_name,
            last_name: self.last_name,
            specialization: self.specialization,
            affiliation: self.affiliation,
            email: self.email,
            phone: self.phone,
            role,
        })
    }
}

/// POST /users — public author registration. The role is always `author`;
/// privileged roles are never client-assignable.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(body): Json<UserProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_user = body.into_new_user(Role::Author)?;
    let user = state.store.create_user(new_user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user": user })),
    ))
}

/// POST /users/section-heads — chief editor creates a section head profile.
pub async fn create_section_head_handler(
    State(state): State<AppState>,
    Extension(Identity(actor_id)): Extension<Identity>,
    Json(body): Json<UserProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = state
        .store
        .get_user(actor_id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound(format!("User {actor_id} not found")))?;
    if actor.role != Role::ChiefEditor {
        return Err(WorkflowError::Forbidden(
            "Only the chief editor can create section heads".into(),
        )
        .into());
    }

    let new_user = body.into_new_user(Role::SectionHead)?;
    let user = state.store.create_user(new_user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Section head created successfully", "user": user })),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub id: Option<EntityId>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: PageMeta,
}

/// GET /users — a single profile by id, or the paginated listing.
pub async fn get_users_handler(
    State(state): State<AppState>,
    Query(params): Query<UsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(id) = params.id {
        let user = state
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("User {id} not found")))?;
        return Ok(Json(json!(user)).into_response());
    }

    let page = Page::new(params.offset.unwrap_or(0), params.limit.unwrap_or(10));
    let (users, total) = state.store.list_users(page).await?;
    let response = UserListResponse {
        users,
        pagination: PageMeta::new(total, page),
    };
    Ok(Json(json!(response)).into_response())
}
