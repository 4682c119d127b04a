//! Member directory API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::db::{
    self, CreateMemberRequest, Member, MemberListQuery, MemberListResponse, MemberStats,
    UpdateMemberRequest,
};
use crate::AppState;

use super::error::ApiError;
use super::validation::{validate_cid, validate_member_name, validate_phone, validate_recommender};

/// Validate the member fields shared by create and update requests
fn validate_member_fields(
    name: &str,
    phone: &str,
    cid: &str,
    recommender: Option<&str>,
) -> Result<(), ApiError> {
    validate_member_name(name).map_err(ApiError::validation)?;
    validate_phone(phone).map_err(ApiError::validation)?;
    validate_cid(cid).map_err(ApiError::validation)?;
    validate_recommender(recommender).map_err(ApiError::validation)?;
    Ok(())
}

/// List members with optional search and pagination
///
/// GET /api/members?search=&page=
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MemberListQuery>,
) -> Result<Json<MemberListResponse>, ApiError> {
    let result = db::list_members(&state.db, &query).await?;
    Ok(Json(result))
}

/// Create a new member
///
/// POST /api/members
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    validate_member_fields(&req.name, &req.phone, &req.cid, req.recommender.as_deref())?;

    let member = db::create_member(&state.db, &req).await?;

    info!(member_id = member.id, "Member created via API");

    Ok((StatusCode::CREATED, Json(member)))
}

/// Get a specific member
///
/// GET /api/members/:id
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Member>, ApiError> {
    let member = db::get_member(&state.db, id).await?;
    Ok(Json(member))
}

/// Update a member
///
/// PUT /api/members/:id
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<Member>, ApiError> {
    validate_member_fields(&req.name, &req.phone, &req.cid, req.recommender.as_deref())?;

    let member = db::update_member(&state.db, id, &req).await?;

    info!(member_id = id, "Member updated via API");

    Ok(Json(member))
}

/// Delete a member
///
/// DELETE /api/members/:id
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db::delete_member(&state.db, id).await?;

    info!(member_id = id, "Member deleted via API");

    Ok(StatusCode::NO_CONTENT)
}

/// Aggregate counts and dues total for the dashboard
///
/// GET /api/members/stats
pub async fn member_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MemberStats>, ApiError> {
    let stats = db::member_stats(&state.db).await?;
    Ok(Json(stats))
}
