// libs/membership-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, User};
use shared_models::error::AppError;

use crate::models::{MembershipError, MembershipListQuery, PurchaseMembershipRequest};
use crate::services::MembershipService;

pub fn map_membership_error(e: MembershipError) -> AppError {
    match e {
        MembershipError::ValidationError(msg) => AppError::ValidationError(msg),
        MembershipError::DuplicateMembership => AppError::Conflict(e.to_string()),
        MembershipError::NotFound => AppError::NotFound(e.to_string()),
        MembershipError::Unauthorized(msg) => AppError::Forbidden(msg),
        MembershipError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
        MembershipError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn purchase_membership(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<PurchaseMembershipRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = MembershipService::new(&state);

    let membership = service.purchase_membership(&ctx, request).await
        .map_err(map_membership_error)?;

    Ok(Json(json!({
        "success": true,
        "membership": membership,
        "message": "Membership request submitted and awaiting approval"
    })))
}

#[axum::debug_handler]
pub async fn get_current_membership(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = MembershipService::new(&state);

    let membership = service.current_membership(&ctx).await
        .map_err(map_membership_error)?;

    Ok(Json(json!({
        "success": true,
        "membership": membership
    })))
}

#[axum::debug_handler]
pub async fn cancel_membership(
    State(state): State<Arc<AppConfig>>,
    Path(membership_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = MembershipService::new(&state);

    let membership = service.cancel_membership(&ctx, membership_id).await
        .map_err(map_membership_error)?;

    Ok(Json(json!({
        "success": true,
        "membership": membership,
        "message": "Membership cancelled"
    })))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_memberships(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<MembershipListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = MembershipService::new(&state);

    let memberships = service.list_memberships(&ctx, query.status, query.limit).await
        .map_err(map_membership_error)?;

    Ok(Json(json!({
        "success": true,
        "total": memberships.len(),
        "memberships": memberships
    })))
}

#[axum::debug_handler]
pub async fn approve_membership(
    State(state): State<Arc<AppConfig>>,
    Path(membership_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = MembershipService::new(&state);

    let membership = service.approve_membership(&ctx, membership_id).await
        .map_err(map_membership_error)?;

    Ok(Json(json!({
        "success": true,
        "membership": membership,
        "message": "Membership approved"
    })))
}

#[axum::debug_handler]
pub async fn reject_membership(
    State(state): State<Arc<AppConfig>>,
    Path(membership_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = MembershipService::new(&state);

    let membership = service.reject_membership(&ctx, membership_id).await
        .map_err(map_membership_error)?;

    Ok(Json(json!({
        "success": true,
        "membership": membership,
        "message": "Membership rejected"
    })))
}
