//! Request handlers for the user resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::store::{SharedStore, UserFilter};
use crate::validation::{self, RawListQuery};

/// GET /api - list users, optionally filtered by minimum GPA, exact
/// position, and years of experience.
pub async fn list_users(
    State(store): State<SharedStore>,
    Query(raw): Query<RawListQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let query = validation::validate_list_query(&raw)
        .map_err(|errors| ApiError::validation("Invalid query parameters", errors))?;

    let filter = UserFilter {
        min_gpa: query.gpa,
        position: query.position,
        experience: query.experience,
    };

    let users = store.find(&filter).await?;
    if users.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Fetched users successfully", "users": users })),
    ))
}

/// POST /api - create a user after validating the payload and checking
/// that the email is not already taken.
pub async fn create_user(
    State(store): State<SharedStore>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let data = validation::validate_new_user(&body)
        .map_err(|errors| ApiError::validation("Validation failed", errors))?;

    // Fast-path check; the store's unique index is the authoritative
    // guard and surfaces the same conflict on a concurrent insert.
    if store.find_by_email(&data.email).await?.is_some() {
        return Err(ApiError::conflict(
            "Email is already in use. Please choose another.",
        ));
    }

    let user = store.insert(data).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user": user })),
    ))
}

/// PATCH /api/:id - apply the validated, present fields to an existing
/// user; everything else stays as stored.
pub async fn update_user(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let patch = validation::validate_user_patch(&body)
        .map_err(|errors| ApiError::validation("Validation failed", errors))?;

    // An id that does not parse cannot name a stored record.
    let id = ObjectId::parse_str(&id).map_err(|_| ApiError::not_found("User not found"))?;

    if store.find_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let user = store
        .update_by_id(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User updated successfully", "user": user })),
    ))
}

/// DELETE /api/:id - remove an existing user.
pub async fn delete_user(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id =
        ObjectId::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid user ID format"))?;

    if store.find_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    store.delete_by_id(id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted successfully" })),
    ))
}
