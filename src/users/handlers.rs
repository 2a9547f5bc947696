use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{auth::services::AdminUser, state::AppState};

use super::dto::{
    BulkOutcome, BulkStatusRequest, BulkStatusResponse, DeactivateRequest, ListQuery, RoleParams,
    StatsResponse, StatusParams, SweepResponse, UserOut,
};
use super::lifecycle::{self, DeactivationPlan, DeactivationType, LifecycleError};
use super::repo::{self, UserRole, UserStatus};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/stats/count", get(user_stats))
        .route("/users/auto-reactivate", post(auto_reactivate))
        .route("/users/bulk/status", put(bulk_update_status))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/status", put(update_status))
        .route("/users/:id/role", put(update_role))
        .route("/users/:id/deactivate", put(deactivate_user))
        .route("/users/:id/activate", put(activate_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<UserOut>>, (StatusCode, String)> {
    let role = match q.role.as_deref() {
        None => None,
        Some(r) => Some(r.parse::<UserRole>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid role filter '{r}'"),
            )
        })?),
    };
    let status = match q.status.as_deref() {
        None => None,
        Some(s) => Some(s.parse::<UserStatus>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid status filter '{s}'"),
            )
        })?),
    };

    let users = repo::list(&state.db, role, status, q.skip.max(0), q.limit.clamp(1, 1000))
        .await
        .map_err(internal)?;
    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn user_stats(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let counts = repo::count_stats(&state.db).await.map_err(internal)?;
    Ok(Json(counts.into()))
}

#[instrument(skip(state, payload))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeactivateRequest>,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let plan = lifecycle::plan_deactivation(
        &payload.deactivation_type,
        payload.duration.as_deref(),
        payload.deactivation_reason.as_deref(),
        OffsetDateTime::now_utc(),
    )
    .map_err(lifecycle_error)?;

    let user = lifecycle::deactivate(&state.db, id, &plan)
        .await
        .map_err(lifecycle_error)?;
    info!(
        user_id = %id,
        deactivation_type = plan.deactivation_type.as_str(),
        "user deactivated"
    );
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn activate_user(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let user = lifecycle::activate(&state.db, id)
        .await
        .map_err(lifecycle_error)?;
    info!(user_id = %id, "user activated");
    Ok(Json(user.into()))
}

/// Manual trigger for the background sweep.
#[instrument(skip(state))]
pub async fn auto_reactivate(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<SweepResponse>, (StatusCode, String)> {
    let reactivated_count = lifecycle::sweep(&state.db, OffsetDateTime::now_utc())
        .await
        .map_err(lifecycle_error)?;
    info!(reactivated_count, "manual sweep");
    Ok(Json(SweepResponse { reactivated_count }))
}

/// Legacy status toggle. `inactive` maps to a permanent deactivation so the
/// status/type invariant holds; `active` is a plain activate.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Query(params): Query<StatusParams>,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let user = match params.status.as_str() {
        "active" => lifecycle::activate(&state.db, id).await,
        "inactive" => {
            let plan = DeactivationPlan {
                deactivation_type: DeactivationType::Permanent,
                reason: params.deactivation_reason.clone(),
                end_date: None,
            };
            lifecycle::deactivate(&state.db, id, &plan).await
        }
        other => {
            warn!(status = other, "invalid status value");
            return Err((
                StatusCode::BAD_REQUEST,
                "Status must be either 'active' or 'inactive'".into(),
            ));
        }
    }
    .map_err(lifecycle_error)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Query(params): Query<RoleParams>,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let role: UserRole = params.role.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Role must be either 'admin' or 'user'".to_string(),
        )
    })?;
    let user = repo::set_role(&state.db, id, role)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    info!(user_id = %id, role = role.as_str(), "role updated");
    Ok(Json(user.into()))
}

/// Applies the same status change to each id independently. A missing id is
/// reported as `updated = false`, never as an error.
#[instrument(skip(state, payload))]
pub async fn bulk_update_status(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Json(payload): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, (StatusCode, String)> {
    let status = match payload.status.as_str() {
        "active" => UserStatus::Active,
        "inactive" => UserStatus::Inactive,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Status must be either 'active' or 'inactive'".into(),
            ))
        }
    };

    let plan = DeactivationPlan {
        deactivation_type: DeactivationType::Permanent,
        reason: payload.deactivation_reason.clone(),
        end_date: None,
    };

    let mut results = Vec::with_capacity(payload.user_ids.len());
    let mut modified_count = 0u64;
    for id in payload.user_ids {
        let outcome = match status {
            UserStatus::Active => lifecycle::activate(&state.db, id).await,
            UserStatus::Inactive => lifecycle::deactivate(&state.db, id, &plan).await,
        };
        let updated = match outcome {
            Ok(_) => true,
            Err(LifecycleError::NotFound) => false,
            Err(e) => return Err(lifecycle_error(e)),
        };
        if updated {
            modified_count += 1;
        }
        results.push(BulkOutcome { id, updated });
    }

    info!(modified_count, status = status.as_str(), "bulk status update");
    Ok(Json(BulkStatusResponse {
        modified_count,
        status,
        results,
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    // Best effort: the row is the source of truth, a leaked object is not.
    if let Some(key) = &user.profile_pic {
        if let Err(e) = state.storage.delete_object(key).await {
            warn!(error = %e, key, "failed to delete profile picture object");
        }
    }

    repo::delete(&state.db, id).await.map_err(internal)?;
    info!(user_id = %id, "user deleted");
    Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
}

fn lifecycle_error(e: LifecycleError) -> (StatusCode, String) {
    match e {
        LifecycleError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
        LifecycleError::NotFound => (StatusCode::NOT_FOUND, "User not found".into()),
        LifecycleError::Store(e) => {
            error!(error = %e, "store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        }
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_stable_statuses() {
        let (code, msg) =
            lifecycle_error(LifecycleError::InvalidArgument("bad duration".into()));
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "bad duration");

        let (code, msg) = lifecycle_error(LifecycleError::NotFound);
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(msg, "User not found");

        let (code, _) = lifecycle_error(LifecycleError::Store(sqlx::Error::PoolTimedOut));
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
