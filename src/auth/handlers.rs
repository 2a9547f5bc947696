use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PictureResponse, ProfileUpdateRequest, PublicUser,
            RefreshRequest, RegisterRequest,
        },
        services::{hash_password, is_valid_email, verify_password, AuthUser, JwtKeys},
    },
    state::AppState,
    users::{
        dto::UserOut,
        repo::{self, User, UserRole},
    },
};

const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;
const PICTURE_URL_TTL_SECS: u64 = 30 * 60;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(get_me))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/profile", put(update_profile))
        .route(
            "/auth/profile/picture",
            post(upload_picture)
                .get(get_picture)
                .delete(delete_picture),
        )
        .layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES + 1024 * 1024))
}

fn public_user(u: &User) -> PublicUser {
    PublicUser {
        id: u.id,
        email: u.email.clone(),
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        role: u.role,
    }
}

fn token_pair(
    keys: &JwtKeys,
    user: &User,
) -> Result<(String, String), (StatusCode, String)> {
    let access = keys.sign_access(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh = keys.sign_refresh(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    if let Ok(Some(_)) = repo::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    // Console registration creates admin accounts.
    let user = match repo::create(
        &state.db,
        &payload.email,
        &hash,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        UserRole::Admin,
    )
    .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, &user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: public_user(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let user = match repo::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, &user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: public_user(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("{}", e)))?;

    // Re-read the user so a role change invalidates stale refresh claims.
    let user = repo::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let (access_token, refresh_token) = token_pair(&keys, &user)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: public_user(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserOut>, (StatusCode, String)> {
    let user = repo::update_profile(
        &state.db,
        user_id,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
        payload.birthdate,
        payload.gender.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "update_profile failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?
    .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, mp))]
pub async fn upload_picture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<PictureResponse>, (StatusCode, String)> {
    let mut file: Option<(Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            file = Some((data, content_type));
        }
    }
    let (data, content_type) =
        file.ok_or((StatusCode::BAD_REQUEST, "file field is required".to_string()))?;

    let ext = ext_from_mime(&content_type).ok_or((
        StatusCode::BAD_REQUEST,
        format!("Invalid file type '{content_type}'. Allowed: jpeg, png, gif, webp"),
    ))?;
    if data.len() > MAX_PICTURE_BYTES {
        return Err((StatusCode::BAD_REQUEST, "File size exceeds 5MB limit".into()));
    }

    let user = repo::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let key = format!("profiles/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    state
        .storage
        .put_object(&key, data, &content_type)
        .await
        .map_err(|e| {
            error!(error = %e, key, "profile picture upload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to upload image".to_string(),
            )
        })?;

    // Replace, then drop the old object; a leftover object is only logged.
    if let Some(old_key) = &user.profile_pic {
        if let Err(e) = state.storage.delete_object(old_key).await {
            warn!(error = %e, key = old_key, "failed to delete old profile picture");
        }
    }

    repo::set_profile_pic(&state.db, user_id, Some(&key))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let url = state
        .storage
        .presign_get(&key, PICTURE_URL_TTL_SECS)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user_id, key, "profile picture uploaded");
    Ok(Json(PictureResponse {
        profile_pic: key,
        url,
    }))
}

/// 302 → presigned URL of the caller's picture.
#[instrument(skip(state))]
pub async fn get_picture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let key = user
        .profile_pic
        .ok_or((StatusCode::NOT_FOUND, "No profile picture".to_string()))?;

    let url = state
        .storage
        .presign_get(&key, PICTURE_URL_TTL_SECS)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state))]
pub async fn delete_picture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let key = user
        .profile_pic
        .ok_or((StatusCode::NOT_FOUND, "No profile picture".to_string()))?;

    if let Err(e) = state.storage.delete_object(&key).await {
        warn!(error = %e, key, "failed to delete profile picture object");
    }

    repo::set_profile_pic(&state.db, user_id, None)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(user_id = %user_id, "profile picture deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("image/svg+xml"), None);
    }

    #[test]
    fn auth_response_serializes_public_user() {
        let response = AuthResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "test@example.com".into(),
                first_name: None,
                last_name: None,
                role: UserRole::Admin,
            },
        };
        let json: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["email"], "test@example.com");
        assert_eq!(json["user"]["role"], "admin");
        assert!(json["user"]["first_name"].is_null());
    }
}
