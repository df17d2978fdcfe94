use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub is_staff: bool,
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or(AppError::Unauthorized)?;

        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| AppError::Unauthorized)?;

        let credentials = String::from_utf8(decoded).map_err(|_| AppError::Unauthorized)?;

        let (email, password) = credentials.split_once(':').ok_or(AppError::Unauthorized)?;

        let user = User::find_by_email(email, &state.db)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)?;

        if !user.verify_password(password) {
            return Err(AppError::Unauthorized);
        }

        // Best effort; the request should not fail on this.
        sqlx::query("UPDATE users SET last_logged_in = NOW() WHERE user_id = $1")
            .bind(user.user_id)
            .execute(&state.db.pool)
            .await
            .ok();

        Ok(AuthUser {
            user_id: user.user_id,
            email: user.email,
            is_staff: user.is_staff,
        })
    }
}

// Staff-gated variant for catalog writes.
#[derive(Debug, Clone)]
pub struct StaffUser(pub AuthUser);

impl FromRequestParts<Arc<crate::AppState>> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AppError::Forbidden("staff access required".to_string()));
        }
        Ok(StaffUser(user))
    }
}
