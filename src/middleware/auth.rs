use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims, error::AppError, models::UserRole, services::user_service,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Admin)
}

/// Admins and editors.
pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;
    let role = decoded
        .claims
        .role
        .parse::<UserRole>()
        .map_err(AppError::BadRequest)?;

    Ok(AuthUser { user_id, role })
}

/// Decodes the token and checks it against the stored account.
///
/// Deactivated, deleted or re-roled accounts lose access immediately rather
/// than when their token expires.
pub async fn authorize(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claimed = decode_token(token, &state.config.jwt_secret)?;
    let user = match user_service::get_user(state, claimed.user_id).await {
        Ok(user) => user,
        Err(AppError::NotFound) => return Err(AppError::Unauthorized),
        Err(err) => return Err(err),
    };
    if !user.is_active {
        tracing::debug!(user_id = %user.id, "token for inactive account rejected");
        return Err(AppError::Unauthorized);
    }
    if user.role != claimed.role {
        tracing::debug!(user_id = %user.id, "token role no longer matches account");
        return Err(AppError::Unauthorized);
    }
    Ok(claimed)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let state = AppState::from_ref(state);
        authorize(&state, token).await
    }
}

/// Bearer user when a valid token is sent, `None` for guests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        AuthUser::from_request_parts(parts, state)
            .await
            .map(|user| MaybeAuthUser(Some(user)))
    }
}
