use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    models::User,
    services::user_service,
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 24;

pub fn issue_token(user: &User, secret: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<User> {
    let user = user_service::register_user(state, payload).await?;
    audit::record(
        state,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    Ok(user)
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<LoginResponse> {
    let LoginRequest { email, password } = payload;
    let user = user_service::authenticate(state, &email, &password).await?;
    let token = issue_token(&user, &state.config.jwt_secret)?;

    audit::record(
        state,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(LoginResponse { token, user })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        middleware::auth::decode_token,
        models::{Preferences, UserRole},
    };

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "ed@example.com".into(),
            first_name: "Ed".into(),
            last_name: "Itor".into(),
            phone: None,
            role: UserRole::Editor,
            avatar: None,
            is_active: true,
            is_email_verified: false,
            preferences: Preferences::default(),
            addresses: Vec::new(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let token = issue_token(&user, "secret").unwrap();
        let decoded = decode_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, user.id);
        assert_eq!(decoded.role, UserRole::Editor);
        assert!(decode_token(&token, "other").is_err());
    }
}
