use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
};
use yapee_store::{
    config::AppConfig,
    dto::auth::{LoginRequest, RegisterRequest},
    error::AppError,
    middleware::auth::AuthUser,
    models::UserRole,
    routes::auth::me,
    services::{auth_service, user_service},
    state::AppState,
};

fn state() -> AppState {
    AppState::in_memory(AppConfig::with_secrets("test-storage", "test-jwt"))
}

fn bearer(token: &str) -> Parts {
    Request::builder()
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(())
        .unwrap()
        .into_parts()
        .0
}

async fn extract(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    AuthUser::from_request_parts(&mut bearer(token), state).await
}

async fn sign_up(state: &AppState, email: &str) -> anyhow::Result<String> {
    auth_service::register(
        state,
        RegisterRequest {
            email: email.into(),
            password: "secret123".into(),
            first_name: "Linh".into(),
            last_name: "Pham".into(),
            phone: None,
        },
    )
    .await?;
    let login = auth_service::login(
        state,
        LoginRequest {
            email: email.into(),
            password: "secret123".into(),
        },
    )
    .await?;
    Ok(login.token)
}

#[tokio::test]
async fn deactivated_users_lose_access_with_a_valid_token() -> anyhow::Result<()> {
    let state = state();
    let token = sign_up(&state, "linh@example.com").await?;

    let user = extract(&state, &token).await?;
    let profile = me(State(state.clone()), user.clone()).await?;
    assert_eq!(profile.0.data.as_ref().map(|u| u.id), Some(user.user_id));

    user_service::set_active(&state, user.user_id, false).await?;
    assert!(matches!(
        extract(&state, &token).await,
        Err(AppError::Unauthorized)
    ));

    user_service::set_active(&state, user.user_id, true).await?;
    assert!(extract(&state, &token).await.is_ok());

    user_service::delete_user(&state, user.user_id).await?;
    assert!(matches!(
        extract(&state, &token).await,
        Err(AppError::Unauthorized)
    ));
    Ok(())
}

#[tokio::test]
async fn tokens_carrying_a_stale_role_are_refused() -> anyhow::Result<()> {
    let state = state();
    let token = sign_up(&state, "an@example.com").await?;
    let user = extract(&state, &token).await?;
    assert_eq!(user.role, UserRole::Customer);

    user_service::update_role(&state, user.user_id, UserRole::Editor).await?;
    assert!(matches!(
        extract(&state, &token).await,
        Err(AppError::Unauthorized)
    ));

    let fresh = auth_service::login(
        &state,
        LoginRequest {
            email: "an@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await?;
    let promoted = extract(&state, &fresh.token).await?;
    assert_eq!(promoted.role, UserRole::Editor);
    Ok(())
}

#[tokio::test]
async fn missing_or_garbled_tokens_are_unauthorized() {
    let state = state();
    let mut bare = Request::builder().body(()).unwrap().into_parts().0;
    assert!(matches!(
        AuthUser::from_request_parts(&mut bare, &state).await,
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(
        extract(&state, "not-a-jwt").await,
        Err(AppError::Unauthorized)
    ));
}
