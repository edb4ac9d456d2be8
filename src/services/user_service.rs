use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use password_hash::rand_core::OsRng;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    dto::{
        auth::RegisterRequest,
        users::{AddressRequest, UpdateAddressRequest, UpdateProfileRequest, UserStats},
    },
    error::{AppError, AppResult, FieldErrors},
    models::{Address, Preferences, User, UserRecord, UserRole},
    query::Table,
    response::Page,
    routes::params::{Paged, UserListQuery},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;
const RECENT_LIMIT: usize = 10;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

pub async fn find_record_by_email(state: &AppState, email: &str) -> AppResult<Option<UserRecord>> {
    Ok(state
        .db
        .fetch_optional(
            "SELECT * FROM users WHERE email = ?",
            &[json!(normalize_email(email))],
        )
        .await?)
}

async fn get_record(state: &AppState, id: Uuid) -> AppResult<UserRecord> {
    state
        .db
        .fetch_optional::<UserRecord>("SELECT * FROM users WHERE id = ?", &[json!(id)])
        .await?
        .ok_or(AppError::NotFound)
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_email_verified: bool,
}

pub async fn create_user(state: &AppState, new_user: NewUser<'_>) -> AppResult<User> {
    let email = normalize_email(new_user.email);
    let mut errors = FieldErrors::new();
    if !is_valid_email(&email) {
        errors.insert("email".into(), "Email is invalid".into());
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password".into(),
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if new_user.first_name.trim().is_empty() {
        errors.insert("first_name".into(), "First name is required".into());
    }
    if new_user.last_name.trim().is_empty() {
        errors.insert("last_name".into(), "Last name is required".into());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if find_record_by_email(state, &email).await?.is_some() {
        return Err(AppError::Conflict("User with this email already exists".into()));
    }

    let now = Utc::now();
    let record = UserRecord {
        user: User {
            id: Uuid::new_v4(),
            email,
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            phone: new_user.phone,
            role: new_user.role,
            avatar: None,
            is_active: true,
            is_email_verified: new_user.is_email_verified,
            preferences: Preferences::default(),
            addresses: Vec::new(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        },
        password_hash: hash_password(new_user.password)?,
    };
    let record = state.db.insert(Table::Users, &record).await?;
    tracing::info!(user_id = %record.user.id, role = %record.user.role, "user created");
    Ok(record.user)
}

pub async fn register_user(state: &AppState, payload: RegisterRequest) -> AppResult<User> {
    create_user(
        state,
        NewUser {
            email: &payload.email,
            password: &payload.password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            phone: payload.phone,
            role: UserRole::Customer,
            is_email_verified: false,
        },
    )
    .await
}

/// Verifies credentials and stamps the login time.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::BadRequest("Invalid email or password".into());
    let record = find_record_by_email(state, email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &record.password_hash) {
        return Err(invalid());
    }
    if !record.user.is_active {
        return Err(AppError::Forbidden);
    }

    let mut patch = Map::new();
    patch.insert("last_login_at".into(), json!(Utc::now()));
    write_patch(state, record.user.id, patch).await
}

async fn write_patch(state: &AppState, id: Uuid, patch: Map<String, Value>) -> AppResult<User> {
    state
        .db
        .update::<UserRecord>(Table::Users, &id.to_string(), &patch)
        .await?
        .map(|record| record.user)
        .ok_or(AppError::NotFound)
}

pub async fn all_users(state: &AppState) -> AppResult<Vec<User>> {
    let records: Vec<UserRecord> = state
        .db
        .fetch_all("SELECT * FROM users ORDER BY created_at DESC", &[])
        .await?;
    Ok(records.into_iter().map(|record| record.user).collect())
}

pub async fn get_user(state: &AppState, id: Uuid) -> AppResult<User> {
    Ok(get_record(state, id).await?.user)
}

pub async fn get_user_by_email(state: &AppState, email: &str) -> AppResult<User> {
    find_record_by_email(state, email)
        .await?
        .map(|record| record.user)
        .ok_or(AppError::NotFound)
}

pub async fn update_profile(
    state: &AppState,
    id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<User> {
    get_record(state, id).await?;
    let mut errors = FieldErrors::new();
    if payload.first_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
        errors.insert("first_name".into(), "First name is required".into());
    }
    if payload.last_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
        errors.insert("last_name".into(), "Last name is required".into());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let patch = match serde_json::to_value(&payload).map_err(anyhow::Error::from)? {
        Value::Object(patch) => patch,
        _ => Map::new(),
    };
    write_patch(state, id, patch).await
}

pub async fn change_password(
    state: &AppState,
    id: Uuid,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let record = get_record(state, id).await?;
    if !verify_password(current_password, &record.password_hash) {
        return Err(AppError::validation("current_password", "Current password is incorrect"));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "new_password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    let mut patch = Map::new();
    patch.insert("password_hash".into(), json!(hash_password(new_password)?));
    write_patch(state, id, patch).await?;
    tracing::info!(user_id = %id, "password changed");
    Ok(())
}

pub async fn set_active(state: &AppState, id: Uuid, active: bool) -> AppResult<User> {
    get_record(state, id).await?;
    let mut patch = Map::new();
    patch.insert("is_active".into(), json!(active));
    write_patch(state, id, patch).await
}

pub async fn verify_email(state: &AppState, id: Uuid) -> AppResult<User> {
    get_record(state, id).await?;
    let mut patch = Map::new();
    patch.insert("is_email_verified".into(), json!(true));
    write_patch(state, id, patch).await
}

/// Soft delete.
pub async fn delete_user(state: &AppState, id: Uuid) -> AppResult<User> {
    set_active(state, id, false).await
}

pub async fn users_by_role(state: &AppState, role: UserRole) -> AppResult<Vec<User>> {
    let records: Vec<UserRecord> = state
        .db
        .fetch_all(
            "SELECT * FROM users WHERE role = ? ORDER BY created_at DESC",
            &[json!(role)],
        )
        .await?;
    Ok(records.into_iter().map(|record| record.user).collect())
}

pub fn matches_search(user: &User, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        Some(user.first_name.as_str()),
        Some(user.last_name.as_str()),
        Some(user.email.as_str()),
        user.phone.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|text| text.to_lowercase().contains(&needle))
}

pub async fn search_users(state: &AppState, query: &str) -> AppResult<Vec<User>> {
    let query = query.trim();
    Ok(all_users(state)
        .await?
        .into_iter()
        .filter(|user| matches_search(user, query))
        .collect())
}

pub async fn list_users(state: &AppState, query: UserListQuery) -> AppResult<Page<User>> {
    let (page, per_page, _) = query.pagination().normalize();
    let users = match query.role {
        Some(role) => users_by_role(state, role).await?,
        None => all_users(state).await?,
    };
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let users = users
        .into_iter()
        .filter(|user| search.is_none_or(|q| matches_search(user, q)))
        .collect();
    Ok(Page::from_vec(users, page, per_page))
}

pub async fn recent_users(state: &AppState, limit: Option<usize>) -> AppResult<Vec<User>> {
    let mut users = all_users(state).await?;
    users.truncate(limit.unwrap_or(RECENT_LIMIT));
    Ok(users)
}

pub async fn update_role(state: &AppState, id: Uuid, role: UserRole) -> AppResult<User> {
    get_record(state, id).await?;
    let mut patch = Map::new();
    patch.insert("role".into(), json!(role));
    let user = write_patch(state, id, patch).await?;
    tracing::info!(user_id = %id, role = %role, "user role changed");
    Ok(user)
}

fn validate_address(address: &AddressRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    for (field, value) in [
        ("full_name", &address.full_name),
        ("address", &address.address),
        ("city", &address.city),
        ("postal_code", &address.postal_code),
        ("country", &address.country),
    ] {
        if value.trim().is_empty() {
            errors.insert(field.into(), "This field is required".into());
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn save_addresses(state: &AppState, id: Uuid, addresses: &[Address]) -> AppResult<User> {
    let mut patch = Map::new();
    patch.insert("addresses".into(), json!(addresses));
    write_patch(state, id, patch).await
}

/// The first address, or one flagged default, becomes the only default.
pub async fn add_address(state: &AppState, id: Uuid, payload: AddressRequest) -> AppResult<User> {
    validate_address(&payload)?;
    let mut addresses = get_user(state, id).await?.addresses;
    let is_default = addresses.is_empty() || payload.is_default;
    if is_default {
        addresses.iter_mut().for_each(|address| address.is_default = false);
    }
    addresses.push(Address {
        id: Uuid::new_v4(),
        kind: payload.kind,
        full_name: payload.full_name,
        address: payload.address,
        city: payload.city,
        postal_code: payload.postal_code,
        country: payload.country,
        phone: payload.phone,
        is_default,
    });
    save_addresses(state, id, &addresses).await
}

pub async fn update_address(
    state: &AppState,
    id: Uuid,
    address_id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<User> {
    let mut addresses = get_user(state, id).await?.addresses;
    let index = addresses
        .iter()
        .position(|address| address.id == address_id)
        .ok_or(AppError::NotFound)?;

    if payload.is_default == Some(true) {
        addresses.iter_mut().for_each(|address| address.is_default = false);
    }
    let address = &mut addresses[index];
    if let Some(kind) = payload.kind {
        address.kind = kind;
    }
    if let Some(full_name) = payload.full_name {
        address.full_name = full_name;
    }
    if let Some(line) = payload.address {
        address.address = line;
    }
    if let Some(city) = payload.city {
        address.city = city;
    }
    if let Some(postal_code) = payload.postal_code {
        address.postal_code = postal_code;
    }
    if let Some(country) = payload.country {
        address.country = country;
    }
    if let Some(phone) = payload.phone {
        address.phone = Some(phone);
    }
    if let Some(is_default) = payload.is_default {
        address.is_default = is_default;
    }
    save_addresses(state, id, &addresses).await
}

pub async fn remove_address(state: &AppState, id: Uuid, address_id: Uuid) -> AppResult<User> {
    let mut addresses = get_user(state, id).await?.addresses;
    let before = addresses.len();
    addresses.retain(|address| address.id != address_id);
    if addresses.len() == before {
        return Err(AppError::NotFound);
    }
    save_addresses(state, id, &addresses).await
}

pub fn summarize(users: &[User]) -> UserStats {
    let cutoff = Utc::now() - Duration::days(30);
    let count = |pred: &dyn Fn(&User) -> bool| users.iter().filter(|u| pred(u)).count() as i64;
    UserStats {
        total: users.len() as i64,
        active: count(&|u| u.is_active),
        inactive: count(&|u| !u.is_active),
        verified: count(&|u| u.is_email_verified),
        unverified: count(&|u| !u.is_email_verified),
        customers: count(&|u| u.role == UserRole::Customer),
        editors: count(&|u| u.role == UserRole::Editor),
        admins: count(&|u| u.role == UserRole::Admin),
        recent_registrations: count(&|u| u.created_at >= cutoff),
    }
}

pub async fn user_stats(state: &AppState) -> AppResult<UserStats> {
    Ok(summarize(&all_users(state).await?))
}

/// Creates the configured admin account when it does not exist yet.
pub async fn ensure_default_admin(state: &AppState) -> AppResult<bool> {
    let email = state.config.admin_email.clone();
    if find_record_by_email(state, &email).await?.is_some() {
        return Ok(false);
    }
    create_user(
        state,
        NewUser {
            email: &email,
            password: &state.config.admin_password,
            first_name: "Admin",
            last_name: "User",
            phone: None,
            role: UserRole::Admin,
            is_email_verified: true,
        },
    )
    .await?;
    tracing::info!(email = %email, "default admin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_verify_against_their_hash_only() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ann@example.com"));
        assert!(!is_valid_email("ann.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ann@example"));
    }
}
