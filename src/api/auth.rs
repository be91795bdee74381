use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use serde_json::json;
use tower_cookies::Cookies;
use validator::Validate;

use crate::accounts::{create_account, ensure_user_profile};
use crate::entities::{account, Account};
use crate::error::AppError;
use crate::session::{end_session, start_session, SessionKey};

#[derive(serde::Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
    full_name: Option<String>,
}

pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?
        .to_string();

    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;
    let account = create_account(&txn, &payload.email, password_hash, now)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email already exists".to_string()),
            other => other,
        })?;
    let profile = ensure_user_profile(&txn, &account, payload.full_name.as_deref(), now).await?;
    txn.commit().await?;

    tracing::Span::current()
        .record("table", "accounts")
        .record("action", "register_account")
        .record("user_id", tracing::field::display(account.id))
        .record("business_event", "Account registered");
    crate::metrics::record_registration();

    Ok((
        StatusCode::CREATED,
        Json(json!({"id": account.id, "email": account.email, "full_name": profile.full_name})),
    ))
}

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(key): Extension<SessionKey>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = Account::find()
        .filter(account::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&db)
        .await?;

    let Some(account) = account.filter(|a| password_matches(&a.password_hash, &payload.password))
    else {
        tracing::Span::current()
            .record("table", "accounts")
            .record("action", "login_failed")
            .record("error", "invalid_credentials");
        return Err(AppError::Unauthorized);
    };

    let profile = ensure_user_profile(&db, &account, None, chrono::Utc::now().naive_utc()).await?;
    start_session(&cookies, &key, account.id);

    tracing::Span::current()
        .record("table", "accounts")
        .record("action", "login")
        .record("user_id", tracing::field::display(account.id))
        .record("business_event", "Account logged in");

    Ok((
        StatusCode::OK,
        Json(json!({"id": account.id, "email": account.email, "full_name": profile.full_name})),
    ))
}

pub async fn logout(
    Extension(key): Extension<SessionKey>,
    cookies: Cookies,
) -> impl IntoResponse {
    end_session(&cookies, &key);
    (StatusCode::OK, Json(json!({"message": "Signed out"})))
}

fn password_matches(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Invalid password hash in DB: {}", e);
            false
        }
    }
}
