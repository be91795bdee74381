use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::{account, user_profile, UserProfile};

pub async fn create_account<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password_hash: String,
    now: NaiveDateTime,
) -> Result<account::Model, DbErr> {
    account::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.trim().to_lowercase()),
        password_hash: Set(password_hash),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

/// Returns the account's profile, creating it on first sight.
pub async fn ensure_user_profile<C: ConnectionTrait>(
    db: &C,
    account: &account::Model,
    name: Option<&str>,
    now: NaiveDateTime,
) -> Result<user_profile::Model, DbErr> {
    if let Some(existing) = UserProfile::find_by_id(account.id).one(db).await? {
        return Ok(existing);
    }

    let profile = user_profile::ActiveModel {
        id: Set(account.id),
        full_name: Set(default_full_name(name, &account.email)),
        phone: Set(None),
        notification_enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = %profile.id, "Created user profile");
    Ok(profile)
}

/// Supplied name, else the e-mail local part, else "User".
pub fn default_full_name(name: Option<&str>, email: &str) -> String {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match email.split('@').next().map(str::trim) {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => "User".to_string(),
    }
}
