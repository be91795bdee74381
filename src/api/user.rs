use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use validator::Validate;

use crate::entities::UserProfile;
use crate::error::AppError;
use crate::session::RequestContext;

#[derive(serde::Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    full_name: Option<String>,
    /// An empty string clears the number.
    phone: Option<String>,
    notification_enabled: Option<bool>,
}

pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let profile = UserProfile::find_by_id(ctx.account_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    Ok((StatusCode::OK, Json(profile)))
}

pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let profile = UserProfile::find_by_id(ctx.account_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    let mut active = profile.into_active_model();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        let phone = phone.trim().to_string();
        active.phone = Set((!phone.is_empty()).then_some(phone));
    }
    if let Some(enabled) = payload.notification_enabled {
        active.notification_enabled = Set(enabled);
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let profile = active.update(&db).await?;

    tracing::Span::current()
        .record("table", "user_profiles")
        .record("action", "update_profile")
        .record("business_event", "Profile updated");

    Ok((StatusCode::OK, Json(profile)))
}
