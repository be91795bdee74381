use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use serde_json::json;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::accounts::ensure_user_profile;
use crate::entities::{user_profile, Account};
use crate::error::AppError;
use crate::session::{self, context_from_cookies, Portal, RequestContext, Screen, SessionKey};

#[derive(Serialize)]
pub struct SessionResponse {
    pub screen: Screen,
    pub account_id: Option<Uuid>,
    pub portal: Option<Portal>,
    pub profile: Option<user_profile::Model>,
}

/// Bootstrap call made by the client on load.
pub async fn get_session(
    Extension(db): Extension<DatabaseConnection>,
    Extension(key): Extension<SessionKey>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let context = context_from_cookies(&cookies, &key);

    // A cookie for a deleted account counts as signed out
    let account = match context {
        Some(ctx) => Account::find_by_id(ctx.account_id).one(&db).await?,
        None => None,
    };

    let response = match (context, account) {
        (Some(ctx), Some(account)) => {
            let profile =
                ensure_user_profile(&db, &account, None, chrono::Utc::now().naive_utc()).await?;
            SessionResponse {
                screen: ctx.screen(),
                account_id: Some(account.id),
                portal: ctx.portal,
                profile: Some(profile),
            }
        }
        _ => SessionResponse {
            screen: Screen::resolve(false, None),
            account_id: None,
            portal: None,
            profile: None,
        },
    };

    Ok((StatusCode::OK, Json(response)))
}

#[derive(serde::Deserialize)]
pub struct ChoosePortalRequest {
    portal: Portal,
}

pub async fn choose_portal(
    Extension(key): Extension<SessionKey>,
    Extension(ctx): Extension<RequestContext>,
    cookies: Cookies,
    Json(payload): Json<ChoosePortalRequest>,
) -> impl IntoResponse {
    session::choose_portal(&cookies, &key, payload.portal);

    tracing::Span::current()
        .record("action", "choose_portal")
        .record("business_event", payload.portal.as_str());

    let screen = Screen::resolve(true, Some(payload.portal));
    (
        StatusCode::OK,
        Json(json!({"account_id": ctx.account_id, "portal": payload.portal, "screen": screen})),
    )
}
