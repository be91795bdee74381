use axum::{
    body::Bytes,
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::analytics;
use crate::entities::{business, sea_orm_active_enums::BusinessType, Business};
use crate::error::AppError;
use crate::queue;
use crate::session::RequestContext;

const DEFAULT_CAPACITY: i32 = 100;
const DEFAULT_SERVICE_MINUTES: i32 = 15;

#[derive(serde::Deserialize, Validate)]
pub struct CreateBusinessRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[serde(rename = "type", default)]
    business_type: BusinessType,
    #[validate(length(min = 1, message = "description must not be empty"))]
    description: String,
    #[validate(length(min = 1, message = "address must not be empty"))]
    address: String,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    phone: String,
    #[validate(email)]
    email: String,
    #[validate(range(min = 1))]
    max_daily_capacity: Option<i32>,
    #[validate(range(min = 1))]
    avg_service_time: Option<i32>,
}

#[derive(serde::Deserialize, Validate)]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: Option<String>,
    #[serde(rename = "type")]
    business_type: Option<BusinessType>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    description: Option<String>,
    #[validate(length(min = 1, message = "address must not be empty"))]
    address: Option<String>,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    phone: Option<String>,
    #[validate(email)]
    email: Option<String>,
    #[validate(range(min = 1))]
    max_daily_capacity: Option<i32>,
    #[validate(range(min = 1))]
    avg_service_time: Option<i32>,
}

#[derive(serde::Deserialize, Default)]
pub struct RecordAnalyticsRequest {
    date: Option<NaiveDate>,
}

pub async fn list_businesses(
    Extension(db): Extension<DatabaseConnection>,
) -> Result<impl IntoResponse, AppError> {
    let businesses = Business::find()
        .order_by_asc(business::Column::Name)
        .all(&db)
        .await?;

    Ok((StatusCode::OK, Json(businesses)))
}

pub async fn get_business(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let business = Business::find_by_id(id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound("Business"))?;

    Ok((StatusCode::OK, Json(business)))
}

pub async fn create_business(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let now = chrono::Utc::now().naive_utc();
    let business = business::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        business_type: Set(payload.business_type),
        description: Set(payload.description),
        address: Set(payload.address),
        phone: Set(payload.phone),
        email: Set(payload.email),
        max_daily_capacity: Set(payload.max_daily_capacity.unwrap_or(DEFAULT_CAPACITY)),
        avg_service_time: Set(payload.avg_service_time.unwrap_or(DEFAULT_SERVICE_MINUTES)),
        owner_id: Set(ctx.account_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Account already owns a business".to_string()),
        other => other,
    })?;

    tracing::Span::current()
        .record("table", "businesses")
        .record("action", "create_business")
        .record("business_id", tracing::field::display(business.id))
        .record("business_event", "Business registered");
    crate::metrics::record_business_created();

    Ok((StatusCode::CREATED, Json(business)))
}

pub async fn get_my_business(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let business = require_my_business(&db, &ctx).await?;
    Ok((StatusCode::OK, Json(business)))
}

pub async fn update_my_business(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<UpdateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let business = require_my_business(&db, &ctx).await?;

    let mut active = business.into_active_model();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(business_type) = payload.business_type {
        active.business_type = Set(business_type);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(capacity) = payload.max_daily_capacity {
        active.max_daily_capacity = Set(capacity);
    }
    if let Some(minutes) = payload.avg_service_time {
        active.avg_service_time = Set(minutes);
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let business = active.update(&db).await?;

    tracing::Span::current()
        .record("table", "businesses")
        .record("action", "update_business")
        .record("business_event", "Business updated");

    Ok((StatusCode::OK, Json(business)))
}

pub async fn my_business_queue(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let business = require_my_business(&db, &ctx).await?;
    let entries = queue::list_business_queue(&db, business.id).await?;
    Ok((StatusCode::OK, Json(entries)))
}

pub async fn my_business_stats(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let business = require_my_business(&db, &ctx).await?;
    let stats = queue::queue_stats(&db, &business, chrono::Utc::now().naive_utc()).await?;
    Ok((StatusCode::OK, Json(stats)))
}

pub async fn list_analytics(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let business = require_my_business(&db, &ctx).await?;
    let rows = analytics::recent(&db, business.id).await?;
    Ok((StatusCode::OK, Json(rows)))
}

pub async fn record_analytics(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // The body is optional; an empty one means today
    let payload: RecordAnalyticsRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RecordAnalyticsRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::Validation(e.to_string()))?
    };

    let business = require_my_business(&db, &ctx).await?;
    let date = payload
        .date
        .unwrap_or_else(|| queue::service_day(chrono::Utc::now().naive_utc()));

    let row = analytics::record_daily(&db, business.id, date).await?;

    tracing::Span::current()
        .record("table", "business_analytics")
        .record("action", "record_daily")
        .record("business_event", "Daily rollup recorded");

    Ok((StatusCode::OK, Json(row)))
}

/// The business owned by the caller, recorded on the request span.
pub(crate) async fn require_my_business(
    db: &DatabaseConnection,
    ctx: &RequestContext,
) -> Result<business::Model, AppError> {
    let business = Business::find()
        .filter(business::Column::OwnerId.eq(ctx.account_id))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Business"))?;

    tracing::Span::current().record("business_id", tracing::field::display(business.id));
    Ok(business)
}
