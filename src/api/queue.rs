use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::{ChangeKind, QueueHub};
use crate::queue::{self, AdvanceTarget, QueueError};
use crate::session::RequestContext;

#[derive(serde::Deserialize)]
pub struct AdvanceRequest {
    status: AdvanceTarget,
}

pub async fn join_queue(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<QueueHub>,
    Extension(ctx): Extension<RequestContext>,
    Path(business_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    tracing::Span::current().record("business_id", tracing::field::display(business_id));

    let entry = match queue::join_queue(&db, business_id, ctx.account_id, now()).await {
        Ok(entry) => entry,
        Err(err) => {
            if let Some(reason) = rejection_reason(&err) {
                crate::metrics::record_join_rejected(reason);
            }
            return Err(err.into());
        }
    };

    tracing::Span::current()
        .record("table", "queue_entries")
        .record("action", "join_queue")
        .record("business_event", "Joined queue");
    crate::metrics::record_join(entry.estimated_wait_time);

    hub.publish(ChangeKind::Inserted, entry.clone());
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_my_queues(
    Extension(db): Extension<DatabaseConnection>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    let entries = queue::list_user_queues(&db, ctx.account_id).await?;
    Ok((StatusCode::OK, Json(entries)))
}

pub async fn advance_entry(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<QueueHub>,
    Extension(ctx): Extension<RequestContext>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = queue::advance_entry(&db, ctx.account_id, entry_id, payload.status, now()).await?;

    tracing::Span::current()
        .record("table", "queue_entries")
        .record("action", "advance_entry")
        .record("business_id", tracing::field::display(entry.business_id))
        .record("business_event", entry.status.as_str());
    crate::metrics::record_transition(entry.status);

    hub.publish(ChangeKind::Updated, entry.clone());
    Ok((StatusCode::OK, Json(entry)))
}

pub async fn cancel_entry(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<QueueHub>,
    Extension(ctx): Extension<RequestContext>,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entry = queue::cancel_entry(&db, ctx.account_id, entry_id).await?;

    tracing::Span::current()
        .record("table", "queue_entries")
        .record("action", "cancel_entry")
        .record("business_id", tracing::field::display(entry.business_id))
        .record("business_event", "Left queue");
    crate::metrics::record_transition(entry.status);

    hub.publish(ChangeKind::Updated, entry.clone());
    Ok((StatusCode::OK, Json(entry)))
}

fn rejection_reason(err: &QueueError) -> Option<&'static str> {
    match err {
        QueueError::AlreadyQueued => Some("already_queued"),
        QueueError::CapacityReached { .. } => Some("capacity"),
        QueueError::NumberTaken => Some("number_taken"),
        _ => None,
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
