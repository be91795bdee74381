//! Server-Sent Event streams of queue changes.
//!
//! Each stream opens with a `ready` event carrying the reconnect delay, then
//! relays matching changes as `inserted` / `updated`. A `resync` event means
//! changes were dropped and the client should re-fetch its listing.

use std::pin::Pin;
use std::time::Duration;

use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream, Stream, StreamExt};
use sea_orm::DatabaseConnection;
use serde_json::json;

use super::business::require_my_business;
use crate::error::AppError;
use crate::events::{EventFilter, Notification, QueueHub};
use crate::session::RequestContext;

const RETRY_AFTER: Duration = Duration::from_secs(3);

type BoxedEvents = Pin<Box<dyn Stream<Item = Result<Event, axum::Error>> + Send>>;
type EventStream = Sse<BoxedEvents>;

pub async fn my_queue_events(
    Extension(hub): Extension<QueueHub>,
    Extension(ctx): Extension<RequestContext>,
) -> EventStream {
    tracing::Span::current().record("action", "watch_user_queues");
    subscribe(&hub, EventFilter::User(ctx.account_id))
}

pub async fn my_business_events(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<QueueHub>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<EventStream, AppError> {
    let business = require_my_business(&db, &ctx).await?;
    tracing::Span::current().record("action", "watch_business_queue");
    Ok(subscribe(&hub, EventFilter::Business(business.id)))
}

fn subscribe(hub: &QueueHub, filter: EventFilter) -> EventStream {
    tracing::info!(?filter, subscribers = hub.subscriber_count() + 1, "Queue event stream opened");

    let ready = Event::default()
        .event("ready")
        .retry(RETRY_AFTER)
        .data("ok");
    let changes = hub.watch(filter).map(|notification| to_event(&notification));

    let events: BoxedEvents = Box::pin(stream::once(async move { Ok(ready) }).chain(changes));
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_event(notification: &Notification) -> Result<Event, axum::Error> {
    match notification {
        Notification::Changed(change) => Event::default()
            .event(change.kind.as_str())
            .json_data(&change.entry),
        Notification::Resync { missed } => Event::default()
            .event("resync")
            .json_data(json!({ "missed": missed })),
    }
}
