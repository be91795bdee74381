pub mod auth;
pub mod business;
pub mod events;
pub mod middleware;
pub mod queue;
pub mod session;
pub mod user;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;

use crate::events::QueueHub;
use crate::session::SessionKey;

async fn health_check() -> &'static str {
    "OK"
}

/// Every HTTP route of the service. The binary adds `/metrics` on top.
pub fn router(
    db: DatabaseConnection,
    hub: QueueHub,
    session_key: SessionKey,
    cors_origin: HeaderValue,
) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(session::get_session));

    let protected_routes = Router::new()
        .route("/session/portal", post(session::choose_portal))
        .route(
            "/my/profile",
            get(user::get_profile).patch(user::update_profile),
        )
        .route(
            "/businesses",
            get(business::list_businesses).post(business::create_business),
        )
        .route("/businesses/:id", get(business::get_business))
        .route("/businesses/:id/queue", post(queue::join_queue))
        .route(
            "/my/business",
            get(business::get_my_business).patch(business::update_my_business),
        )
        .route("/my/business/queue", get(business::my_business_queue))
        .route("/my/business/stats", get(business::my_business_stats))
        .route("/my/business/events", get(events::my_business_events))
        .route(
            "/my/business/analytics",
            get(business::list_analytics).post(business::record_analytics),
        )
        .route("/my/queues", get(queue::list_my_queues))
        .route("/my/queues/events", get(events::my_queue_events))
        .route("/queue-entries/:id/advance", post(queue::advance_entry))
        .route("/queue-entries/:id/cancel", post(queue::cancel_entry))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(hub))
        .layer(Extension(session_key))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /route" keeps span names low-cardinality
                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    let client_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .or_else(|| request.headers().get("x-real-ip"))
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        client_ip = client_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        // Filled in by handlers
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        business_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
}
