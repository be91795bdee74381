use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::session::{context_from_cookies, SessionKey};

/// Rejects requests without a valid session and hands a `RequestContext` to
/// the handlers behind it.
pub async fn auth_middleware(
    Extension(key): Extension<SessionKey>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    match context_from_cookies(&cookies, &key) {
        Some(context) => {
            tracing::Span::current().record("user_id", tracing::field::display(context.account_id));
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}
