use affilink_core::ShortCode;
use affilink_redirector::{ClickEvent, RedirectorError};
use axum::extract::{Path, State};
use axum::http::header::{LOCATION, REFERER, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::extract::ClientAddr;
use crate::state::AppState;

const NOT_FOUND_BODY: &str = "Link not found";

fn header_string(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Resolves `short_code` and answers with a 302. The click is handed to the
/// dispatcher and never awaited.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    headers: HeaderMap,
) -> Response {
    let Ok(code) = ShortCode::new(short_code.as_str()) else {
        debug!(code = %short_code, "Rejected malformed short code");
        return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response();
    };

    match state.redirector().resolve(&code).await {
        Ok(resolved) => {
            state.clicks().submit(ClickEvent {
                link_id: resolved.id,
                referrer: header_string(&headers, REFERER),
                user_agent: header_string(&headers, USER_AGENT),
                client_address: client.map(|ip| ip.to_string()),
            });
            (StatusCode::FOUND, [(LOCATION, resolved.target_url)]).into_response()
        }
        Err(RedirectorError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
        }
        Err(e) => {
            error!(code = %code, error = %e, "Failed to resolve short code");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
