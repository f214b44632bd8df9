//! Request routing and JSON responses.
//!
//! Routing works on method + path only so handlers can be exercised without
//! a socket.

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::Error;
use crate::telemetry;
use crate::usecase::{CacheStats, OrderService};

const ORDERS_PATH: &str = "/api/v1/orders";
const HEALTH_PATH: &str = "/api/v1/health";

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /api/v1/health` response body
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub cache: CacheStats,
}

/// Resolved request target
enum Target<'a> {
    Liveness,
    Metrics,
    Health,
    Orders,
    Order(&'a str),
}

fn resolve(path: &str) -> Option<Target<'_>> {
    match path {
        "/healthz" | "/readyz" => Some(Target::Liveness),
        "/metrics" => Some(Target::Metrics),
        HEALTH_PATH => Some(Target::Health),
        ORDERS_PATH => Some(Target::Orders),
        _ => match path.strip_prefix(ORDERS_PATH)?.strip_prefix('/') {
            Some(raw_uid) if !raw_uid.contains('/') => Some(Target::Order(raw_uid)),
            _ => None,
        },
    }
}

/// Dispatch one request.
///
/// Unknown paths get 404. Known paths only answer `GET`; other methods get
/// 405 with an `Allow` header.
pub async fn route(
    service: &OrderService,
    cancel: &CancellationToken,
    method: &Method,
    path: &str,
) -> Response<Full<Bytes>> {
    let Some(target) = resolve(path) else {
        return not_found();
    };
    if *method != Method::GET {
        return method_not_allowed();
    }

    match target {
        Target::Liveness => text(StatusCode::OK, "ok"),
        Target::Metrics => metrics(),
        Target::Health => health(service),
        Target::Orders => list_orders(service, cancel).await,
        Target::Order(raw_uid) => get_order(service, cancel, raw_uid).await,
    }
}

async fn get_order(
    service: &OrderService,
    cancel: &CancellationToken,
    raw_uid: &str,
) -> Response<Full<Bytes>> {
    let order_uid = match urlencoding::decode(raw_uid) {
        Ok(uid) => uid,
        Err(_) => {
            return error_response(&Error::Decode("order_uid is not valid UTF-8".into()));
        }
    };

    match service.get_by_uid(cancel, &order_uid).await {
        Ok(order) => json(StatusCode::OK, &order),
        Err(e) => error_response(&e),
    }
}

async fn list_orders(service: &OrderService, cancel: &CancellationToken) -> Response<Full<Bytes>> {
    match service.get_all(cancel).await {
        Ok(orders) => json(StatusCode::OK, &orders),
        Err(e) => error_response(&e),
    }
}

fn health(service: &OrderService) -> Response<Full<Bytes>> {
    json(
        StatusCode::OK,
        &HealthBody {
            status: "ok",
            timestamp: Utc::now(),
            cache: service.cache_stats(),
        },
    )
}

fn metrics() -> Response<Full<Bytes>> {
    match telemetry::gather_text() {
        Ok((content_type, body)) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
            response
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Responses
// =============================================================================

/// HTTP status for a service error.
pub fn status_for(e: &Error) -> StatusCode {
    if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if e.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(e: &Error) -> Response<Full<Bytes>> {
    let status = status_for(e);
    let message = if status.is_server_error() {
        error!(error = %e, "Request failed");
        "internal server error".to_string()
    } else {
        e.to_string()
    };
    json(status, &ErrorBody { error: message })
}

/// 504 for a request that outlived its deadline.
pub fn timed_out() -> Response<Full<Bytes>> {
    json(
        StatusCode::GATEWAY_TIMEOUT,
        &ErrorBody {
            error: "request timed out".into(),
        },
    )
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = json(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorBody {
            error: "method not allowed".into(),
        },
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET"));
    response
}

fn not_found() -> Response<Full<Bytes>> {
    json(
        StatusCode::NOT_FOUND,
        &ErrorBody {
            error: "not found".into(),
        },
    )
}

fn json<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Full::new(Bytes::from(bytes)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!(error = %e, "Failed to encode response");
            text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

fn text(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}
