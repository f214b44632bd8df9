//! HTTP Read API
//!
//! | Route                          | Response                               |
//! |--------------------------------|----------------------------------------|
//! | `GET /api/v1/orders/{uid}`     | 200 order, 400 empty uid, 404 missing  |
//! | `GET /api/v1/orders`           | 200 order list                         |
//! | `GET /api/v1/health`           | 200 status + cache statistics          |
//! | `GET /healthz`, `GET /readyz`  | 200 `ok`                               |
//! | `GET /metrics`                 | prometheus text format                 |
//!
//! Unknown paths are 404 `{"error": "not found"}`. A known path with any
//! method other than GET is 405 with `Allow: GET`. A request that outlives
//! the request timeout is 504.

mod routes;
mod server;

pub use routes::{route, status_for, ErrorBody, HealthBody};
pub use server::{HttpConfig, HttpServer};
