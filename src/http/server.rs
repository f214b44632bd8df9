//! HTTP/1 server loop, one task per connection.
//!
//! Connections are watched so shutdown can drain them: once the token fires
//! the listener closes, idle connections are closed and in-flight requests
//! get `shutdown_timeout` to finish before they are cancelled.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::routes::{route, timed_out};
use crate::error::{Error, Result};
use crate::usecase::OrderService;

/// HTTP server timeouts
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Deadline for a client to finish sending request headers
    pub header_read_timeout: Duration,
    /// Deadline for producing a response; 504 afterwards
    pub request_timeout: Duration,
    /// How long shutdown waits for open connections
    pub shutdown_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            header_read_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Bound HTTP listener serving the read API
pub struct HttpServer {
    listener: TcpListener,
    service: OrderService,
    config: HttpConfig,
}

impl HttpServer {
    /// Bind `addr` with default timeouts. Port 0 picks a free port; see
    /// [`HttpServer::local_addr`].
    pub async fn bind(addr: &str, service: OrderService) -> Result<Self> {
        Self::bind_with_config(addr, service, HttpConfig::default()).await
    }

    pub async fn bind_with_config(
        addr: &str,
        service: OrderService,
        config: HttpConfig,
    ) -> Result<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid HTTP address {:?}: {}", addr, e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal(format!("Failed to bind HTTP server: {}", e)))?;

        Ok(Self {
            listener,
            service,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires, then drain.
    pub async fn serve(self, cancel: CancellationToken) -> Result<()> {
        info!("HTTP server listening on {}", self.local_addr()?);

        let HttpServer {
            listener,
            service,
            config,
        } = self;
        let graceful = GracefulShutdown::new();
        // Cancelled only when draining runs out of time
        let requests = CancellationToken::new();

        loop {
            let (stream, peer) = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "HTTP accept failed");
                        continue;
                    }
                },
            };

            let io = TokioIo::new(stream);
            let service = service.clone();
            let requests = requests.clone();
            let request_timeout = config.request_timeout;

            let handler = service_fn(move |req: Request<Incoming>| {
                let service = service.clone();
                let cancel = requests.clone();
                async move {
                    debug!(method = %req.method(), path = req.uri().path(), "HTTP request");
                    let response = respond(
                        &service,
                        &cancel,
                        req.method(),
                        req.uri().path(),
                        request_timeout,
                    )
                    .await;
                    Ok::<_, Infallible>(response)
                }
            });

            let conn = http1::Builder::new()
                .timer(TokioTimer::new())
                .header_read_timeout(config.header_read_timeout)
                .serve_connection(io, handler);
            let conn = graceful.watch(conn);

            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    debug!(%peer, error = %e, "HTTP connection error");
                }
            });
        }

        drop(listener);
        info!("HTTP server draining connections");

        if tokio::time::timeout(config.shutdown_timeout, graceful.shutdown())
            .await
            .is_err()
        {
            warn!(
                timeout = ?config.shutdown_timeout,
                "HTTP connections did not drain in time, cancelling in-flight requests"
            );
            requests.cancel();
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Route one request under the request deadline.
async fn respond(
    service: &OrderService,
    cancel: &CancellationToken,
    method: &Method,
    path: &str,
    timeout: Duration,
) -> Response<Full<Bytes>> {
    match tokio::time::timeout(timeout, route(service, cancel, method, path)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(%method, path, ?timeout, "HTTP request timed out");
            timed_out()
        }
    }
}
