//! HTTP control surface.
//!
//! Operation failures are reported as `{success: false, message}` with
//! status 200 and an `x-control-error` header naming the error kind. Only
//! unparseable request bodies get a 4xx.

use crate::dashboard;
use crate::error::ControlError;
use crate::service::{ActionResponse, ConfigResponse, ConfigUpdate, ControlService};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Version information for this service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Header carrying the [`crate::error::ErrorKind`] of a failed operation
pub const ERROR_HEADER: &str = "x-control-error";

/// Helper to create a simple response - infallible with valid StatusCode
fn response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .expect("valid response with StatusCode enum")
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .expect("valid response with StatusCode enum and static header"),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

/// `{success: false, message}` with the error kind attached as a header
fn failure_response<T: Serialize>(err: &ControlError, body: &T) -> Response<Full<Bytes>> {
    let mut resp = json_response(StatusCode::OK, body);
    resp.headers_mut().insert(
        ERROR_HEADER,
        hyper::header::HeaderValue::from_static(err.kind().as_str()),
    );
    resp
}

fn action_response(result: Result<&'static str, ControlError>) -> Response<Full<Bytes>> {
    match result {
        Ok(message) => json_response(StatusCode::OK, &ActionResponse::ok(message)),
        Err(e) => failure_response(&e, &ActionResponse::error(&e)),
    }
}

/// HTTP server exposing a [`ControlService`]
pub struct ControlServer {
    listener: TcpListener,
    service: Arc<ControlService>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ControlServer {
    pub async fn bind(
        bind_addr: SocketAddr,
        service: Arc<ControlService>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind_addr, e))?;
        Ok(Self {
            listener,
            service,
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.local_addr()?;
        info!(addr = %addr, "Control server listening (HTTP/1.1 and HTTP/2)");

        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let service = Arc::clone(&self.service);
                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(stream, service).await {
                                    debug!(addr = %addr, error = %e, "Control connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept control connection");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Control server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

async fn serve_connection<S>(stream: S, service: Arc<ControlService>) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let svc = service_fn(move |req| {
        let service = Arc::clone(&service);
        async move { handle_request(req, service).await }
    });

    AutoBuilder::new(TokioExecutor::new())
        .serve_connection(io, svc)
        .await
        .map_err(|e| anyhow::anyhow!("Control connection error: {}", e))?;

    Ok(())
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    service: Arc<ControlService>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let body = req.into_body().collect().await?.to_bytes();

    Ok(route(&method, &path, &body, &service).await)
}

/// Dispatch one request to the matching control operation
pub async fn route(method: &Method, path: &str, body: &[u8], service: &ControlService) -> Response<Full<Bytes>> {
    debug!(%method, %path, "Control API request");

    match (method, path) {
        (&Method::GET, "/") => {
            let status = service.status().await;
            let config = service.config().ok();
            dashboard::serve_dashboard(&status, config.as_ref())
        }

        (&Method::GET, "/health") => response(StatusCode::OK, "ok"),

        (&Method::GET, "/version") => {
            let version_info = serde_json::json!({
                "name": PKG_NAME,
                "version": VERSION,
            });
            json_response(StatusCode::OK, &version_info)
        }

        (&Method::GET, "/api/status") => json_response(StatusCode::OK, &service.status().await),

        (&Method::POST, "/api/start") => action_response(service.start().await),

        (&Method::POST, "/api/stop") => action_response(service.stop().await),

        (&Method::GET, "/api/config") => match service.config() {
            Ok(config) => json_response(
                StatusCode::OK,
                &ConfigResponse {
                    success: true,
                    config: Some(config),
                    message: None,
                },
            ),
            Err(e) => failure_response(
                &e,
                &ConfigResponse {
                    success: false,
                    config: None,
                    message: Some(e.to_string()),
                },
            ),
        },

        (&Method::POST, "/api/config") => {
            let update: ConfigUpdate = if body.iter().all(u8::is_ascii_whitespace) {
                ConfigUpdate::default()
            } else {
                match serde_json::from_slice(body) {
                    Ok(update) => update,
                    Err(e) => {
                        debug!(error = %e, "Rejected config update body");
                        return json_response(
                            StatusCode::BAD_REQUEST,
                            &ActionResponse {
                                success: false,
                                message: format!("Invalid JSON: {}", e),
                            },
                        );
                    }
                }
            };
            action_response(service.update_config(update).await)
        }

        _ => response(StatusCode::NOT_FOUND, "not found"),
    }
}
