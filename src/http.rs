//! HTTP API for the intake service
//!
//! - `POST /api/projects` - Submit a registration (multipart payload)
//! - `GET  /api/projects/{id}` - Look up a stored submission summary
//! - `GET  /health` - Health check with store statistics
//!
//! The intake endpoint always answers with the `{success, id?, error?}`
//! envelope; any non-success response leaves the client draft intact and
//! is retry-able.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::RegistryError;
use crate::gateway::{Gateway, IntakeResponse};

/// HTTP server state
pub struct HttpServer {
    gateway: Arc<Gateway>,
    bind_addr: SocketAddr,
    max_payload_bytes: u64,
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

fn status_for(error: &RegistryError) -> StatusCode {
    match error {
        RegistryError::Payload(_) | RegistryError::Parse(_) | RegistryError::Json(_) => {
            StatusCode::BAD_REQUEST
        }
        RegistryError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistryError::NotFound(_) | RegistryError::BlobNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl HttpServer {
    pub fn new(gateway: Arc<Gateway>, bind_addr: SocketAddr, max_payload_bytes: u64) -> Self {
        Self {
            gateway,
            bind_addr,
            max_payload_bytes,
        }
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), RegistryError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "Intake API listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Route requests to handlers
    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let path = req.uri().path().to_string();
        let method = req.method().clone();

        debug!(method = %method, path = %path, "Incoming request");

        let response = match (method, path.as_str()) {
            (Method::GET, "/health") => self.handle_health().await,

            (Method::POST, "/api/projects") => {
                let content_type = req
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());

                let declared_len = req
                    .headers()
                    .get(header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());

                // Refuse oversized payloads before buffering the body.
                if declared_len.map(|l| l > self.max_payload_bytes).unwrap_or(false) {
                    self.payload_too_large()
                } else {
                    match req.collect().await {
                        Ok(collected) => {
                            self.handle_intake(content_type.as_deref(), collected.to_bytes())
                                .await
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to read request body");
                            json_response(
                                StatusCode::BAD_REQUEST,
                                &IntakeResponse::rejected("Failed to read request body".into()),
                            )
                        }
                    }
                }
            }

            (Method::GET, p) if p.starts_with("/api/projects/") => {
                let id = p.strip_prefix("/api/projects/").unwrap_or("");
                self.handle_lookup(id)
            }

            _ => json_response(
                StatusCode::NOT_FOUND,
                &serde_json::json!({ "error": "Not found" }),
            ),
        };

        Ok(response)
    }

    fn payload_too_large(&self) -> Response<Full<Bytes>> {
        json_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            &IntakeResponse::rejected("Payload exceeds the accepted size".into()),
        )
    }

    /// POST /api/projects
    async fn handle_intake(
        &self,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Response<Full<Bytes>> {
        if body.len() as u64 > self.max_payload_bytes {
            return self.payload_too_large();
        }
        let Some(content_type) = content_type else {
            return json_response(
                StatusCode::BAD_REQUEST,
                &IntakeResponse::rejected("Missing Content-Type header".into()),
            );
        };

        match self.gateway.accept(content_type, &body).await {
            Ok(id) => json_response(StatusCode::CREATED, &IntakeResponse::accepted(id)),
            Err(e) => {
                let status = status_for(&e);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    // Transaction and storage details stay server-side.
                    error!(error = %e, "Submission failed");
                    json_response(
                        status,
                        &IntakeResponse::rejected("Submission could not be stored".into()),
                    )
                } else {
                    json_response(status, &IntakeResponse::rejected(e.to_string()))
                }
            }
        }
    }

    /// GET /api/projects/{id}
    fn handle_lookup(&self, id: &str) -> Response<Full<Bytes>> {
        if id.is_empty() {
            return json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": "Missing project id" }),
            );
        }

        match self.gateway.summary(id) {
            Ok(Some(summary)) => json_response(StatusCode::OK, &summary),
            Ok(None) => json_response(
                StatusCode::NOT_FOUND,
                &serde_json::json!({ "error": "Project not found" }),
            ),
            Err(e) => {
                error!(error = %e, "Lookup failed");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &serde_json::json!({ "error": "Lookup failed" }),
                )
            }
        }
    }

    /// GET /health
    async fn handle_health(&self) -> Response<Full<Bytes>> {
        let db_stats = self.gateway.db_stats();
        let blob_stats = self.gateway.blob_stats().await;

        match (db_stats, blob_stats) {
            (Ok(db), Ok(blobs)) => json_response(
                StatusCode::OK,
                &serde_json::json!({
                    "status": "ok",
                    "projects": db.project_count,
                    "pending": db.pending_count,
                    "species": db.species_count,
                    "evidence_rows": db.evidence_count,
                    "blobs": blobs.total_blobs,
                    "blob_bytes": blobs.total_bytes,
                }),
            ),
            (db, blobs) => {
                if let Err(e) = db {
                    error!(error = %e, "Health check failed reading database");
                }
                if let Err(e) = blobs {
                    error!(error = %e, "Health check failed reading blob store");
                }
                json_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    &serde_json::json!({ "status": "degraded" }),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;
    use crate::blob_store::BlobStore;
    use crate::db::RegistryDb;
    use crate::draft::ProjectDraft;
    use crate::fixtures;
    use tempfile::TempDir;

    async fn test_server() -> (HttpServer, TempDir) {
        let db = Arc::new(RegistryDb::open_in_memory().unwrap());
        let dir = TempDir::new().unwrap();
        let blobs = Arc::new(BlobStore::new(dir.path()).await.unwrap());
        let gateway = Arc::new(Gateway::new(db, blobs));
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        (HttpServer::new(gateway, addr, 1024 * 1024), dir)
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_intake_accepts_valid_submission() {
        let (server, _dir) = test_server().await;

        let draft = ProjectDraft::Local(fixtures::clean_local_draft());
        let payload = assemble::assemble(&draft, &fixtures::clean_local_bundle());

        let response = server
            .handle_intake(Some(&payload.content_type()), payload.to_bytes())
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        let id = body["id"].as_str().unwrap().to_string();

        // The stored record is visible through the lookup endpoint.
        let lookup = server.handle_lookup(&id);
        assert_eq!(lookup.status(), StatusCode::OK);
        let summary = body_json(lookup).await;
        assert_eq!(summary["status"], "pending");
        assert_eq!(summary["variant"], "local");
    }

    #[tokio::test]
    async fn test_intake_rejects_invalid_submission() {
        let (server, _dir) = test_server().await;

        let mut local = fixtures::clean_local_draft();
        local.shared.consent = false;
        let payload = assemble::assemble(
            &ProjectDraft::Local(local),
            &fixtures::clean_local_bundle(),
        );

        let response = server
            .handle_intake(Some(&payload.content_type()), payload.to_bytes())
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("consent"));
    }

    #[tokio::test]
    async fn test_intake_requires_content_type() {
        let (server, _dir) = test_server().await;
        let response = server.handle_intake(None, Bytes::from_static(b"x")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_intake_rejects_oversized_body() {
        let (server, _dir) = test_server().await;
        let huge = Bytes::from(vec![0u8; 2 * 1024 * 1024]);
        let response = server
            .handle_intake(Some("multipart/form-data; boundary=x"), huge)
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_lookup_unknown_id() {
        let (server, _dir) = test_server().await;
        let response = server.handle_lookup("no-such-id");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let (server, _dir) = test_server().await;
        let response = server.handle_health().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["projects"], 0);
    }
}
