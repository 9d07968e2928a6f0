// src/modules/docker/unix.rs

use crate::common::log;
use crate::core::error::{self, ApiError, Result};
use http::header::{CONTENT_TYPE, HOST};
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request, Response, StatusCode,
    body::{Bytes, Incoming},
    client::conn::http1,
};
use hyper_util::rt::TokioIo;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::time::timeout;
use url::{Position, Url};

lazy_static! {
    static ref BASE_URL: Url = Url::parse("http://localhost/").expect("static url");
}

#[derive(Deserialize)]
struct DaemonMessage {
    message: String,
}

/// HTTP/1.1 over the daemon's unix control socket, one connection per call.
#[derive(Debug, Clone)]
pub struct UnixTransport {
    socket_path: PathBuf,
    timeout: Duration,
}

impl UnixTransport {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends one request and hands back the raw response, body unread.
    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Response<Incoming>> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            ApiError::DaemonUnavailable(format!("{}: {}", self.socket_path.display(), e))
        })?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = http1::handshake(io)
            .await
            .map_err(|e| ApiError::DaemonUnavailable(e.to_string()))?;

        tokio::task::spawn(async move {
            if let Err(err) = conn.await {
                log::debug(&format!("▪ Docker connection closed: {}", err));
            }
        });

        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, "localhost");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| ApiError::invalid_input(e.to_string()))?;

        sender
            .send_request(req)
            .await
            .map_err(|e| ApiError::DaemonUnavailable(e.to_string()))
    }

    /// Non-streaming call bounded by the configured timeout. Non-2xx answers
    /// are classified into the error taxonomy.
    pub async fn call(&self, method: Method, path: &str, body: Option<Bytes>) -> Result<Bytes> {
        let exchange = async {
            let res = self.send_request(method, path, body).await?;
            let status = res.status();
            let bytes = res
                .into_body()
                .collect()
                .await
                .map_err(|e| ApiError::DaemonUnavailable(e.to_string()))?
                .to_bytes();
            // 304: the container was already in the requested state.
            if status.is_success() || status == StatusCode::NOT_MODIFIED {
                Ok(bytes)
            } else {
                Err(rejection(status, &bytes))
            }
        };

        timeout(self.timeout, exchange).await.map_err(|_| {
            ApiError::DaemonUnavailable(format!(
                "request {} timed out after {}s",
                path,
                self.timeout.as_secs()
            ))
        })?
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.call(Method::GET, path, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Turns a non-2xx daemon answer into an error, preferring the daemon's
/// `{"message": ...}` body over the raw text.
pub fn rejection(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<DaemonMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Docker API error")
            .to_string()
    } else {
        message
    };
    error::classify(status, &message)
}

/// Builds a daemon path with every segment and query value percent-encoded.
pub fn endpoint(segments: &[&str], query: &[(&str, &str)]) -> String {
    let mut url = BASE_URL.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url[Position::BeforePath..].to_string()
}
