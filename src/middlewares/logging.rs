// src/middlewares/logging.rs

use crate::common::log;
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

// ➜ METHOD path, then the status once the handler is done.
pub async fn handler(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    log::debug(&format!("➜ {} {}", method, path));

    let started = Instant::now();
    let response = next.run(req).await;
    let status = response.status();

    if status.is_server_error() {
        log::warn(&format!(
            "▲ {} {} {} ({}ms)",
            method,
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        ));
    } else {
        log::debug(&format!(
            "▪ {} {} {} ({}ms)",
            method,
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        ));
    }
    response
}
