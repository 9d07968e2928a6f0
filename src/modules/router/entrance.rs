// src/modules/router/entrance.rs

use crate::common::env::CONFIG;
use crate::core::response;
use crate::core::state::AppState;
use crate::middlewares;
use crate::modules::api;
use axum::{
    Router,
    http::StatusCode,
    response::Response,
    routing::{any, delete, get, post},
};
use std::path::Path;
use tower_http::services::ServeDir;

pub fn app_router(state: AppState) -> Router {
    build(state, &CONFIG.static_dir)
}

pub fn build(state: AppState, static_dir: &Path) -> Router {
    let router = Router::new()
        .route("/api", get(api::root::get_root_handler))
        .route("/api/containers", get(api::containers::list_containers_handler))
        .route(
            "/api/containers/{id}",
            get(api::containers::get_container_handler)
                .delete(api::containers::delete_container_handler),
        )
        .route(
            "/api/containers/{id}/logs",
            get(api::containers::get_container_logs_handler),
        )
        .route(
            "/api/containers/{id}/stats",
            get(api::containers::get_container_stats_handler),
        )
        .route(
            "/api/containers/{id}/{action}",
            post(api::containers::post_container_action_handler),
        )
        .route("/api/images", get(api::images::list_images_handler))
        .route("/api/images/pull", post(api::images::post_pull_image_handler))
        .route("/api/images/{*id}", delete(api::images::delete_image_handler))
        .route(
            "/api/volumes",
            get(api::volumes::list_volumes_handler).post(api::volumes::post_create_volume_handler),
        )
        .route("/api/volumes/{name}", delete(api::volumes::delete_volume_handler))
        .route("/api/stats", get(api::stats::get_stats_handler))
        .route("/api/{*rest}", any(handler_404))
        .method_not_allowed_fallback(handler_405)
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir));
    middlewares::middleware::stack(router)
}

async fn handler_404() -> Response {
    response::not_found()
}

async fn handler_405() -> Response {
    response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::docker::client::{DisconnectedClient, SharedClient};
    use crate::modules::docker::fake::{Call, FakeClient};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router_with(client: SharedClient, connected: bool) -> Router {
        build(
            AppState::new(client, connected),
            Path::new("/nonexistent/dockdash-static"),
        )
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn degraded_mode_answers_with_structured_errors() {
        let router = router_with(
            Arc::new(DisconnectedClient::new("socket /var/run/docker.sock not found")),
            false,
        );
        let (status, body) = send(router, "GET", "/api/containers", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("not connected"));
    }

    #[tokio::test]
    async fn lists_containers_in_the_canonical_shape() {
        let fake = Arc::new(FakeClient::new().with_containers(json!([
            { "Id": "abcdef0123456789", "Names": ["/web"], "Image": "nginx", "State": "running", "Status": "Up", "Created": 0 }
        ])));
        let (status, body) = send(router_with(fake, true), "GET", "/api/containers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["total"], json!(1));
        assert_eq!(body["containers"][0]["id"], json!("abcdef012345"));
        assert_eq!(body["containers"][0]["name"], json!("web"));
    }

    #[tokio::test]
    async fn unknown_action_is_a_bad_request_without_daemon_calls() {
        let fake = Arc::new(FakeClient::new());
        let (status, body) = send(
            router_with(fake.clone(), true),
            "POST",
            "/api/containers/abc/teleport",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "Invalid action: teleport" }));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn container_action_and_delete_with_force() {
        let fake = Arc::new(FakeClient::new());
        let (status, body) =
            send(router_with(fake.clone(), true), "POST", "/api/containers/abc/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Container stopped" }));

        let (status, _) = send(
            router_with(fake.clone(), true),
            "DELETE",
            "/api/containers/abc?force=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            fake.calls(),
            vec![
                Call::Lifecycle("abc".into(), crate::modules::docker::client::LifecycleOp::Stop),
                Call::RemoveContainer("abc".into(), true),
            ]
        );
    }

    #[tokio::test]
    async fn pull_without_image_name_is_rejected_first() {
        let fake = Arc::new(FakeClient::new());
        let (status, body) =
            send(router_with(fake.clone(), true), "POST", "/api/images/pull", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));

        let (status, _) =
            send(router_with(fake.clone(), true), "POST", "/api/images/pull", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(fake.calls().is_empty());

        let (status, body) = send(
            router_with(fake.clone(), true),
            "POST",
            "/api/images/pull",
            Some(json!({ "image": "nginx" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Image pulled: nginx:latest"));
    }

    #[tokio::test]
    async fn in_use_image_delete_carries_the_flag() {
        let fake = Arc::new(FakeClient::new().with_image_in_use());
        let (status, body) =
            send(router_with(fake.clone(), true), "DELETE", "/api/images/library/nginx", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["inUse"], json!(true));
        assert_eq!(body["success"], json!(false));

        let (status, body) = send(
            router_with(fake.clone(), true),
            "DELETE",
            "/api/images/library/nginx?force=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Image deleted" }));
        assert_eq!(
            fake.calls(),
            vec![
                Call::RemoveImage("library/nginx".into(), false),
                Call::RemoveImage("library/nginx".into(), true),
            ]
        );
    }

    #[tokio::test]
    async fn volume_create_and_in_use_delete() {
        let fake = Arc::new(FakeClient::new().with_volume_in_use());
        let (status, body) =
            send(router_with(fake.clone(), true), "POST", "/api/volumes", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Volume name is required"));

        let (status, body) = send(
            router_with(fake.clone(), true),
            "POST",
            "/api/volumes",
            Some(json!({ "name": "pgdata" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Volume created"));
        assert_eq!(body["volume"]["driver"], json!("local"));
        assert_eq!(body["volume"]["size"], Value::Null);
        assert_eq!(body["volume"]["labels"], json!({}));

        let (status, body) =
            send(router_with(fake.clone(), true), "DELETE", "/api/volumes/pgdata", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["inUse"], json!(true));
    }

    #[tokio::test]
    async fn stats_over_nothing_running_are_zero() {
        let fake = Arc::new(FakeClient::new());
        let (status, body) = send(router_with(fake, true), "GET", "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "cpu": 0.0, "memory": 0.0, "io": 0.0 }));
    }

    #[tokio::test]
    async fn unknown_api_paths_are_json_404s() {
        let fake = Arc::new(FakeClient::new());
        let (status, body) = send(router_with(fake, true), "GET", "/api/networks", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn root_reports_daemon_state() {
        let (_, body) = send(router_with(Arc::new(FakeClient::new()), true), "GET", "/api", None).await;
        assert_eq!(body["daemon"]["connected"], json!(true));

        let (_, body) = send(
            router_with(Arc::new(DisconnectedClient::new("no socket")), false),
            "GET",
            "/api",
            None,
        )
        .await;
        assert_eq!(body["daemon"]["connected"], json!(false));
        assert_eq!(body["daemon"]["degraded"], json!(true));
    }

    #[tokio::test]
    async fn lists_images_with_sentinels_for_untagged() {
        let fake = Arc::new(FakeClient::new().with_images(json!([
            {
                "Id": "sha256:605c77e624ddb75e6110f997c58876baa13f8754486b461117934b24a9dc3a85",
                "RepoTags": ["nginx:1.25"],
                "RepoDigests": ["nginx@sha256:abc"],
                "Size": 1536,
                "Created": 1_700_000_000,
                "Architecture": "amd64",
                "Os": "linux"
            },
            { "Id": "sha256:0123456789abcdef", "RepoTags": null, "Size": 0, "Created": 0 }
        ])));
        let (status, body) = send(router_with(fake, true), "GET", "/api/images", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["total"], json!(2));

        let tagged = &body["images"][0];
        assert_eq!(tagged["id"], json!("605c77e624dd"));
        assert_eq!(tagged["repository"], json!("nginx"));
        assert_eq!(tagged["tag"], json!("1.25"));
        assert_eq!(tagged["size"], json!("1.50 KB"));

        let dangling = &body["images"][1];
        assert_eq!(dangling["repository"], json!("<none>"));
        assert_eq!(dangling["tag"], json!("<none>"));
        assert_eq!(dangling["size"], json!("0 B"));
        assert_eq!(dangling["architecture"], json!("N/A"));
    }

    #[tokio::test]
    async fn lists_volumes_with_nullable_size() {
        let fake = Arc::new(FakeClient::new().with_volumes(json!([
            {
                "Name": "pgdata",
                "Driver": "local",
                "Mountpoint": "/var/lib/docker/volumes/pgdata/_data",
                "CreatedAt": "2024-06-01T08:30:00+02:00",
                "Labels": { "app": "db" },
                "Scope": "local",
                "UsageData": { "Size": 2048, "RefCount": 1 }
            },
            { "Name": "cache", "Driver": "local", "Mountpoint": "/cache", "Labels": null }
        ])));
        let (status, body) = send(router_with(fake, true), "GET", "/api/volumes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(2));

        let pgdata = &body["volumes"][0];
        assert_eq!(pgdata["size"], json!("2.00 KB"));
        assert_eq!(pgdata["created"], json!("2024-06-01T06:30:00Z"));
        assert_eq!(pgdata["labels"], json!({ "app": "db" }));

        let cache = &body["volumes"][1];
        assert_eq!(cache["size"], Value::Null);
        assert_eq!(cache["created"], Value::Null);
        assert_eq!(cache["labels"], json!({}));
        assert_eq!(cache["scope"], json!("local"));
    }

    #[tokio::test]
    async fn container_logs_are_demultiplexed() {
        use crate::modules::docker::logs::frame;

        let mut raw = frame(1, "2024-05-01T12:00:00.5Z ready\n");
        raw.extend(frame(2, "2024-05-01T12:00:01Z disk almost full\n"));
        let fake = Arc::new(FakeClient::new().with_logs("web", raw));

        let (status, body) = send(
            router_with(fake.clone(), true),
            "GET",
            "/api/containers/web/logs?tail=50",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(2));
        assert_eq!(
            body["logs"][1],
            json!({ "stream": "stderr", "timestamp": "2024-05-01T12:00:01Z", "message": "disk almost full" })
        );
        assert_eq!(fake.calls(), vec![Call::Logs("web".into(), Some(50))]);

        let (status, body) = send(
            router_with(fake.clone(), true),
            "GET",
            "/api/containers/web/logs?tail=lots",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid tail: lots"));

        let (status, _) =
            send(router_with(fake, true), "GET", "/api/containers/ghost/logs", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn single_container_stats() {
        let fake = Arc::new(FakeClient::new().with_stats(
            "web",
            json!({
                "cpu_stats": { "cpu_usage": { "total_usage": 300 }, "system_cpu_usage": 2_000, "online_cpus": 2 },
                "precpu_stats": { "cpu_usage": { "total_usage": 100 }, "system_cpu_usage": 1_000 },
                "memory_stats": { "usage": 64 * 1024 * 1024 }
            }),
        ));
        let (status, body) =
            send(router_with(fake, true), "GET", "/api/containers/web/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["stats"],
            json!({ "cpu": 20.0, "memory": 64.0, "io": 0.0, "onlineCpus": 2 })
        );
    }

    #[tokio::test]
    async fn wrong_method_on_a_known_route_is_json() {
        let fake = Arc::new(FakeClient::new());
        let (status, body) =
            send(router_with(fake.clone(), true), "GET", "/api/containers/abc/start", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "success": false, "error": "Method not allowed" }));
        assert!(fake.calls().is_empty());
    }
}
