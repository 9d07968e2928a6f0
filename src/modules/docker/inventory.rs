// src/modules/docker/inventory.rs

use crate::common::log;
use crate::core::error::Result;
use crate::modules::docker::client::DaemonClient;
use crate::modules::docker::normalize::{self, ContainerView, ImageView, VolumeView};
use crate::modules::docker::raw::{ContainerSummary, StateField};
use futures::future::join_all;

// Inspect carries the authoritative state and the exit code the list
// endpoint lacks. A failed inspect keeps the list record as it was.
async fn enrich(client: &dyn DaemonClient, mut summary: ContainerSummary) -> ContainerSummary {
    match client.inspect_container(&summary.id).await {
        Ok(inspect) => {
            if let Some(state) = inspect.state {
                summary.exit_code = state.exit_code;
                summary.state = Some(StateField::Nested(state));
            }
        }
        Err(err) => log::warn(&format!(
            "▲ inspect {} failed, using list data: {}",
            normalize::short_id(&summary.id),
            err
        )),
    }
    summary
}

pub async fn containers(client: &dyn DaemonClient) -> Result<Vec<ContainerView>> {
    let summaries = client.list_containers(true).await?;
    let enriched = join_all(summaries.into_iter().map(|s| enrich(client, s))).await;
    Ok(enriched.iter().map(normalize::container_view).collect())
}

pub async fn container(client: &dyn DaemonClient, id: &str) -> Result<ContainerView> {
    let inspect = client.inspect_container(id).await?;
    Ok(normalize::container_detail(&inspect))
}

pub async fn images(client: &dyn DaemonClient) -> Result<Vec<ImageView>> {
    let images = client.list_images().await?;
    Ok(images.iter().map(normalize::image_view).collect())
}

pub async fn volumes(client: &dyn DaemonClient) -> Result<Vec<VolumeView>> {
    let volumes = client.list_volumes().await?;
    Ok(volumes.iter().map(normalize::volume_view).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ApiError;
    use crate::modules::docker::client::DisconnectedClient;
    use crate::modules::docker::fake::{Call, FakeClient};
    use crate::modules::docker::normalize::ContainerState;
    use serde_json::json;

    #[tokio::test]
    async fn containers_merge_inspect_state() {
        let fake = FakeClient::new()
            .with_containers(json!([
                { "Id": "aaaaaaaaaaaaaaaa", "Names": ["/api"], "State": "running", "Status": "", "Created": 0 },
                { "Id": "bbbbbbbbbbbbbbbb", "Names": ["/job"], "State": "running", "Status": "", "Created": 0 }
            ]))
            .with_inspect(
                "aaaaaaaaaaaaaaaa",
                json!({ "Id": "aaaaaaaaaaaaaaaa", "State": { "Status": "exited", "ExitCode": 1 } }),
            );

        let views = containers(&fake).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].state, ContainerState::Exited);
        assert_eq!(views[0].status, "Exited (1)");
        assert_eq!(views[0].exit_code, Some(1));
        // The second inspect fails; the list record stands.
        assert_eq!(views[1].name, "job");
        assert_eq!(views[1].state, ContainerState::Running);
        assert_eq!(views[1].exit_code, None);

        let calls = fake.calls();
        assert_eq!(calls[0], Call::ListContainers(true));
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn listing_errors_propagate() {
        let client = DisconnectedClient::new("no socket");
        assert!(matches!(
            images(&client).await.unwrap_err(),
            ApiError::NotConnected(_)
        ));
        assert!(matches!(
            volumes(&client).await.unwrap_err(),
            ApiError::NotConnected(_)
        ));
    }

    #[tokio::test]
    async fn single_container_comes_from_inspect() {
        let fake = FakeClient::new().with_inspect(
            "web",
            json!({ "Id": "abcdef0123456789", "Name": "/web", "State": { "Status": "paused" } }),
        );
        let view = container(&fake, "web").await.unwrap();
        assert_eq!(view.id, "abcdef012345");
        assert_eq!(view.state, ContainerState::Paused);

        let err = container(&fake, "ghost").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
