//! Environment lifecycle controller: `up` and `down` per platform

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::config::PlaneSpec;
use crate::plane::{PlaneOrchestrator, PlaneState};
use crate::platform::Platform;
use crate::runtime::{ensure_active, short_id, RuntimeGateway};
use crate::{Error, Result};

/// Drives one test environment at a time.
pub struct Controller<G> {
    gateway: Arc<G>,
    orchestrator: PlaneOrchestrator<G>,
}

impl<G: RuntimeGateway> Controller<G> {
    pub fn new(gateway: G, plane: PlaneSpec) -> Self {
        Self::with_shared(Arc::new(gateway), plane)
    }

    pub fn with_shared(gateway: Arc<G>, plane: PlaneSpec) -> Self {
        Self {
            orchestrator: PlaneOrchestrator::new(gateway.clone(), plane),
            gateway,
        }
    }

    pub fn plane(&self) -> &PlaneSpec {
        self.orchestrator.plane()
    }

    pub fn plane_state(&self) -> PlaneState {
        self.orchestrator.state()
    }

    pub async fn up(&mut self, cancel: &CancellationToken, platform: Platform) -> Result<()> {
        match platform {
            Platform::Kubernetes => {
                tracing::info!(platform = %platform, "Starting the Kubernetes cluster");
                self.orchestrator
                    .create_control_plane(cancel)
                    .await
                    .map_err(|e| {
                        if e.is_cancelled() {
                            e
                        } else {
                            Error::ControlPlane(Box::new(e))
                        }
                    })?;
                tracing::info!(platform = %platform, "Control plane created");
                Ok(())
            }
            Platform::OpenShift => Err(Error::UnsupportedPlatform(platform)),
        }
    }

    /// Remove every running container created from one of the plane's images.
    pub async fn down(&self, cancel: &CancellationToken) -> Result<()> {
        self.teardown(cancel).await.map_err(|e| {
            if e.is_cancelled() {
                e
            } else {
                Error::Teardown(Box::new(e))
            }
        })
    }

    async fn teardown(&self, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel, "teardown")?;
        let plane = self.orchestrator.plane();
        let containers = self.gateway.list_containers(cancel).await?;

        let owned: Vec<_> = containers
            .into_iter()
            .filter(|c| plane.owns_image(&c.image))
            .collect();
        tracing::info!(count = owned.len(), "Shutting down environment");

        for container in owned {
            let short = short_id(&container.id).to_string();
            self.gateway
                .remove_container(cancel, &container.id, true)
                .await
                .map_err(|e| Error::Cleanup {
                    container: short.clone(),
                    source: Box::new(e),
                })?;
            tracing::info!(container = %short, image = %container.image, "Container removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::runtime::{ContainerInfo, MockRuntimeGateway};

    fn container(id: &str, image: &str) -> ContainerInfo {
        ContainerInfo {
            id: id.to_string(),
            names: vec![format!("/{id}")],
            image: image.to_string(),
        }
    }

    #[tokio::test]
    async fn test_openshift_is_unsupported() {
        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_list_images().never();
        gateway.expect_pull_image().never();
        gateway.expect_create_container().never();
        gateway.expect_start_container().never();
        gateway.expect_list_containers().never();
        gateway.expect_remove_container().never();

        let mut controller = Controller::new(gateway, PlaneSpec::default());
        let err = controller
            .up(&CancellationToken::new(), Platform::OpenShift)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedPlatform(Platform::OpenShift)));
        assert_eq!(controller.plane_state(), PlaneState::Idle);
    }

    #[tokio::test]
    async fn test_down_list_failure_aborts() {
        let mut gateway = MockRuntimeGateway::new();
        gateway
            .expect_list_containers()
            .returning(|_| Err(Error::ContainerList(ClientError::Other("daemon gone".into()))));
        gateway.expect_remove_container().never();

        let controller = Controller::new(gateway, PlaneSpec::default());
        let err = controller.down(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(
            crate::error::report(&err),
            "environment shutdown error: can't fetch containers list: daemon gone"
        );
    }

    #[tokio::test]
    async fn test_down_remove_failure_names_short_id() {
        let plane = PlaneSpec::default();
        let etcd = plane.etcd_image.clone();
        let master = plane.master_image.clone();

        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_list_containers().returning(move |_| {
            Ok(vec![
                container("aaaaaaaaaaaa1111", &etcd),
                container("bbbbbbbbbbbb2222", &master),
            ])
        });
        gateway
            .expect_remove_container()
            .withf(|_, target, force| target == "aaaaaaaaaaaa1111" && *force)
            .times(1)
            .returning(|_, target, _| {
                Err(Error::ContainerRemove {
                    target: target.to_string(),
                    source: ClientError::NotFound(target.to_string()),
                })
            });

        let controller = Controller::new(gateway, plane);
        let err = controller.down(&CancellationToken::new()).await.unwrap_err();

        match &err {
            Error::Teardown(inner) => assert!(matches!(
                inner.as_ref(),
                Error::Cleanup { container, .. } if container == "aaaaaaaaaa"
            )),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_down_cancelled_makes_no_calls() {
        let mut gateway = MockRuntimeGateway::new();
        gateway.expect_list_containers().never();
        gateway.expect_remove_container().never();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let controller = Controller::new(gateway, PlaneSpec::default());
        let err = controller.down(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
