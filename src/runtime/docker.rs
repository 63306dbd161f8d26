//! Docker Engine implementation of the runtime gateway

use async_trait::async_trait;
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::models::{
    CreateImageInfo, HostConfig, Mount, MountTypeEnum, RestartPolicy, RestartPolicyNameEnum,
};
use bollard::Docker;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use crate::error::ClientError;
use crate::role::{RestartKind, RoleSpec};
use crate::runtime::{
    ensure_active, ContainerHandle, ContainerInfo, PullProgress, PullStream, RuntimeGateway,
};
use crate::{Error, Result};

/// Gateway over a local Docker daemon.
pub struct DockerGateway {
    docker: Docker,
}

impl DockerGateway {
    /// Connect using `DOCKER_HOST` or the platform's default socket.
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::RuntimeClientInit(ClientError::from(e)))?;
        Ok(Self { docker })
    }
}

fn client_error(err: bollard::errors::Error, object: &str) -> ClientError {
    match err {
        bollard::errors::Error::DockerResponseServerError { status_code: 404, .. } => {
            ClientError::NotFound(object.to_string())
        }
        other => ClientError::Docker(other),
    }
}

fn restart_policy(spec: &RoleSpec) -> RestartPolicy {
    let name = match spec.restart_policy.kind {
        RestartKind::No => RestartPolicyNameEnum::NO,
        RestartKind::Always => RestartPolicyNameEnum::ALWAYS,
        RestartKind::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
        RestartKind::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
    };
    RestartPolicy {
        name: Some(name),
        maximum_retry_count: Some(i64::from(spec.restart_policy.max_retries)),
    }
}

fn container_config(spec: &RoleSpec) -> ContainerConfig<String> {
    let mounts: Vec<Mount> = spec
        .mounts
        .iter()
        .map(|m| Mount {
            typ: Some(MountTypeEnum::BIND),
            source: Some(m.source.clone()),
            target: Some(m.target.clone()),
            ..Default::default()
        })
        .collect();

    let host_config = HostConfig {
        network_mode: Some(spec.network_mode.clone()),
        restart_policy: Some(restart_policy(spec)),
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        privileged: Some(spec.privileged),
        ..Default::default()
    };

    ContainerConfig {
        image: Some(spec.image.clone()),
        cmd: Some(spec.command.clone()),
        host_config: Some(host_config),
        ..Default::default()
    }
}

impl From<CreateImageInfo> for PullProgress {
    fn from(info: CreateImageInfo) -> Self {
        Self {
            layer: info.id,
            status: info.status,
            progress: info.progress,
            error: info.error,
        }
    }
}

#[async_trait]
impl RuntimeGateway for DockerGateway {
    async fn list_images(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        ensure_active(cancel, "list images")?;
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(|e| Error::ImageResolution {
                op: "list",
                image: None,
                source: ClientError::from(e),
            })?;

        Ok(images.into_iter().flat_map(|image| image.repo_tags).collect())
    }

    async fn pull_image(&self, cancel: &CancellationToken, image: &str) -> Result<PullStream> {
        ensure_active(cancel, "pull image")?;
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let object = image.to_string();
        let stream = self
            .docker
            .create_image(Some(options), None, None)
            .map(move |item| item.map(PullProgress::from).map_err(|e| client_error(e, &object)));
        Ok(stream.boxed())
    }

    async fn create_container(
        &self,
        cancel: &CancellationToken,
        spec: &RoleSpec,
        name: &str,
    ) -> Result<ContainerHandle> {
        ensure_active(cancel, "create container")?;
        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };
        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(|e| Error::ContainerCreate {
                name: name.to_string(),
                source: client_error(e, name),
            })?;

        for warning in &response.warnings {
            tracing::warn!(container = %name, warning = %warning, "Runtime warning on create");
        }
        Ok(ContainerHandle::new(response.id))
    }

    async fn start_container(&self, cancel: &CancellationToken, handle: &ContainerHandle) -> Result<()> {
        ensure_active(cancel, "start container")?;
        self.docker
            .start_container(handle.id(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::ContainerStart {
                id: handle.id().to_string(),
                source: client_error(e, handle.id()),
            })
    }

    async fn list_containers(&self, cancel: &CancellationToken) -> Result<Vec<ContainerInfo>> {
        ensure_active(cancel, "list containers")?;
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(|e| Error::ContainerList(ClientError::from(e)))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerInfo {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
            })
            .collect())
    }

    async fn remove_container(&self, cancel: &CancellationToken, target: &str, force: bool) -> Result<()> {
        ensure_active(cancel, "remove container")?;
        let options = RemoveContainerOptions {
            force,
            v: true,
            link: false,
        };
        self.docker
            .remove_container(target, Some(options))
            .await
            .map_err(|e| Error::ContainerRemove {
                target: target.to_string(),
                source: client_error(e, target),
            })
    }
}
