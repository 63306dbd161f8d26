//! Container runtime gateway
//!
//! The capability surface the controller needs from a container engine:
//! image listing and pulling, and container create/start/list/remove.
//! Calls are pass-through. Nothing here retries; automatic restarts are
//! the runtime's job, configured through the restart policy at creation.

pub mod docker;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use crate::error::ClientError;
use crate::role::RoleSpec;
use crate::{Error, Result};

pub use docker::DockerGateway;

/// Opaque runtime identifier of a created container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// First ten characters, the way the runtime CLI prints ids.
    pub fn short_id(&self) -> &str {
        short_id(&self.0)
    }
}

impl std::fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_id())
    }
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(10) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// A container as reported by the runtime's list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
}

/// One record of an image pull progress stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullProgress {
    /// Layer the record refers to, if any.
    pub layer: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    /// Set when the runtime reports a failure inside the stream.
    pub error: Option<String>,
}

pub type PullStream = BoxStream<'static, std::result::Result<PullProgress, ClientError>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeGateway: Send + Sync {
    /// References (repository tags) of locally available images.
    async fn list_images(&self, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// Start pulling `image`. The pull is complete only once the returned
    /// stream is exhausted.
    async fn pull_image(&self, cancel: &CancellationToken, image: &str) -> Result<PullStream>;

    async fn create_container(
        &self,
        cancel: &CancellationToken,
        spec: &RoleSpec,
        name: &str,
    ) -> Result<ContainerHandle>;

    async fn start_container(&self, cancel: &CancellationToken, handle: &ContainerHandle) -> Result<()>;

    /// Running containers.
    async fn list_containers(&self, cancel: &CancellationToken) -> Result<Vec<ContainerInfo>>;

    /// Remove a container by name or id.
    async fn remove_container(&self, cancel: &CancellationToken, target: &str, force: bool) -> Result<()>;
}

/// Fail with `Cancelled` when the token has fired.
pub fn ensure_active(cancel: &CancellationToken, op: &str) -> Result<()> {
    if cancel.is_cancelled() {
        tracing::warn!(op, "Received shutdown command");
        return Err(Error::cancelled(op));
    }
    Ok(())
}
