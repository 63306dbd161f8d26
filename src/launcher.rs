//! Role container launch: image check, create, start

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::config::PlaneSpec;
use crate::error::LaunchStep;
use crate::image::ImageResolver;
use crate::role::{Role, RoleSpec};
use crate::runtime::{ensure_active, ContainerHandle, RuntimeGateway};
use crate::Result;

/// Realizes one role container on the runtime.
pub struct RoleLauncher<G> {
    gateway: Arc<G>,
    images: ImageResolver<G>,
}

impl<G: RuntimeGateway> RoleLauncher<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            images: ImageResolver::new(gateway.clone()),
            gateway,
        }
    }

    /// Launch `role` and return its handle once the container has started.
    pub async fn launch(
        &self,
        cancel: &CancellationToken,
        role: Role,
        plane: &PlaneSpec,
    ) -> Result<ContainerHandle> {
        let spec = RoleSpec::for_role(role, plane);
        ensure_active(cancel, &format!("{} launch", role))?;

        self.images
            .ensure_image(cancel, &spec.image)
            .await
            .map_err(|e| e.in_role(role, LaunchStep::CheckImage))?;

        let name = spec.container_name();
        let handle = self
            .gateway
            .create_container(cancel, &spec, &name)
            .await
            .map_err(|e| e.in_role(role, LaunchStep::Create))?;
        tracing::debug!(role = %role, container = %name, id = %handle, "Container created");

        self.gateway
            .start_container(cancel, &handle)
            .await
            .map_err(|e| e.in_role(role, LaunchStep::Start))?;

        Ok(handle)
    }
}
