//! Control plane sequencing
//!
//! Cleans up containers left by a previous run, then launches etcd, master
//! and proxy strictly in that order. Cancellation is checked before every
//! stage transition.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::config::PlaneSpec;
use crate::launcher::RoleLauncher;
use crate::role::Role;
use crate::runtime::{ensure_active, RuntimeGateway};
use crate::Result;

/// Progress of a control plane bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneState {
    Idle,
    Cleaning,
    LaunchingEtcd,
    LaunchingMaster,
    LaunchingProxy,
    Ready,
    Failed,
    Cancelled,
}

impl PlaneState {
    fn launching(role: Role) -> Self {
        match role {
            Role::Etcd => PlaneState::LaunchingEtcd,
            Role::Master => PlaneState::LaunchingMaster,
            Role::Proxy => PlaneState::LaunchingProxy,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaneState::Ready | PlaneState::Failed | PlaneState::Cancelled)
    }
}

impl std::fmt::Display for PlaneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaneState::Idle => write!(f, "Idle"),
            PlaneState::Cleaning => write!(f, "Cleaning"),
            PlaneState::LaunchingEtcd => write!(f, "LaunchingEtcd"),
            PlaneState::LaunchingMaster => write!(f, "LaunchingMaster"),
            PlaneState::LaunchingProxy => write!(f, "LaunchingProxy"),
            PlaneState::Ready => write!(f, "Ready"),
            PlaneState::Failed => write!(f, "Failed"),
            PlaneState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

pub struct PlaneOrchestrator<G> {
    gateway: Arc<G>,
    launcher: RoleLauncher<G>,
    plane: PlaneSpec,
    state: PlaneState,
}

impl<G: RuntimeGateway> PlaneOrchestrator<G> {
    pub fn new(gateway: Arc<G>, plane: PlaneSpec) -> Self {
        Self {
            launcher: RoleLauncher::new(gateway.clone()),
            gateway,
            plane,
            state: PlaneState::Idle,
        }
    }

    pub fn plane(&self) -> &PlaneSpec {
        &self.plane
    }

    pub fn state(&self) -> PlaneState {
        self.state
    }

    /// Bring up etcd, master and proxy after removing any stale containers.
    pub async fn create_control_plane(&mut self, cancel: &CancellationToken) -> Result<()> {
        let result = self.run(cancel).await;
        self.state = match &result {
            Ok(()) => PlaneState::Ready,
            Err(e) if e.is_cancelled() => PlaneState::Cancelled,
            Err(_) => PlaneState::Failed,
        };
        result
    }

    async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.transition(cancel, PlaneState::Cleaning)?;
        tracing::info!(version = %self.plane.version, "Baking control plane...");
        self.cleanup(cancel).await?;

        for role in Role::ALL {
            self.transition(cancel, PlaneState::launching(role))?;
            tracing::info!(role = %role, image = %self.plane.image_for(role), "Starting {}...", role);

            let handle = self
                .launcher
                .launch(cancel, role, &self.plane)
                .await
                .map_err(|e| e.in_stage(role))?;
            tracing::info!(role = %role, id = %handle, "{} created", role);
        }
        Ok(())
    }

    fn transition(&mut self, cancel: &CancellationToken, next: PlaneState) -> Result<()> {
        ensure_active(cancel, "control plane")?;
        tracing::debug!(from = %self.state, stage = %next, "Plane stage");
        self.state = next;
        Ok(())
    }

    /// Best effort. Nothing to remove is the normal case on a fresh host.
    async fn cleanup(&self, cancel: &CancellationToken) -> Result<()> {
        for role in Role::ALL {
            ensure_active(cancel, "cleanup")?;
            let name = role.container_name();
            match self.gateway.remove_container(cancel, &name, true).await {
                Ok(()) => tracing::info!(container = %name, "Removed stale container"),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(container = %name, "No stale container to remove");
                }
                Err(e) => {
                    tracing::warn!(container = %name, error = %e, "Cleanup control plane before start");
                }
            }
        }
        Ok(())
    }
}
