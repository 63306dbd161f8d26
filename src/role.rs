//! Control plane roles and their container launch descriptors

use serde::{Deserialize, Serialize};
use crate::config::PlaneSpec;

/// Host network mode shared by every plane container.
pub const HOST_NETWORK: &str = "host";

/// Runtime socket mounted into the master so the kubelet can drive containers.
pub const RUNTIME_SOCKET: &str = "/var/run/docker.sock";

/// Retry budget of the runtime-level restart policy.
pub const MAX_RESTARTS: u32 = 5;

const CONTAINER_PREFIX: &str = "op-env-";

/// One of the fixed responsibilities the controller provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Etcd,
    Master,
    Proxy,
}

impl Role {
    /// Launch order. Master and proxy expect etcd to exist first.
    pub const ALL: [Role; 3] = [Role::Etcd, Role::Master, Role::Proxy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Etcd => "etcd",
            Role::Master => "master",
            Role::Proxy => "proxy",
        }
    }

    /// Runtime container name, `op-env-<role>`.
    pub fn container_name(&self) -> String {
        format!("{}{}", CONTAINER_PREFIX, self.as_str())
    }

    fn command(&self) -> Vec<String> {
        let args: &[&str] = match self {
            Role::Etcd => &[
                "/usr/local/bin/etcd",
                "start",
                "--addr=127.0.0.1:4001",
                "--bind-addr=0.0.0.0:4001",
                "--data-dir=/var/etcd/data",
            ],
            Role::Master => &[
                "/hyperkube",
                "kubelet",
                "--api_servers=http://localhost:8080",
                "--v=2",
                "--address=0.0.0.0",
                "--enable-server",
                "--hostname_override=127.0.0.1",
                "--config=/etc/kubernetes/manifests",
            ],
            Role::Proxy => &[
                "/hyperkube",
                "proxy",
                "--master=http://127.0.0.1:8080",
                "--v=2",
            ],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime restart behavior kinds, named as the Docker Engine names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartKind {
    No,
    Always,
    OnFailure,
    UnlessStopped,
}

impl RestartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartKind::No => "no",
            RestartKind::Always => "always",
            RestartKind::OnFailure => "on-failure",
            RestartKind::UnlessStopped => "unless-stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    pub kind: RestartKind,
    /// Only meaningful for `on-failure`.
    pub max_retries: u32,
}

impl RestartPolicy {
    pub fn on_failure(max_retries: u32) -> Self {
        Self {
            kind: RestartKind::OnFailure,
            max_retries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    pub source: String,
    pub target: String,
}

/// Everything the runtime needs to create one role container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: Role,
    pub image: String,
    pub command: Vec<String>,
    pub network_mode: String,
    pub restart_policy: RestartPolicy,
    pub mounts: Vec<BindMount>,
    pub privileged: bool,
}

impl RoleSpec {
    /// Derive the launch descriptor for `role` from the plane description.
    pub fn for_role(role: Role, plane: &PlaneSpec) -> Self {
        let mounts = match role {
            Role::Master => vec![BindMount {
                source: RUNTIME_SOCKET.to_string(),
                target: RUNTIME_SOCKET.to_string(),
            }],
            Role::Etcd | Role::Proxy => Vec::new(),
        };

        Self {
            role,
            image: plane.image_for(role).to_string(),
            command: role.command(),
            network_mode: HOST_NETWORK.to_string(),
            restart_policy: RestartPolicy::on_failure(MAX_RESTARTS),
            mounts,
            privileged: role == Role::Proxy,
        }
    }

    pub fn container_name(&self) -> String {
        self.role.container_name()
    }
}
