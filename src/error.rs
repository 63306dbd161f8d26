//! Error types for the control plane controller

use thiserror::Error;
use crate::platform::Platform;
use crate::role::Role;

/// Cause reported by the container runtime itself.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no such object: {0}")]
    NotFound(String),

    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound(_) => true,
            ClientError::Docker(bollard::errors::Error::DockerResponseServerError {
                status_code,
                ..
            }) => *status_code == 404,
            _ => false,
        }
    }
}

/// Launch step a role failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStep {
    CheckImage,
    Create,
    Start,
}

impl std::fmt::Display for LaunchStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchStep::CheckImage => write!(f, "check image"),
            LaunchStep::Create => write!(f, "create"),
            LaunchStep::Start => write!(f, "start"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{op}: shutdown requested")]
    Cancelled { op: String },

    #[error("can't {op} {}", image_target(.image))]
    ImageResolution {
        op: &'static str,
        image: Option<String>,
        #[source]
        source: ClientError,
    },

    #[error("can't create container {name}")]
    ContainerCreate {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("can't start container {id}")]
    ContainerStart {
        id: String,
        #[source]
        source: ClientError,
    },

    #[error("can't fetch containers list")]
    ContainerList(#[source] ClientError),

    #[error("can't remove container {target}")]
    ContainerRemove {
        target: String,
        #[source]
        source: ClientError,
    },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(Platform),

    #[error("container runtime client creation failed")]
    RuntimeClientInit(#[source] ClientError),

    #[error("{role}: failed to {step}")]
    Role {
        role: Role,
        step: LaunchStep,
        #[source]
        source: Box<Error>,
    },

    #[error("plane: failed to create {role}")]
    Plane {
        role: Role,
        #[source]
        source: Box<Error>,
    },

    #[error("can't create control plane")]
    ControlPlane(#[source] Box<Error>),

    #[error("can't complete cleanup, container {container}")]
    Cleanup {
        container: String,
        #[source]
        source: Box<Error>,
    },

    #[error("environment shutdown error")]
    Teardown(#[source] Box<Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn image_target(image: &Option<String>) -> String {
    match image {
        Some(image) => format!("image {}", image),
        None => "local images".to_string(),
    }
}

impl Error {
    pub fn cancelled(op: impl Into<String>) -> Self {
        Error::Cancelled { op: op.into() }
    }

    /// True when cancellation, not a failure, ended the operation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled { .. } => true,
            Error::Role { source, .. }
            | Error::Plane { source, .. }
            | Error::Cleanup { source, .. } => source.is_cancelled(),
            Error::ControlPlane(source) | Error::Teardown(source) => source.is_cancelled(),
            _ => false,
        }
    }

    /// True when the runtime reported the target object as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ContainerRemove { source, .. }
            | Error::ContainerStart { source, .. }
            | Error::ImageResolution { source, .. } => source.is_not_found(),
            Error::Role { source, .. }
            | Error::Plane { source, .. }
            | Error::Cleanup { source, .. } => source.is_not_found(),
            Error::ControlPlane(source) | Error::Teardown(source) => source.is_not_found(),
            _ => false,
        }
    }

    /// Attach the role and launch step. Cancellation is passed through as is.
    pub fn in_role(self, role: Role, step: LaunchStep) -> Self {
        if self.is_cancelled() {
            return self;
        }
        Error::Role {
            role,
            step,
            source: Box::new(self),
        }
    }

    /// Attach the plane stage. Cancellation is passed through as is.
    pub fn in_stage(self, role: Role) -> Self {
        if self.is_cancelled() {
            return self;
        }
        Error::Plane {
            role,
            source: Box::new(self),
        }
    }
}

/// Render an error and its whole cause chain as `outer: inner: root`.
pub fn report(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        cause = inner.source();
    }
    out
}
