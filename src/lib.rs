//! Operator test environment
//!
//! Brings a minimal container orchestration control plane (etcd, master,
//! proxy) up on a local Docker daemon and tears it down again.
//!
//! # Example
//!
//! ```no_run
//! use op_env::{Controller, DockerGateway, PlaneSpec, Platform};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> op_env::Result<()> {
//! let plane = PlaneSpec::builder().version("v1.0.1").build_validated()?;
//! let mut controller = Controller::new(DockerGateway::connect()?, plane);
//! let cancel = CancellationToken::new();
//!
//! controller.up(&cancel, Platform::Kubernetes).await?;
//!
//! // Run operator tests against the plane...
//!
//! controller.down(&cancel).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod image;
pub mod launcher;
pub mod logger;
pub mod plane;
pub mod platform;
pub mod role;
pub mod runtime;

pub use config::{Config, PlaneSpec};
pub use controller::Controller;
pub use error::{ClientError, Error, Result};
pub use plane::{PlaneOrchestrator, PlaneState};
pub use platform::Platform;
pub use role::{Role, RoleSpec};
pub use runtime::{ContainerHandle, ContainerInfo, DockerGateway, RuntimeGateway};
