//! Command tree and dispatch
//!
//! `Cli::parse` builds the whole tree once in `main`. Dispatch takes the
//! controller as an argument so nothing here reaches for global state.

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use crate::config::{Config, PlaneSpec};
use crate::controller::Controller;
use crate::platform::Platform;
use crate::runtime::RuntimeGateway;
use crate::Result;

#[derive(Parser, Debug)]
#[command(name = "openv")]
#[command(about = "Brings a local container orchestration test environment up and down")]
#[command(version)]
pub struct Cli {
    /// Show debug level logs in developer friendly format
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Brings up/down the Kubernetes cluster
    Kubernetes {
        #[command(subcommand)]
        action: Lifecycle,
    },
    /// Brings up/down the OpenShift cluster
    #[command(name = "openshift")]
    OpenShift {
        #[command(subcommand)]
        action: Lifecycle,
    },
    /// Show application version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum Lifecycle {
    /// Brings up the cluster
    Up {
        /// Nodes count
        #[arg(long, default_value = "1")]
        nodes: u32,
        #[command(flatten)]
        plane: PlaneArgs,
    },
    /// Shut down the cluster
    Down {
        #[command(flatten)]
        plane: PlaneArgs,
    },
}

/// Selects the images a plane is made of.
#[derive(Args, Debug, Clone, Default)]
pub struct PlaneArgs {
    /// Orchestration platform engine version
    #[arg(long = "engv")]
    pub engine_version: Option<String>,
    /// JSON file describing the plane images
    #[arg(long = "plane")]
    pub plane_file: Option<PathBuf>,
}

impl PlaneArgs {
    fn plane(&self) -> Result<PlaneSpec> {
        match (&self.plane_file, &self.engine_version) {
            (Some(path), _) => PlaneSpec::from_file(path),
            (None, Some(version)) => Ok(PlaneSpec::for_version(version.as_str())),
            (None, None) => Ok(PlaneSpec::default()),
        }
    }
}

/// What one invocation asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up(Platform),
    Down,
}

impl Cli {
    /// Controller action, `None` for commands that don't need one.
    pub fn action(&self) -> Option<Action> {
        match &self.command {
            Commands::Kubernetes { action } => Some(lifecycle_action(action, Platform::Kubernetes)),
            Commands::OpenShift { action } => Some(lifecycle_action(action, Platform::OpenShift)),
            Commands::Version => None,
        }
    }

    /// Resolve the invocation's configuration from its flags.
    pub fn config(&self) -> Result<Config> {
        let mut config = Config {
            log_verbose: self.verbose,
            ..Default::default()
        };

        let lifecycle = match &self.command {
            Commands::Kubernetes { action } | Commands::OpenShift { action } => Some(action),
            Commands::Version => None,
        };
        let plane_args = match lifecycle {
            Some(Lifecycle::Up { nodes, plane }) => {
                config.nodes = *nodes;
                Some(plane)
            }
            Some(Lifecycle::Down { plane }) => Some(plane),
            None => None,
        };
        if let Some(args) = plane_args {
            config.engine_version = args.engine_version.clone();
            config.plane = args.plane()?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn lifecycle_action(action: &Lifecycle, platform: Platform) -> Action {
    match action {
        Lifecycle::Up { .. } => Action::Up(platform),
        Lifecycle::Down { .. } => Action::Down,
    }
}

/// Run `action` against `controller`.
pub async fn execute<G: RuntimeGateway>(
    action: Action,
    controller: &mut Controller<G>,
    cancel: &CancellationToken,
) -> Result<()> {
    match action {
        Action::Up(platform) => controller.up(cancel, platform).await,
        Action::Down => controller.down(cancel).await,
    }
}
