//! Plane and application configuration with builder pattern

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::role::Role;

/// Platform version used when none is requested.
pub const DEFAULT_VERSION: &str = "v1.0.1";

pub const DEFAULT_ETCD_IMAGE: &str = "gcr.io/google_containers/etcd:2.0.12";

const HYPERKUBE_REPOSITORY: &str = "gcr.io/google_containers/hyperkube";

/// Immutable description of the control plane to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneSpec {
    pub version: String,
    pub etcd_image: String,
    pub master_image: String,
    pub proxy_image: String,
}

impl Default for PlaneSpec {
    fn default() -> Self {
        Self::for_version(DEFAULT_VERSION)
    }
}

impl PlaneSpec {
    /// Default images with master and proxy pinned to `version`.
    pub fn for_version(version: impl Into<String>) -> Self {
        let version = version.into();
        let hyperkube = format!("{}:{}", HYPERKUBE_REPOSITORY, version);
        Self {
            version,
            etcd_image: DEFAULT_ETCD_IMAGE.to_string(),
            master_image: hyperkube.clone(),
            proxy_image: hyperkube,
        }
    }

    pub fn builder() -> PlaneSpecBuilder {
        PlaneSpecBuilder::default()
    }

    /// Load a JSON plane description.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let plane: PlaneSpec = serde_json::from_str(&raw)?;
        plane.validate()?;
        Ok(plane)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.version.trim().is_empty() {
            return Err(crate::Error::Config("version cannot be empty".into()));
        }
        for (role, image) in self.role_images() {
            if image.is_empty() {
                return Err(crate::Error::Config(format!("{} image cannot be empty", role)));
            }
            if image.chars().any(char::is_whitespace) {
                return Err(crate::Error::Config(format!(
                    "{} image contains whitespace: {:?}",
                    role, image
                )));
            }
        }
        Ok(())
    }

    pub fn image_for(&self, role: Role) -> &str {
        match role {
            Role::Etcd => &self.etcd_image,
            Role::Master => &self.master_image,
            Role::Proxy => &self.proxy_image,
        }
    }

    /// Role to image associations in launch order.
    pub fn role_images(&self) -> [(Role, &str); 3] {
        Role::ALL.map(|role| (role, self.image_for(role)))
    }

    /// Whether `image` is one of this plane's role images.
    pub fn owns_image(&self, image: &str) -> bool {
        let image = normalize_reference(image);
        self.role_images()
            .iter()
            .any(|(_, own)| normalize_reference(own) == image)
    }
}

/// Appends the implicit `:latest` tag the runtime adds to untagged references.
pub fn normalize_reference(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    if name.contains(':') || name.contains('@') {
        reference.to_string()
    } else {
        format!("{}:latest", reference)
    }
}

#[derive(Default)]
pub struct PlaneSpecBuilder {
    version: Option<String>,
    etcd_image: Option<String>,
    master_image: Option<String>,
    proxy_image: Option<String>,
}

impl PlaneSpecBuilder {
    /// Platform version. Master and proxy images follow it unless set explicitly.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn etcd_image(mut self, image: impl Into<String>) -> Self {
        self.etcd_image = Some(image.into());
        self
    }

    pub fn master_image(mut self, image: impl Into<String>) -> Self {
        self.master_image = Some(image.into());
        self
    }

    pub fn proxy_image(mut self, image: impl Into<String>) -> Self {
        self.proxy_image = Some(image.into());
        self
    }

    pub fn build(self) -> PlaneSpec {
        let base = PlaneSpec::for_version(self.version.as_deref().unwrap_or(DEFAULT_VERSION));
        PlaneSpec {
            etcd_image: self.etcd_image.unwrap_or(base.etcd_image),
            master_image: self.master_image.unwrap_or(base.master_image),
            proxy_image: self.proxy_image.unwrap_or(base.proxy_image),
            version: base.version,
        }
    }

    pub fn build_validated(self) -> crate::Result<PlaneSpec> {
        let plane = self.build();
        plane.validate()?;
        Ok(plane)
    }
}

/// Settings for one command invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_verbose: bool,
    pub nodes: u32,
    pub engine_version: Option<String>,
    pub plane: PlaneSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_verbose: false,
            nodes: 1,
            engine_version: None,
            plane: PlaneSpec::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.nodes < 1 {
            return Err(crate::Error::Config("nodes must be at least 1".into()));
        }
        self.plane.validate()
    }
}
