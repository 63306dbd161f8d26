//! Target orchestration platform

use serde::{Deserialize, Serialize};

/// Orchestration platform a plane is brought up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Kubernetes,
    OpenShift,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Kubernetes, Platform::OpenShift];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Kubernetes => "kubernetes",
            Platform::OpenShift => "openshift",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::Config(format!("unknown platform: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::Kubernetes.to_string(), "kubernetes");
        assert_eq!(Platform::OpenShift.to_string(), "openshift");
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("kubernetes".parse::<Platform>().unwrap(), Platform::Kubernetes);
        assert_eq!("OpenShift".parse::<Platform>().unwrap(), Platform::OpenShift);
        assert!("nomad".parse::<Platform>().is_err());
    }
}
