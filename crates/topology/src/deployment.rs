//! Where the sidecar runs.

use std::fmt;
use std::str::FromStr;

use sidecar_core::catalog::topology;
use sidecar_core::ConfigResolver;

use crate::error::TopologyError;

/// Deployment environment; selects the metadata source and whether the
/// control plane is consulted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Deployment {
    Ec2Classic,
    Ec2DefaultVpc,
    #[default]
    Ec2Vpc,
    Local,
}

impl Deployment {
    /// Read `dm.deployment`. An unknown value is an error rather than a
    /// silent fallback, since it decides whether the control plane is used.
    pub fn from_resolver(resolver: &ConfigResolver) -> Result<Self, TopologyError> {
        resolver.resolve(&topology::DEPLOYMENT).parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::Ec2Classic => "ec2-classic",
            Deployment::Ec2DefaultVpc => "ec2-default-vpc",
            Deployment::Ec2Vpc => "ec2-vpc",
            Deployment::Local => "local",
        }
    }

    /// Instance metadata and control plane are available.
    pub fn is_cloud(&self) -> bool {
        !matches!(self, Deployment::Local)
    }

    pub fn is_vpc(&self) -> bool {
        matches!(self, Deployment::Ec2DefaultVpc | Deployment::Ec2Vpc)
    }
}

impl FromStr for Deployment {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ec2-classic" => Ok(Deployment::Ec2Classic),
            "ec2-default-vpc" => Ok(Deployment::Ec2DefaultVpc),
            "ec2-vpc" => Ok(Deployment::Ec2Vpc),
            "local" => Ok(Deployment::Local),
            _ => Err(TopologyError::UnknownDeployment(s.to_string())),
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
