//! Error types for topology discovery and membership.

use thiserror::Error;

/// Fatal conditions that stop identity resolution.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// No source produced a datacenter.
    #[error("datacenter could not be determined from overrides, properties or instance metadata")]
    MissingDatacenter,

    /// No source produced a rack name.
    #[error("rack could not be determined for datacenter {datacenter}")]
    MissingRack { datacenter: String },

    /// The configured deployment kind is not recognized.
    #[error(
        "unknown deployment kind {0:?} (expected ec2-classic, ec2-default-vpc, ec2-vpc or local)"
    )]
    UnknownDeployment(String),

    /// The HTTP client for the metadata endpoint could not be built.
    #[error("failed to build metadata client: {0}")]
    MetadataClient(#[source] reqwest::Error),
}

/// Failures reported by a control-plane client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlPlaneError {
    /// The requested fact does not exist yet; retrying may help.
    #[error("not yet available: {0}")]
    NotYetAvailable(String),

    /// The request itself failed.
    #[error("control plane request failed: {0}")]
    Request(String),

    /// No credentials to build a client with.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}

/// Failures of a membership source.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// The membership source cannot perform this operation.
    #[error("operation not supported by this membership source: {operation}")]
    Unsupported { operation: &'static str },

    /// The membership document could not be read.
    #[error("failed to read membership document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The membership document is not a datacenter -> rack -> lines mapping.
    #[error("malformed membership document: {0}")]
    Malformed(String),
}

impl MembershipError {
    pub fn unsupported(operation: &'static str) -> Self {
        MembershipError::Unsupported { operation }
    }

    /// True for capability errors, as opposed to document errors.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MembershipError::Unsupported { .. })
    }
}

/// Credentials could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("missing credential variable {0}")]
    Missing(&'static str),
}
