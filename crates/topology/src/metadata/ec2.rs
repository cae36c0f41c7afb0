use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use super::InstanceMetadata;

/// Link-local instance-metadata endpoint.
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

const MACS_PATH: &str = "network/interfaces/macs/";

/// Instance metadata read over HTTP from the cloud metadata endpoint.
#[derive(Debug, Clone)]
pub struct Ec2Metadata {
    client: Client,
    base_url: String,
}

impl Ec2Metadata {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_base_url(DEFAULT_METADATA_URL)
    }

    /// Point at another endpoint. A missing trailing `/` is added.
    pub fn with_base_url(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch(&self, path: &str) -> Option<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "metadata request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "metadata endpoint returned an error");
            return None;
        }

        match response.text() {
            Ok(body) => non_empty(body.trim()),
            Err(err) => {
                warn!(%url, error = %err, "failed to read metadata response");
                None
            }
        }
    }

    fn fetch_for_mac(&self, leaf: &str) -> Option<String> {
        let mac = self.mac()?;
        self.fetch(&format!("{MACS_PATH}{mac}/{leaf}"))
    }
}

impl InstanceMetadata for Ec2Metadata {
    fn zone(&self) -> Option<String> {
        self.fetch("placement/availability-zone")
    }

    fn public_hostname(&self) -> Option<String> {
        self.fetch("hostname")
    }

    fn public_ip(&self) -> Option<String> {
        self.fetch("local-ipv4")
    }

    fn instance_id(&self) -> Option<String> {
        self.fetch("instance-id")
    }

    fn instance_type(&self) -> Option<String> {
        self.fetch("instance-type")
    }

    fn mac(&self) -> Option<String> {
        self.fetch(MACS_PATH).and_then(|listing| first_mac(&listing))
    }

    fn vpc_id(&self) -> Option<String> {
        let vpc_id = self.fetch_for_mac("vpc-id");
        if vpc_id.is_none() {
            debug!("no vpc id for this instance; it may not run in a VPC");
        }
        vpc_id
    }

    fn security_group_name(&self) -> Option<String> {
        self.fetch_for_mac("security-groups")
    }
}

/// The listing is one `<mac>/` entry per interface.
fn first_mac(listing: &str) -> Option<String> {
    listing
        .lines()
        .map(|line| line.trim().trim_end_matches('/'))
        .find(|mac| !mac.is_empty())
        .map(str::to_string)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
