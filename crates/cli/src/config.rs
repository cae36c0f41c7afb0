//! Command-line configuration.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sidecar_core::catalog::{local, topology};
use sidecar_core::source::DEFAULT_PROPERTIES_FILE;
use sidecar_core::{ConfigResolver, DynamicProperties, Environment, Setting, SettingType};
use tracing::debug;

use crate::commands::Command;

/// Inspect the configuration and topology a cache-node sidecar would use
#[derive(Parser, Debug)]
#[command(name = "cache-sidecar", author, version, about, long_about = None)]
pub struct CliConfig {
    /// YAML properties file (defaults to ./sidecar.yml when present)
    #[arg(long, global = true)]
    pub properties: Option<PathBuf>,

    /// Deployment kind: ec2-classic, ec2-default-vpc, ec2-vpc or local
    #[arg(long, global = true)]
    pub deployment: Option<String>,

    /// Availability zone for local deployments
    #[arg(long, global = true)]
    pub zone: Option<String>,

    /// Hostname for local deployments
    #[arg(long, global = true)]
    pub hostname: Option<String>,

    /// IP address for local deployments
    #[arg(long, global = true)]
    pub ip: Option<String>,

    /// Instance id for local deployments
    #[arg(long, global = true)]
    pub instance_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(&self) -> anyhow::Result<()> {
        let resolver = self.resolver()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.command.execute(&resolver, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Resolver over the process environment with command-line overrides on
    /// top, backed by the properties file.
    pub fn resolver(&self) -> anyhow::Result<ConfigResolver> {
        let properties = Arc::new(DynamicProperties::new());
        match &self.properties {
            Some(path) => {
                let count = properties
                    .load_file(path)
                    .with_context(|| format!("loading properties from {}", path.display()))?;
                debug!(path = %path.display(), count, "loaded properties");
            }
            None if Path::new(DEFAULT_PROPERTIES_FILE).exists() => {
                properties
                    .load_file(DEFAULT_PROPERTIES_FILE)
                    .with_context(|| format!("loading properties from {DEFAULT_PROPERTIES_FILE}"))?;
            }
            None => {}
        }

        Ok(ConfigResolver::new(Arc::new(self.environment()), properties))
    }

    /// Flags become overrides of the matching settings' environment aliases.
    pub fn environment(&self) -> CliEnvironment {
        let mut env = CliEnvironment::default();
        env.set(&topology::DEPLOYMENT, self.deployment.as_deref());
        env.set(&local::ZONE, self.zone.as_deref());
        env.set(&local::HOSTNAME, self.hostname.as_deref());
        env.set(&local::IP, self.ip.as_deref());
        env.set(&local::INSTANCE_ID, self.instance_id.as_deref());
        env
    }
}

/// Process environment with command-line overrides taking precedence.
#[derive(Debug, Clone, Default)]
pub struct CliEnvironment {
    overrides: HashMap<String, String>,
}

impl CliEnvironment {
    fn set<T: SettingType>(&mut self, setting: &Setting<T>, value: Option<&str>) {
        if let (Some(name), Some(value)) = (setting.env(), value) {
            self.overrides.insert(name.to_string(), value.to_string());
        }
    }

    pub fn overrides(&self) -> &HashMap<String, String> {
        &self.overrides
    }
}

impl Environment for CliEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.overrides
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }
}
