//! Subcommands.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::json;
use sidecar_core::{catalog, ConfigResolver, SidecarConfig};
use sidecar_topology::{Membership, Topology, TopologyResolver, YamlMembership};

pub type CommandResult = anyhow::Result<()>;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve and print the node identity
    Identity {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve a single setting by its property key
    Get {
        /// Dotted property key, e.g. dm.dyno.rack
        key: String,
    },

    /// List every setting with its environment alias and resolved value
    Settings,

    /// Print the peers of the local rack
    Membership {
        /// Membership document (defaults to the configured path)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    pub fn execute(&self, resolver: &ConfigResolver, out: &mut dyn Write) -> CommandResult {
        match self {
            Command::Identity { json } => identity(resolver, *json, out),
            Command::Get { key } => get(resolver, key, out),
            Command::Settings => settings(resolver, out),
            Command::Membership { file, json } => membership(resolver, file.as_ref(), *json, out),
        }
    }
}

fn resolve_topology(resolver: &ConfigResolver) -> anyhow::Result<Topology> {
    let topology = TopologyResolver::from_config(resolver.clone())
        .context("configuring topology discovery")?
        .resolve()
        .context("resolving node identity")?;
    Ok(topology)
}

fn identity(resolver: &ConfigResolver, json: bool, out: &mut dyn Write) -> CommandResult {
    let topology = resolve_topology(resolver)?;
    let identity = topology.identity();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(identity)?)?;
        return Ok(());
    }

    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    writeln!(out, "deployment:  {}", topology.deployment())?;
    writeln!(out, "datacenter:  {}", identity.datacenter)?;
    writeln!(out, "rack:        {}", identity.rack)?;
    writeln!(out, "zone:        {}", or_dash(&identity.zone))?;
    writeln!(out, "zones:       {}", identity.zones.join(","))?;
    writeln!(out, "asg:         {}", or_dash(&identity.auto_scaling_group))?;
    writeln!(out, "instance:    {}", or_dash(&identity.instance_id))?;
    writeln!(out, "type:        {}", or_dash(&identity.instance_type))?;
    writeln!(out, "hostname:    {}", or_dash(&identity.public_hostname))?;
    writeln!(out, "ip:          {}", or_dash(&identity.public_ip))?;
    writeln!(out, "vpc:         {}", or_dash(&identity.vpc_id))?;
    Ok(())
}

fn get(resolver: &ConfigResolver, key: &str, out: &mut dyn Write) -> CommandResult {
    let setting = catalog::find(key).ok_or_else(|| anyhow!("unknown setting {key}"))?;
    writeln!(out, "{}", setting.resolve_display(resolver))?;
    Ok(())
}

fn settings(resolver: &ConfigResolver, out: &mut dyn Write) -> CommandResult {
    for setting in catalog::ALL {
        writeln!(
            out,
            "{}\t{}\t{}",
            setting.key(),
            setting.env().unwrap_or("-"),
            setting.resolve_display(resolver)
        )?;
    }
    Ok(())
}

fn membership(
    resolver: &ConfigResolver,
    file: Option<&PathBuf>,
    json: bool,
    out: &mut dyn Write,
) -> CommandResult {
    let topology = resolve_topology(resolver)?;
    let path = match file {
        Some(path) => path.clone(),
        None => PathBuf::from(SidecarConfig::new(resolver.clone()).membership_yaml()),
    };
    let membership = YamlMembership::for_topology(&path, &topology);
    let peers = membership.rack_membership();

    if json {
        let report = json!({
            "datacenter": membership.datacenter(),
            "rack": membership.rack(),
            "peers": peers,
            "rack_membership_size": membership.rack_membership_size(),
            "rack_count": membership.rack_count(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(out, "{}/{} ({})", membership.datacenter(), membership.rack(), path.display())?;
    for peer in &peers {
        writeln!(out, "  {peer}")?;
    }
    writeln!(
        out,
        "rack members: {}, configured racks: {}",
        membership.rack_membership_size(),
        membership.rack_count()
    )?;
    Ok(())
}
