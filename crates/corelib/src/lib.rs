//! Core library for the cache-node sidecar.
//!
//! This crate provides the configuration layer every feature area reads:
//! - Typed setting declarations and the catalog of all tunables
//! - Environment and live property sources
//! - The precedence-based resolver
//! - A typed facade over the catalog
//! - The node identity produced by topology discovery

pub mod catalog;
pub mod error;
pub mod node;
pub mod resolver;
pub mod setting;
pub mod sidecar;
pub mod source;

pub use error::{Error, Result};
pub use node::Identity;
pub use resolver::ConfigResolver;
pub use setting::{AnySetting, Setting, SettingKind, SettingType};
pub use sidecar::{BackupSchedule, SidecarConfig};
pub use source::{
    DynamicProperties, Environment, MapEnvironment, ProcessEnvironment, PropertySource,
    PropertyValue,
};
