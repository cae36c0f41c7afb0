//! Multi-source setting resolution.
//!
//! Precedence, highest first:
//!
//! 1. The environment variable bound to the setting's alias, when present
//!    and non-empty. A value that does not parse as the declared type is
//!    logged and skipped.
//! 2. The property source, by the setting's key. Unparsable values are
//!    logged and skipped the same way.
//! 3. The declared default (or a runtime default, see
//!    [`ConfigResolver::resolve_or`]).
//!
//! Nothing is cached here. Every call reads the sources again, so updates to
//! a [`DynamicProperties`](crate::DynamicProperties) store are visible on the
//! next call.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::setting::{Setting, SettingType};
use crate::source::{Environment, ProcessEnvironment, PropertySource, PropertyValue};

/// Resolves [`Setting`]s against an environment and a property source.
///
/// Cheap to clone; clones share the same sources.
#[derive(Clone)]
pub struct ConfigResolver {
    env: Arc<dyn Environment>,
    properties: Arc<dyn PropertySource>,
}

impl ConfigResolver {
    pub fn new(env: Arc<dyn Environment>, properties: Arc<dyn PropertySource>) -> Self {
        Self { env, properties }
    }

    /// Resolver over the real process environment.
    pub fn with_process_env(properties: Arc<dyn PropertySource>) -> Self {
        Self::new(Arc::new(ProcessEnvironment), properties)
    }

    /// Resolve `setting` to a value of its declared type.
    pub fn resolve<T: SettingType>(&self, setting: &Setting<T>) -> T {
        self.lookup(setting)
            .unwrap_or_else(|| setting.default_value())
    }

    /// Like [`resolve`](Self::resolve), with `default` standing in for the
    /// declared default.
    pub fn resolve_or<T: SettingType>(&self, setting: &Setting<T>, default: T) -> T {
        self.lookup(setting).unwrap_or(default)
    }

    /// The value supplied by the environment or the property source, if any.
    pub fn lookup<T: SettingType>(&self, setting: &Setting<T>) -> Option<T> {
        if let Some(name) = setting.env() {
            if let Some(raw) = self.env_var(name) {
                match T::parse(&raw) {
                    Ok(value) => return Some(value),
                    Err(err) => warn!(
                        env = name,
                        key = setting.key(),
                        %err,
                        "environment override must be a {}, falling back to properties",
                        T::KIND
                    ),
                }
            }
        }

        let raw = self.properties.get(setting.key())?;
        match T::from_property(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    key = setting.key(),
                    %err,
                    "property must be a {}, falling back to default",
                    T::KIND
                );
                None
            }
        }
    }

    /// A non-empty environment variable. Empty values count as unset.
    pub fn env_var(&self, name: &str) -> Option<String> {
        self.env.var(name).filter(|value| !value.is_empty())
    }

    /// A raw value from the property source.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key)
    }
}

impl fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigResolver").finish_non_exhaustive()
    }
}
