//! Typed setting declarations.
//!
//! A [`Setting`] names one tunable: its dotted property key, an optional
//! environment-variable alias, and a default. The declared type is the type
//! parameter, so coercion from raw strings happens in exactly one place
//! ([`SettingType::parse`]) and a resolved value can never have a different
//! type than the one declared.
//!
//! Settings are declared as `const` items (see [`crate::catalog`]):
//!
//! ```rust
//! use sidecar_core::Setting;
//!
//! const CLIENT_PORT: Setting<u16> =
//!     Setting::with_env("dm.dynomite.client.port", "DM_DYNOMITE_CLIENT_PORT", 8102);
//!
//! assert_eq!(CLIENT_PORT.default_value(), 8102);
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::resolver::ConfigResolver;
use crate::source::PropertyValue;

/// The declared type of a setting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Boolean,
    Integer,
    String,
    OptionalString,
    StringList,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKind::Boolean => "boolean",
            SettingKind::Integer => "integer",
            SettingKind::String => "string",
            SettingKind::OptionalString => "optional string",
            SettingKind::StringList => "string list",
        };
        f.write_str(name)
    }
}

/// A Rust type a setting can resolve to.
///
/// `Default` is the `const`-friendly form of the default value (`&'static str`
/// for strings, a static slice for lists) so that settings can be declared as
/// constants.
pub trait SettingType: Clone + fmt::Debug + Send + Sync + Sized + 'static {
    /// Compile-time form of the declared default.
    type Default: Copy + fmt::Debug + Send + Sync + 'static;

    /// The declared kind reported for this type.
    const KIND: SettingKind;

    /// Coerce a raw string (environment variable or scalar property).
    fn parse(raw: &str) -> Result<Self>;

    /// Materialize the declared default.
    fn from_default(default: Self::Default) -> Self;

    /// Coerce a value from the property source.
    fn from_property(value: &PropertyValue) -> Result<Self> {
        match value {
            PropertyValue::Scalar(raw) => Self::parse(raw),
            PropertyValue::List(items) => Err(Error::invalid(Self::KIND, items.join(","))),
        }
    }

    /// Render for operators (CLI listings, logs).
    fn display(&self) -> String;
}

impl SettingType for bool {
    type Default = bool;
    const KIND: SettingKind = SettingKind::Boolean;

    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(Error::invalid(Self::KIND, raw))
        }
    }

    fn from_default(default: bool) -> Self {
        default
    }

    fn display(&self) -> String {
        self.to_string()
    }
}

macro_rules! integer_setting {
    ($($ty:ty),*) => {
        $(
            impl SettingType for $ty {
                type Default = $ty;
                const KIND: SettingKind = SettingKind::Integer;

                fn parse(raw: &str) -> Result<Self> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|_| Error::invalid(Self::KIND, raw))
                }

                fn from_default(default: $ty) -> Self {
                    default
                }

                fn display(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_setting!(u16, u32, u64, i64);

impl SettingType for String {
    type Default = &'static str;
    const KIND: SettingKind = SettingKind::String;

    fn parse(raw: &str) -> Result<Self> {
        Ok(raw.to_string())
    }

    fn from_default(default: &'static str) -> Self {
        default.to_string()
    }

    fn display(&self) -> String {
        self.clone()
    }
}

impl SettingType for Option<String> {
    type Default = Option<&'static str>;
    const KIND: SettingKind = SettingKind::OptionalString;

    fn parse(raw: &str) -> Result<Self> {
        Ok(Some(raw.to_string()))
    }

    fn from_default(default: Option<&'static str>) -> Self {
        default.map(str::to_string)
    }

    fn display(&self) -> String {
        self.clone().unwrap_or_default()
    }
}

impl SettingType for Vec<String> {
    type Default = &'static [&'static str];
    const KIND: SettingKind = SettingKind::StringList;

    /// Comma separated; items are trimmed and empty items dropped.
    fn parse(raw: &str) -> Result<Self> {
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn from_default(default: &'static [&'static str]) -> Self {
        default.iter().map(|item| item.to_string()).collect()
    }

    fn from_property(value: &PropertyValue) -> Result<Self> {
        match value {
            PropertyValue::Scalar(raw) => Self::parse(raw),
            PropertyValue::List(items) => Ok(items.clone()),
        }
    }

    fn display(&self) -> String {
        self.join(",")
    }
}

/// A named, typed configuration item.
pub struct Setting<T: SettingType> {
    key: &'static str,
    env: Option<&'static str>,
    default: T::Default,
    _type: PhantomData<fn() -> T>,
}

impl<T: SettingType> Setting<T> {
    /// Declare a setting with its dotted property key and default.
    pub const fn new(key: &'static str, default: T::Default) -> Self {
        Self {
            key,
            env: None,
            default,
            _type: PhantomData,
        }
    }

    /// Declare a setting that also has an environment-variable alias. The
    /// alias takes precedence over the property source.
    pub const fn with_env(key: &'static str, env: &'static str, default: T::Default) -> Self {
        Self {
            key,
            env: Some(env),
            default,
            _type: PhantomData,
        }
    }

}

impl Setting<Vec<String>> {
    /// Declare a list setting. Takes the slice directly so array literals
    /// coerce, which they do not through `T::Default`.
    pub const fn list(key: &'static str, default: &'static [&'static str]) -> Self {
        Self::new(key, default)
    }

    /// List setting with an environment-variable alias.
    pub const fn list_with_env(
        key: &'static str,
        env: &'static str,
        default: &'static [&'static str],
    ) -> Self {
        Self::with_env(key, env, default)
    }
}

impl<T: SettingType> Setting<T> {
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn env(&self) -> Option<&'static str> {
        self.env
    }

    pub fn kind(&self) -> SettingKind {
        T::KIND
    }

    /// The declared default, materialized.
    pub fn default_value(&self) -> T {
        T::from_default(self.default)
    }
}

impl<T: SettingType> Clone for Setting<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: SettingType> Copy for Setting<T> {}

impl<T: SettingType> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("key", &self.key)
            .field("env", &self.env)
            .field("kind", &T::KIND)
            .field("default", &self.default)
            .finish()
    }
}

/// Type-erased view of a [`Setting`], used to enumerate the catalog.
pub trait AnySetting: Sync {
    fn key(&self) -> &'static str;
    fn env(&self) -> Option<&'static str>;
    fn kind(&self) -> SettingKind;
    /// The declared default, rendered.
    fn default_display(&self) -> String;
    /// Resolve through `resolver` and render the result.
    fn resolve_display(&self, resolver: &ConfigResolver) -> String;
}

impl<T: SettingType> AnySetting for Setting<T> {
    fn key(&self) -> &'static str {
        self.key
    }

    fn env(&self) -> Option<&'static str> {
        self.env
    }

    fn kind(&self) -> SettingKind {
        T::KIND
    }

    fn default_display(&self) -> String {
        self.default_value().display()
    }

    fn resolve_display(&self, resolver: &ConfigResolver) -> String {
        resolver.resolve(self).display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_parse_is_case_insensitive() {
        assert!(bool::parse("TRUE").unwrap());
        assert!(!bool::parse("False").unwrap());
        assert!(bool::parse("yes").is_err());
        assert!(bool::parse("1").is_err());
    }

    #[test]
    fn test_integer_parse_respects_width() {
        assert_eq!(u16::parse(" 8102 ").unwrap(), 8102);
        assert!(u16::parse("70000").is_err());
        assert!(u32::parse("-1").is_err());
        assert_eq!(i64::parse("-1").unwrap(), -1);
        assert!(u64::parse("ten").is_err());
    }

    #[test]
    fn test_list_parse_drops_empty_items() {
        let zones = Vec::<String>::parse(" us-east-1a, ,us-east-1c,").unwrap();
        assert_eq!(zones, vec!["us-east-1a", "us-east-1c"]);
        assert!(Vec::<String>::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_scalar_setting_rejects_list_property() {
        let value = PropertyValue::List(vec!["1".into(), "2".into()]);
        assert!(u32::from_property(&value).is_err());
        assert_eq!(
            Vec::<String>::from_property(&value).unwrap(),
            vec!["1".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_const_declaration() {
        const RACKS: Setting<Vec<String>> = Setting::list("dm.racks.available", &["rac1", "rac2"]);
        const NONE: Setting<Vec<String>> = Setting::list("dm.zones.available", &[]);
        const ASG: Setting<Option<String>> = Setting::with_env("dm.az.asgname", "ASG_NAME", None);

        assert_eq!(RACKS.default_value(), vec!["rac1", "rac2"]);
        assert_eq!(RACKS.env(), None);
        assert!(NONE.default_value().is_empty());
        assert_eq!(ASG.env(), Some("ASG_NAME"));
        assert_eq!(ASG.default_value(), None);
        assert_eq!(ASG.kind(), SettingKind::OptionalString);
    }
}
