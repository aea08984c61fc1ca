//! Compatibility switches for field numbering and inheritance
//!
//! Peers must agree on these settings: they change both the flattened field
//! order of a class and the schema fingerprint.

use std::env;

/// Environment variable overriding [`DcConfig::multiple_inheritance`]
pub const ENV_MULTIPLE_INHERITANCE: &str = "DC_MULTIPLE_INHERITANCE";
/// Environment variable overriding [`DcConfig::virtual_inheritance`]
pub const ENV_VIRTUAL_INHERITANCE: &str = "DC_VIRTUAL_INHERITANCE";
/// Environment variable overriding [`DcConfig::sort_inheritance_by_file`]
pub const ENV_SORT_INHERITANCE_BY_FILE: &str = "DC_SORT_INHERITANCE_BY_FILE";

/// Schema-wide compatibility configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde_impls", serde(default))]
pub struct DcConfig {
    /// Classes may list more than one parent, and field numbers come from a
    /// single file-wide counter.
    pub multiple_inheritance: bool,
    /// A field reached through more than one parent is only inherited once.
    pub virtual_inheritance: bool,
    /// Legacy mode: struct fields consume global numbers and flattened field
    /// lists are ordered by field number instead of declaration order.
    /// Only meaningful together with `virtual_inheritance`.
    pub sort_inheritance_by_file: bool,
}

impl Default for DcConfig {
    fn default() -> Self {
        Self {
            multiple_inheritance: true,
            virtual_inheritance: true,
            sort_inheritance_by_file: false,
        }
    }
}

impl DcConfig {
    /// Returns the default configuration with any overrides present in the
    /// process environment applied on top.
    ///
    /// Unrecognized values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`DcConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Self::default();
        let apply = |key: &str, slot: &mut bool| {
            if let Some(raw) = lookup(key) {
                match parse_flag(&raw) {
                    Some(v) => *slot = v,
                    None => log::warn!("ignoring {key}={raw:?}: expected a boolean"),
                }
            }
        };
        apply(ENV_MULTIPLE_INHERITANCE, &mut cfg.multiple_inheritance);
        apply(ENV_VIRTUAL_INHERITANCE, &mut cfg.virtual_inheritance);
        apply(ENV_SORT_INHERITANCE_BY_FILE, &mut cfg.sort_inheritance_by_file);
        cfg
    }

    /// Returns `true` when inherited field lists are ordered by field number.
    #[must_use]
    pub fn sorts_by_file(&self) -> bool {
        self.virtual_inheritance && self.sort_inheritance_by_file
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "#t" => Some(true),
        "0" | "false" | "no" | "off" | "#f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = DcConfig::default();
        assert!(cfg.multiple_inheritance);
        assert!(cfg.virtual_inheritance);
        assert!(!cfg.sort_inheritance_by_file);
        assert!(!cfg.sorts_by_file());
    }

    #[test]
    fn overrides() {
        let cfg = DcConfig::from_lookup(|key| match key {
            ENV_SORT_INHERITANCE_BY_FILE => Some("yes".into()),
            ENV_MULTIPLE_INHERITANCE => Some("0".into()),
            ENV_VIRTUAL_INHERITANCE => Some("maybe".into()),
            _ => None,
        });
        assert!(!cfg.multiple_inheritance);
        assert!(cfg.virtual_inheritance);
        assert!(cfg.sorts_by_file());
    }
}
