//! crates/channel-sink/src/channel.rs
//! Logical emit channel names.

use std::borrow::{Borrow, Cow};
use std::fmt;

/// Name of a logical emit operation such as `log` or `warn`.
///
/// The four well-known channels are available as associated constants. Any
/// other name can be created with [`Channel::new`]; whether it can actually be
/// emitted through depends on the registry and console it is used with.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Channel(Cow<'static, str>);

impl Channel {
    /// The `log` data channel.
    pub const LOG: Self = Self::from_static("log");
    /// The `info` data channel.
    pub const INFO: Self = Self::from_static("info");
    /// The `warn` diagnostic channel.
    pub const WARN: Self = Self::from_static("warn");
    /// The `error` diagnostic channel.
    pub const ERROR: Self = Self::from_static("error");

    /// Every channel known to a freshly built registry, in declaration order.
    pub const WELL_KNOWN: [Self; 4] = [Self::LOG, Self::INFO, Self::WARN, Self::ERROR];

    /// Creates a channel from a static name without allocating.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a channel from an owned or borrowed name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the channel name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for Channel {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for Channel {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn static_and_owned_names_compare_equal() {
        assert_eq!(Channel::LOG, Channel::new("log"));
        assert_eq!(Channel::from("warn"), Channel::WARN);
        assert_ne!(Channel::INFO, Channel::ERROR);
    }

    #[test]
    fn display_prints_bare_name() {
        assert_eq!(Channel::ERROR.to_string(), "error");
        assert_eq!(format!("{}", Channel::new("trace")), "trace");
    }

    #[test]
    fn borrow_allows_str_lookups() {
        let mut map = BTreeMap::new();
        map.insert(Channel::INFO, 1);
        assert_eq!(map.get("info"), Some(&1));
    }

    #[test]
    fn well_known_set_is_ordered_data_first() {
        let well_known = Channel::WELL_KNOWN;
        let names: Vec<&str> = well_known.iter().map(Channel::as_str).collect();
        assert_eq!(names, ["log", "info", "warn", "error"]);
    }
}
