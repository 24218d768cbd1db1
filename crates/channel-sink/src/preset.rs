//! crates/channel-sink/src/preset.rs
//! Channel-to-sink override maps and the named DATA/DIAGNOSTICS presets.

use ::core::str::FromStr;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use thiserror::Error;

use crate::channel::Channel;
use crate::sink::Sink;
use crate::slot::SinkSlot;

/// Channels rerouted by both presets.
pub const DATA_CHANNELS: [Channel; 2] = [Channel::LOG, Channel::INFO];

/// Partial mapping from [`Channel`] to [`Sink`].
///
/// Channels absent from the map inherit whatever binding is beneath the frame
/// the overrides are pushed onto.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Overrides {
    entries: BTreeMap<Channel, Sink>,
}

impl Overrides {
    /// Creates an empty override map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the map with `channel` bound to `sink`.
    #[must_use]
    pub fn bind(mut self, channel: impl Into<Channel>, sink: Sink) -> Self {
        self.insert(channel, sink);
        self
    }

    /// Binds `channel` to `sink`, returning the sink it previously mapped to.
    pub fn insert(&mut self, channel: impl Into<Channel>, sink: Sink) -> Option<Sink> {
        self.entries.insert(channel.into(), sink)
    }

    /// Returns the sink `channel` is bound to, if any.
    #[must_use]
    pub fn get(&self, channel: &Channel) -> Option<&Sink> {
        self.entries.get(channel)
    }

    /// Reports whether `channel` has an explicit binding.
    #[must_use]
    pub fn contains(&self, channel: &Channel) -> bool {
        self.entries.contains_key(channel)
    }

    /// Number of bound channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no channel is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over bound channels in name order.
    pub fn channels(&self) -> impl DoubleEndedIterator<Item = &Channel> + '_ {
        self.entries.keys()
    }

    /// Iterates over bindings in channel name order.
    pub fn iter(&self) -> btree_map::Iter<'_, Channel, Sink> {
        self.entries.iter()
    }

    /// Returns `base` with every binding from `self` laid over it.
    #[must_use]
    pub fn layered_over(&self, base: &Self) -> Self {
        let mut entries = base.entries.clone();
        entries.extend(self.iter().map(|(channel, sink)| (channel.clone(), sink.clone())));
        Self { entries }
    }
}

impl FromIterator<(Channel, Sink)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (Channel, Sink)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Overrides {
    type Item = (&'a Channel, &'a Sink);
    type IntoIter = btree_map::Iter<'a, Channel, Sink>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Named ready-made bindings.
///
/// Both presets reroute the data channels ([`DATA_CHANNELS`]); they differ in
/// the slot whose registry sink receives them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Preset {
    /// Data channels write to the primary sink.
    Data,
    /// Data channels write to the secondary sink.
    Diagnostics,
}

impl Preset {
    /// Both presets.
    pub const ALL: [Self; 2] = [Self::Data, Self::Diagnostics];

    /// Returns the canonical preset name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Diagnostics => "DIAGNOSTICS",
        }
    }

    /// Returns the slot whose sink the data channels are routed to.
    #[must_use]
    pub const fn slot(self) -> SinkSlot {
        match self {
            Self::Data => SinkSlot::Primary,
            Self::Diagnostics => SinkSlot::Secondary,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a preset name is not recognised.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown binding preset `{name}`; expected DATA or DIAGNOSTICS")]
pub struct PresetParseError {
    name: String,
}

impl PresetParseError {
    /// Returns the rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Preset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|preset| trimmed.eq_ignore_ascii_case(preset.name()))
            .ok_or_else(|| PresetParseError { name: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_names_parse_case_insensitively() {
        assert_eq!("DATA".parse(), Ok(Preset::Data));
        assert_eq!(" diagnostics\n".parse(), Ok(Preset::Diagnostics));
        let error = "VERBOSE".parse::<Preset>().expect_err("unknown preset");
        assert_eq!(error.name(), "VERBOSE");
    }

    #[test]
    fn layered_over_prefers_top_bindings() {
        let base_sink = Sink::new("base", Vec::new());
        let top_sink = Sink::new("top", Vec::new());
        let base = Overrides::new()
            .bind(Channel::LOG, base_sink.clone())
            .bind(Channel::WARN, base_sink.clone());
        let top = Overrides::new().bind(Channel::LOG, top_sink.clone());

        let merged = top.layered_over(&base);
        assert_eq!(merged.get(&Channel::LOG), Some(&top_sink));
        assert_eq!(merged.get(&Channel::WARN), Some(&base_sink));
        assert_eq!(merged.len(), 2);
        assert_eq!(base.get(&Channel::LOG), Some(&base_sink));
    }

    #[test]
    fn insert_reports_replaced_sink() {
        let first = Sink::new("first", Vec::new());
        let mut overrides = Overrides::new();
        assert!(overrides.insert(Channel::INFO, first.clone()).is_none());
        let replaced = overrides.insert(Channel::INFO, Sink::new("second", Vec::new()));
        assert_eq!(replaced, Some(first));
    }
}
