//! crates/channel-sink/src/registry.rs
//! Default channel routing and the two process-visible sinks.

use std::collections::BTreeMap;

use crate::channel::Channel;
use crate::config::{RoutingConfig, RoutingConfigError};
use crate::line_mode::LineMode;
use crate::preset::{DATA_CHANNELS, Overrides, Preset};
use crate::sink::Sink;
use crate::slot::SinkSlot;

/// Default sinks and the slot every known channel writes through.
///
/// The registry is the bottom of every binding stack: a channel with no
/// explicit override resolves to the sink occupying its slot here. Built once
/// and never mutated afterwards; additional channels are registered while
/// building with [`with_channel`](Self::with_channel).
///
/// # Examples
///
/// ```
/// use channel_sink::{Channel, RoutingConfig, Sink, SinkSlot, StreamRegistry};
///
/// let out = Sink::new("out", Vec::new());
/// let err = Sink::new("err", Vec::new());
/// let registry = StreamRegistry::with_config(out, err.clone(), &RoutingConfig::console_to_stderr())
///     .with_channel("trace", SinkSlot::Secondary);
///
/// assert_eq!(registry.default_sink(&Channel::LOG), Some(&err));
/// assert_eq!(registry.slot(&Channel::new("trace")), Some(SinkSlot::Secondary));
/// assert_eq!(registry.slot(&Channel::new("audit")), None);
/// ```
#[derive(Clone, Debug)]
pub struct StreamRegistry {
    sinks: [Sink; 2],
    slots: BTreeMap<Channel, SinkSlot>,
    line_mode: LineMode,
}

impl StreamRegistry {
    /// Builds a registry with the default routing configuration.
    #[must_use]
    pub fn new(primary: Sink, secondary: Sink) -> Self {
        Self::with_config(primary, secondary, &RoutingConfig::default())
    }

    /// Builds a registry that routes the data channels per `config`.
    #[must_use]
    pub fn with_config(primary: Sink, secondary: Sink, config: &RoutingConfig) -> Self {
        let mut slots: BTreeMap<Channel, SinkSlot> = DATA_CHANNELS
            .into_iter()
            .map(|channel| (channel, config.data_slot))
            .collect();
        slots.insert(Channel::WARN, SinkSlot::Secondary);
        slots.insert(Channel::ERROR, SinkSlot::Secondary);

        Self {
            sinks: [primary, secondary],
            slots,
            line_mode: config.line_mode,
        }
    }

    /// Builds the registry over the real standard output and standard error,
    /// configured from [`CONSOLE_ENV_VAR`](crate::CONSOLE_ENV_VAR).
    pub fn process() -> Result<Self, RoutingConfigError> {
        let config = RoutingConfig::from_env()?;
        Ok(Self::process_with_config(&config))
    }

    /// Builds the registry over the real standard streams with `config`.
    #[must_use]
    pub fn process_with_config(config: &RoutingConfig) -> Self {
        Self::with_config(Sink::stdout(), Sink::stderr(), config)
    }

    /// Registers `channel` as writing through `slot`.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<Channel>, slot: SinkSlot) -> Self {
        self.slots.insert(channel.into(), slot);
        self
    }

    /// Returns the sink occupying `slot` by default.
    #[must_use]
    pub fn sink(&self, slot: SinkSlot) -> &Sink {
        &self.sinks[slot.index()]
    }

    /// Returns the primary (standard output) sink.
    #[must_use]
    pub fn primary(&self) -> &Sink {
        self.sink(SinkSlot::Primary)
    }

    /// Returns the secondary (standard error) sink.
    #[must_use]
    pub fn secondary(&self) -> &Sink {
        self.sink(SinkSlot::Secondary)
    }

    /// Returns the slot `channel` writes through, or `None` for unknown channels.
    #[must_use]
    pub fn slot(&self, channel: &Channel) -> Option<SinkSlot> {
        self.slots.get(channel).copied()
    }

    /// Returns the sink `channel` resolves to when nothing overrides it.
    #[must_use]
    pub fn default_sink(&self, channel: &Channel) -> Option<&Sink> {
        self.slot(channel).map(|slot| self.sink(slot))
    }

    /// Iterates over every registered channel and its slot.
    pub fn channels(&self) -> impl Iterator<Item = (&Channel, SinkSlot)> + '_ {
        self.slots.iter().map(|(channel, slot)| (channel, *slot))
    }

    /// Returns the terminator policy of the standard emit implementation.
    #[must_use]
    pub const fn line_mode(&self) -> LineMode {
        self.line_mode
    }

    /// Expands `preset` into concrete overrides against this registry's sinks.
    #[must_use]
    pub fn preset(&self, preset: Preset) -> Overrides {
        let sink = self.sink(preset.slot());
        DATA_CHANNELS
            .into_iter()
            .map(|channel| (channel, sink.clone()))
            .collect()
    }
}
