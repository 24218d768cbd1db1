#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/channel-sink/src/lib.rs
//!
//! # Overview
//!
//! `channel-sink` holds the leaf types shared by the rebinding layer: the
//! [`Channel`] names that call sites emit through, the identity-comparable
//! [`Sink`] handles that receive bytes, and the [`StreamRegistry`] describing
//! which process-visible slot ([`SinkSlot`]) every channel writes through by
//! default.
//!
//! # Design
//!
//! Sinks are opaque. A [`Sink`] wraps any [`std::io::Write`] implementor behind
//! a shared handle; cloning the handle keeps the identity, constructing a new
//! one creates a distinct sink even when both wrap the same OS stream. The
//! registry is built once and read-only afterwards. The two named presets,
//! [`Preset::Data`] and [`Preset::Diagnostics`], expand into [`Overrides`]
//! against a concrete registry.
//!
//! # Invariants
//!
//! - `log` and `info` write through the data slot (primary unless the routing
//!   configuration selects standard error), `warn` and `error` always write
//!   through the secondary slot.
//! - Sink equality is handle identity, never content comparison.
//!
//! # Examples
//!
//! ```
//! use channel_sink::{Channel, Preset, Sink, SinkSlot, StreamRegistry};
//!
//! let registry = StreamRegistry::new(Sink::new("out", Vec::new()), Sink::new("err", Vec::new()));
//! assert_eq!(registry.slot(&Channel::LOG), Some(SinkSlot::Primary));
//! assert_eq!(registry.slot(&Channel::WARN), Some(SinkSlot::Secondary));
//!
//! let diagnostics = registry.preset(Preset::Diagnostics);
//! assert_eq!(diagnostics.get(&Channel::INFO), Some(registry.secondary()));
//! ```

mod channel;
mod config;
mod line_mode;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod preset;
mod registry;
mod sink;
mod slot;

pub use crate::channel::Channel;
pub use crate::config::{CONSOLE_ENV_VAR, RoutingConfig, RoutingConfigError};
pub use crate::line_mode::LineMode;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub use crate::memory::MemorySink;
pub use crate::preset::{DATA_CHANNELS, Overrides, Preset, PresetParseError};
pub use crate::registry::StreamRegistry;
pub use crate::sink::{Sink, SinkId};
pub use crate::slot::{SinkSlot, SinkSlotParseError};
