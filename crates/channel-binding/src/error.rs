//! Error taxonomy for binding, interception and capability wrapping.

use std::io;

use channel_sink::{Channel, PresetParseError};
use thiserror::Error;

use crate::frame::FrameId;

/// Misconfiguration detected while installing or invoking an emit member.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigurationError {
    /// The console has no member for the channel.
    #[error("console has no `{channel}` member")]
    MissingMember {
        /// Channel that was looked up.
        channel: Channel,
    },
    /// The console member for the channel is a plain value.
    #[error("console `{channel}` member is not callable")]
    NotCallable {
        /// Channel whose member is not callable.
        channel: Channel,
    },
    /// The registry does not assign the channel to a process-visible slot.
    #[error("channel `{channel}` is not registered with an output slot")]
    NoSlot {
        /// Channel missing from the registry.
        channel: Channel,
    },
}

/// Contract violation in the scoped rebind protocol.
///
/// Every variant is raised at the point of misuse and leaves the stack, the
/// console and the lock state exactly as they were before the failed call.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BindingError {
    /// An interceptor could not be installed.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A pop named a frame other than the current top.
    #[error("pop applied to frame {expected} while frame {top} is on top of the binding stack")]
    StackDiscipline {
        /// Frame the caller tried to pop.
        expected: FrameId,
        /// Frame currently on top.
        top: FrameId,
    },
    /// A pop named the process-default frame, which cannot be removed.
    #[error("too many pops: the process-default frame cannot be removed")]
    StackUnderflow,
    /// `lock` was called while another token is outstanding.
    #[error("already locked")]
    AlreadyLocked,
    /// `unlock` was called with a token that is not the outstanding one.
    #[error("already unlocked")]
    AlreadyUnlocked,
    /// A binding was requested by a preset name that does not exist.
    #[error(transparent)]
    UnknownPreset(#[from] PresetParseError),
}

/// Failure of a single emit call.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The channel cannot be emitted through.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The sink rejected the write.
    #[error("failed to write to output sink: {0}")]
    Io(#[from] io::Error),
}

/// Error produced by a capability method.
///
/// The wrapper never inspects or re-wraps these values; whatever a method
/// returns reaches the caller unchanged.
pub type MethodError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a call made through an [`Api`](crate::Api).
#[derive(Debug, Error)]
pub enum CallError {
    /// The object has no member with the requested name.
    #[error("object has no member `{0}`")]
    UnknownMember(String),
    /// The member exists but holds a plain value.
    #[error("member `{0}` is not callable")]
    NotCallable(String),
    /// The method itself failed.
    #[error(transparent)]
    Method(MethodError),
}
