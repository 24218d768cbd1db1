//! crates/channel-sink/src/slot.rs
//! Process-visible default output slots.

use ::core::str::FromStr;
use std::fmt;

use thiserror::Error;

/// One of the two process-visible default output streams.
///
/// Emit implementations never hold a sink directly; they write through the
/// slot their channel is assigned to, and interceptors temporarily swap the
/// sink occupying that slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SinkSlot {
    /// Standard output.
    #[default]
    Primary,
    /// Standard error.
    Secondary,
}

impl SinkSlot {
    /// Both slots, primary first.
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    /// Returns the conventional stream name for the slot.
    #[must_use]
    pub const fn stream_name(self) -> &'static str {
        match self {
            Self::Primary => "stdout",
            Self::Secondary => "stderr",
        }
    }

    /// Returns the slot's position in `[primary, secondary]` arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}

impl fmt::Display for SinkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stream_name())
    }
}

/// Error returned when a slot name is not recognised.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unrecognised output slot `{value}`; expected stdout or stderr")]
pub struct SinkSlotParseError {
    value: String,
}

impl SinkSlotParseError {
    /// Returns the rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for SinkSlot {
    type Err = SinkSlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("stdout") || trimmed.eq_ignore_ascii_case("primary") {
            Ok(Self::Primary)
        } else if trimmed.eq_ignore_ascii_case("stderr")
            || trimmed.eq_ignore_ascii_case("secondary")
        {
            Ok(Self::Secondary)
        } else {
            Err(SinkSlotParseError {
                value: s.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_and_slot_aliases() {
        assert_eq!("stdout".parse(), Ok(SinkSlot::Primary));
        assert_eq!(" PRIMARY ".parse(), Ok(SinkSlot::Primary));
        assert_eq!("stderr".parse(), Ok(SinkSlot::Secondary));
        assert_eq!("Secondary".parse(), Ok(SinkSlot::Secondary));
    }

    #[test]
    fn rejects_unknown_names() {
        let error = "journald".parse::<SinkSlot>().expect_err("unknown slot");
        assert_eq!(error.value(), "journald");
        assert!(error.to_string().contains("journald"));
    }

    #[test]
    fn default_is_primary() {
        assert_eq!(SinkSlot::default(), SinkSlot::Primary);
        assert_eq!(SinkSlot::Secondary.to_string(), "stderr");
    }
}
