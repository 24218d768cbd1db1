//! crates/channel-sink/src/config.rs
//! Startup routing configuration for the default stream registry.

use std::env;

use thiserror::Error;

use crate::line_mode::LineMode;
use crate::slot::SinkSlot;

/// Environment variable selecting the slot the data channels write through.
///
/// Accepts `stdout`/`primary` or `stderr`/`secondary`, ignoring ASCII case and
/// surrounding whitespace. An unset or empty variable keeps the default.
pub const CONSOLE_ENV_VAR: &str = "STDIO_REBIND_CONSOLE";

/// Startup configuration consumed by [`StreamRegistry`](crate::StreamRegistry).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoutingConfig {
    /// Slot the `log` and `info` channels write through by default.
    pub data_slot: SinkSlot,
    /// Terminator policy of the standard emit implementation.
    pub line_mode: LineMode,
}

impl RoutingConfig {
    /// Configuration that sends the data channels to standard error.
    #[must_use]
    pub fn console_to_stderr() -> Self {
        Self {
            data_slot: SinkSlot::Secondary,
            ..Self::default()
        }
    }

    /// Reads [`CONSOLE_ENV_VAR`] from the process environment.
    pub fn from_env() -> Result<Self, RoutingConfigError> {
        let value = env::var(CONSOLE_ENV_VAR).ok();
        Self::from_env_value(value.as_deref())
    }

    /// Builds a configuration from the raw value of [`CONSOLE_ENV_VAR`].
    pub fn from_env_value(value: Option<&str>) -> Result<Self, RoutingConfigError> {
        let Some(raw) = value.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(Self::default());
        };

        let data_slot = raw.parse().map_err(|_| RoutingConfigError {
            value: raw.to_owned(),
        })?;
        Ok(Self {
            data_slot,
            ..Self::default()
        })
    }
}

/// Error returned when [`CONSOLE_ENV_VAR`] holds an unrecognised value.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unrecognised STDIO_REBIND_CONSOLE value `{value}`; expected stdout or stderr")]
pub struct RoutingConfigError {
    value: String,
}

impl RoutingConfigError {
    /// Returns the rejected value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_or_blank_value_keeps_defaults() {
        assert_eq!(RoutingConfig::from_env_value(None), Ok(RoutingConfig::default()));
        assert_eq!(
            RoutingConfig::from_env_value(Some("  ")),
            Ok(RoutingConfig::default())
        );
    }

    #[test]
    fn stderr_value_moves_data_channels() {
        let config = RoutingConfig::from_env_value(Some("stderr")).expect("valid value");
        assert_eq!(config, RoutingConfig::console_to_stderr());
        assert_eq!(config.line_mode, LineMode::WithNewline);
    }

    #[test]
    fn unknown_value_is_reported() {
        let error = RoutingConfig::from_env_value(Some("syslog")).expect_err("invalid value");
        assert_eq!(error.value(), "syslog");
        assert!(error.to_string().contains(CONSOLE_ENV_VAR));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_deserializes_with_missing_fields() {
        let config: RoutingConfig =
            serde_json::from_str(r#"{"data_slot":"secondary"}"#).expect("valid json");
        assert_eq!(config.data_slot, SinkSlot::Secondary);
        assert_eq!(config.line_mode, LineMode::WithNewline);

        let json = serde_json::to_string(&RoutingConfig::default()).expect("serializes");
        assert!(json.contains("with_newline"));
    }
}
