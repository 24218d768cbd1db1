//! Integration tests for default channel routing.
//!
//! These tests verify that the registry hands out the configured sinks, that
//! presets expand against the registry they are applied to, and that bytes
//! written through resolved sinks land in the expected capture.

use channel_sink::{
    Channel, LineMode, MemorySink, Overrides, Preset, RoutingConfig, SinkSlot, StreamRegistry,
};

// ============================================================================
// Helper functions
// ============================================================================

fn captures() -> (MemorySink, MemorySink) {
    (MemorySink::new("stdout"), MemorySink::new("stderr"))
}

fn registry_for(out: &MemorySink, err: &MemorySink, config: &RoutingConfig) -> StreamRegistry {
    StreamRegistry::with_config(out.sink(), err.sink(), config)
}

// ============================================================================
// Default Routing Tests
// ============================================================================

#[test]
fn default_routing_splits_data_and_diagnostics() {
    let (out, err) = captures();
    let registry = registry_for(&out, &err, &RoutingConfig::default());

    for channel in Channel::WELL_KNOWN {
        let sink = registry.default_sink(&channel).expect("well-known channel");
        sink.write_line(channel.as_str().as_bytes(), registry.line_mode())
            .expect("write succeeds");
    }

    assert_eq!(out.lines(), ["log", "info"]);
    assert_eq!(err.lines(), ["warn", "error"]);
}

#[test]
fn console_to_stderr_moves_every_channel_to_secondary() {
    let (out, err) = captures();
    let registry = registry_for(&out, &err, &RoutingConfig::console_to_stderr());

    for channel in Channel::WELL_KNOWN {
        assert_eq!(registry.slot(&channel), Some(SinkSlot::Secondary));
    }
    assert!(out.is_empty());
}

#[test]
fn line_mode_from_config_is_exposed() {
    let (out, err) = captures();
    let config = RoutingConfig {
        line_mode: LineMode::WithoutNewline,
        ..RoutingConfig::default()
    };
    let registry = registry_for(&out, &err, &config);
    assert_eq!(registry.line_mode(), LineMode::WithoutNewline);
}

// ============================================================================
// Preset Tests
// ============================================================================

#[test]
fn presets_expand_against_their_registry() {
    let (out, err) = captures();
    let registry = registry_for(&out, &err, &RoutingConfig::default());

    let diagnostics = registry.preset(Preset::Diagnostics);
    let data = registry.preset(Preset::Data);

    assert_eq!(diagnostics.get(&Channel::LOG), Some(&err.sink()));
    assert_eq!(data.get(&Channel::LOG), Some(&out.sink()));
    assert_eq!(
        diagnostics.channels().collect::<Vec<_>>(),
        data.channels().collect::<Vec<_>>()
    );
}

#[test]
fn explicit_overrides_layer_over_presets() {
    let (out, err) = captures();
    let audit = MemorySink::new("audit");
    let registry = registry_for(&out, &err, &RoutingConfig::default());

    let overrides = Overrides::new()
        .bind(Channel::INFO, audit.sink())
        .layered_over(&registry.preset(Preset::Diagnostics));

    assert_eq!(overrides.get(&Channel::LOG), Some(&err.sink()));
    assert_eq!(overrides.get(&Channel::INFO), Some(&audit.sink()));
}

#[test]
fn preset_display_matches_parse_input() {
    for preset in Preset::ALL {
        assert_eq!(preset.to_string().parse::<Preset>(), Ok(preset));
    }
}
