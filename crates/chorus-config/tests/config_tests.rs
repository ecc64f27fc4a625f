// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Chorus configuration system.

use std::io::Write;
use std::path::Path;

use chorus_config::diagnostic::ConfigError;
use chorus_config::model::ChorusConfig;
use chorus_config::{
    load_and_validate_path, load_and_validate_str, load_config_from_path, load_config_from_str,
};

/// Valid TOML with known fields in every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_chorus_config() {
    let toml = r#"
[agent]
name = "ratichat"
log_level = "debug"

[world]
max_messages_per_channel = 40
channel_retention_secs = 86400

[context]
messages_per_channel = 5
summarize_messages = true
node_mode_token_threshold = 4000

[rate_limit]
max_cycles_per_hour = 120
cooldown_multiplier = 1.5

[rate_limit.action_limits]
send_reply = 10

[rate_limit.channel_type_limits]
farcaster = 5

[processing]
cycle_interval_ms = 1000

[scheduler]
min_send_interval_ms = 250
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "ratichat");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.world.max_messages_per_channel, 40);
    assert_eq!(config.world.channel_retention_secs, Some(86_400));
    assert_eq!(config.context.messages_per_channel, 5);
    assert!(config.context.summarize_messages);
    assert_eq!(config.context.node_mode_token_threshold, 4000);
    assert_eq!(config.rate_limit.max_cycles_per_hour, 120);
    assert_eq!(config.rate_limit.cooldown_multiplier, 1.5);
    assert_eq!(config.rate_limit.action_limits.get("send_reply"), Some(&10));
    // Map entries merge over the compiled defaults.
    assert_eq!(config.rate_limit.channel_type_limits.get("farcaster"), Some(&5));
    assert_eq!(config.rate_limit.channel_type_limits.get("matrix"), Some(&60));
    assert_eq!(config.processing.cycle_interval_ms, 1000);
    assert_eq!(config.scheduler.min_send_interval_ms, 250);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.agent.name, "chorus");
    assert_eq!(config.world.max_messages_per_channel, 50);
    assert_eq!(config.world.max_action_history, 100);
    assert_eq!(config.world.max_seen_message_ids, 10_000);
    assert_eq!(config.world.channel_retention_secs, None);
    assert_eq!(config.rate_limit.max_burst_cycles, 10);
    assert_eq!(config.rate_limit.burst_window_secs, 300.0);
    assert_eq!(config.rate_limit.channel_type_limits.get("farcaster"), Some(&30));
    assert!(config.context.include_detailed_user_info);
    assert_eq!(config.processing.cycle_interval_ms, 30_000);
}

#[test]
fn unknown_field_suggests_correction() {
    let toml = r#"
[rate_limit]
max_cycle_per_hour = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "max_cycle_per_hour");
            assert_eq!(suggestion.as_deref(), Some("max_cycles_per_hour"));
            assert!(valid_keys.contains("burst_window_secs"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown section");
    assert!(matches!(
        &errors[0],
        ConfigError::UnknownKey { key, .. } if key == "telegram"
    ));
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[processing]
cycle_interval_ms = "fast"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(matches!(&errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_errors_surface_after_parse() {
    let toml = r#"
[rate_limit]
burst_window_secs = 7200.0

[rate_limit.channel_type_limits]
telegram = 10
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("burst_window_secs")
    )));
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownName { name, .. } if name == "telegram"
    )));
}

#[test]
fn loads_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[scheduler]\nqueue_capacity = 7").expect("write");

    let config = load_and_validate_path(file.path()).expect("file should load");
    assert_eq!(config.scheduler.queue_capacity, 7);
    assert_eq!(config.scheduler.min_send_interval_ms, 1_000);
}

#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "chorus.toml",
            "[rate_limit]\nmax_cycles_per_hour = 100\n\n[agent]\nlog_level = \"warn\"\n",
        )?;
        jail.set_env("CHORUS_RATE_LIMIT_MAX_CYCLES_PER_HOUR", "42");
        jail.set_env("CHORUS_WORLD_CHANNEL_RETENTION_SECS", "3600");
        jail.set_env("CHORUS_CONTEXT_FAILSAFE_CHANNEL_COUNT", "5");

        let config = load_config_from_path(Path::new("chorus.toml"))?;
        assert_eq!(config.rate_limit.max_cycles_per_hour, 42);
        assert_eq!(config.world.channel_retention_secs, Some(3600));
        assert_eq!(config.context.failsafe_channel_count, 5);
        assert_eq!(config.agent.log_level, "warn");
        Ok(())
    });
}

#[test]
fn default_config_serializes_to_toml() {
    let rendered = toml::to_string_pretty(&ChorusConfig::default()).expect("serialize");
    assert!(rendered.contains("[rate_limit.action_limits]"));
    let reparsed = load_config_from_str(&rendered).expect("round trip");
    assert_eq!(reparsed.context.max_detailed_channels, 8);
}
