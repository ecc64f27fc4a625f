// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chorus.toml` > `~/.config/chorus/chorus.toml` > `/etc/chorus/chorus.toml`
//! with environment variable overrides via the `CHORUS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChorusConfig;

/// Top-level config sections, used to map `CHORUS_SECTION_KEY` env vars.
const SECTIONS: &[&str] = &[
    "rate_limit",
    "processing",
    "scheduler",
    "context",
    "world",
    "agent",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chorus/chorus.toml` (system-wide)
/// 3. `~/.config/chorus/chorus.toml` (user XDG config)
/// 4. `./chorus.toml` (local directory)
/// 5. `CHORUS_*` environment variables
pub fn load_config() -> Result<ChorusConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ChorusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChorusConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChorusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChorusConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChorusConfig::default()))
        .merge(Toml::file("/etc/chorus/chorus.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chorus/chorus.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chorus.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `CHORUS_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Section names are matched explicitly instead of splitting on `_`, since
/// both section and key names contain underscores
/// (`CHORUS_RATE_LIMIT_MAX_CYCLES_PER_HOUR` -> `rate_limit.max_cycles_per_hour`).
fn env_provider() -> Env {
    Env::prefixed("CHORUS_").map(|key| map_env_key(key.as_str()).into())
}

/// Figment hands the key over with its original (upper) case.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("RATE_LIMIT_MAX_CYCLES_PER_HOUR"),
            "rate_limit.max_cycles_per_hour"
        );
        assert_eq!(map_env_key("AGENT_LOG_LEVEL"), "agent.log_level");
        assert_eq!(
            map_env_key("World_Max_Messages_Per_Channel"),
            "world.max_messages_per_channel"
        );
        assert_eq!(map_env_key("UNRELATED"), "unrelated");
    }
}
