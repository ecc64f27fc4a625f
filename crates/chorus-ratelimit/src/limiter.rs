// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adaptive rate limiter for decision cycles and outbound actions.
//!
//! Cycles are gated by an hourly cap and a burst detector. Crossing the
//! burst cap puts the limiter into cooldown for `base_interval *
//! multiplier` seconds and grows the multiplier (×1.2, capped at 3.0);
//! calm cycles decay it back toward 1.0 (×0.95). Actions and per-channel
//! sends have independent hourly windows.
//!
//! Checks never record. Callers record after the guarded work proceeds.

use std::collections::{BTreeMap, HashMap};

use chorus_config::model::RateLimitConfig;
use chorus_core::recording;
use chorus_core::types::ChannelType;
use serde::Serialize;
use tracing::{debug, warn};

use crate::window::RateWindow;

const HOUR_SECS: f64 = 3600.0;
const MULTIPLIER_GROWTH: f64 = 1.2;
const MULTIPLIER_DECAY: f64 = 0.95;
const MAX_MULTIPLIER: f64 = 3.0;
const MIN_MULTIPLIER: f64 = 1.0;

/// Outcome of a rate limit check. A denial is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateDecision {
    pub allowed: bool,
    /// Seconds until the same check could succeed (0 when allowed).
    pub wait_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            wait_secs: 0.0,
            reason: None,
        }
    }

    pub fn deny(wait_secs: f64, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            wait_secs: wait_secs.max(0.0),
            reason: Some(reason.into()),
        }
    }

    /// Human-readable summary, e.g. `"burst limit reached, retry in 12s"`.
    pub fn describe(&self) -> String {
        match (&self.reason, self.allowed) {
            (_, true) => "allowed".to_string(),
            (Some(reason), false) => format!("{reason}, retry in {}", format_wait(self.wait_secs)),
            (None, false) => format!("denied, retry in {}", format_wait(self.wait_secs)),
        }
    }
}

/// Render a wait as `"45s"`, `"3m 20s"` or `"1h 5m"`.
pub fn format_wait(secs: f64) -> String {
    let total = secs.ceil().max(0.0) as u64;
    match total {
        0..60 => format!("{total}s"),
        60..3600 => format!("{}m {}s", total / 60, total % 60),
        _ => format!("{}h {}m", total / 3600, (total % 3600) / 60),
    }
}

/// Usage of one window against its cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowUsage {
    pub used: usize,
    /// `None` when the category is uncapped.
    pub limit: Option<usize>,
    pub remaining: Option<usize>,
}

impl WindowUsage {
    fn new(used: usize, limit: Option<usize>) -> Self {
        Self {
            used,
            limit,
            remaining: limit.map(|l| l.saturating_sub(used)),
        }
    }
}

/// Serializable snapshot of the limiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitStatus {
    pub cycles_last_hour: WindowUsage,
    pub cycles_in_burst_window: WindowUsage,
    pub in_cooldown: bool,
    pub cooldown_remaining_secs: f64,
    pub cooldown_multiplier: f64,
    pub cooldowns_entered: u64,
    pub actions: BTreeMap<String, WindowUsage>,
    pub channels: BTreeMap<String, WindowUsage>,
}

/// Wait until a window capped at `cap` has room, or `None` if it has room
/// now. A cap of zero blocks for a full hour.
fn capped_wait(window: Option<&mut RateWindow>, cap: usize, now: f64) -> Option<f64> {
    let Some(window) = window else {
        return (cap == 0).then_some(HOUR_SECS);
    };
    window.prune(now);
    if window.len() < cap {
        return None;
    }
    Some(if window.is_empty() {
        HOUR_SECS
    } else {
        window.time_until_oldest_expires(now)
    })
}

/// Sliding-window rate limiter with burst detection and adaptive cooldown.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    cycles: RateWindow,
    actions: HashMap<String, RateWindow>,
    channels: HashMap<String, (ChannelType, RateWindow)>,
    cooldown_until: Option<f64>,
    multiplier: f64,
    cooldowns_entered: u64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            config: config.clone(),
            cycles: RateWindow::new(HOUR_SECS),
            actions: HashMap::new(),
            channels: HashMap::new(),
            cooldown_until: None,
            multiplier: config.cooldown_multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER),
            cooldowns_entered: 0,
        }
    }

    /// Current adaptive cooldown multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn in_cooldown(&self, now: f64) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Whether a decision cycle may start at `now`.
    ///
    /// Crossing the burst cap enters cooldown as a side effect; nothing is
    /// recorded.
    pub fn can_process_cycle(&mut self, now: f64) -> RateDecision {
        self.cycles.prune(now);
        self.drop_idle_windows(now);

        if let Some(until) = self.cooldown_until
            && now < until
        {
            recording::record_rate_limit_denial("cooldown");
            return RateDecision::deny(until - now, "cooling down after burst");
        }

        let used = self.cycles.len();
        let cap = self.config.max_cycles_per_hour;
        if used >= cap {
            recording::record_rate_limit_denial("cycles_per_hour");
            debug!(used, cap, "hourly cycle cap reached");
            return RateDecision::deny(
                self.cycles.time_until_oldest_expires(now),
                format!("hourly cycle cap of {cap} reached"),
            );
        }
        if used * 5 >= cap * 4 {
            debug!(used, cap, "approaching hourly cycle cap (80%+)");
        }

        let burst = self.cycles.count_since(now, self.config.burst_window_secs);
        if burst >= self.config.max_burst_cycles {
            let cooldown = self.config.base_interval_secs * self.multiplier;
            self.cooldown_until = Some(now + cooldown);
            self.cooldowns_entered += 1;
            let previous = self.multiplier;
            self.multiplier = (self.multiplier * MULTIPLIER_GROWTH).min(MAX_MULTIPLIER);
            warn!(
                burst,
                cooldown_secs = cooldown,
                multiplier = previous,
                next_multiplier = self.multiplier,
                "burst detected, entering cooldown"
            );
            recording::record_rate_limit_denial("burst");
            return RateDecision::deny(cooldown, "burst limit reached");
        }

        RateDecision::allow()
    }

    /// Record a cycle that started at `now`.
    pub fn record_cycle(&mut self, now: f64) {
        self.cycles.prune(now);
        self.cycles.record(now);

        let cooled = self.cooldown_until.is_none_or(|until| now >= until);
        let bursting =
            self.cycles.count_since(now, self.config.burst_window_secs) >= self.config.max_burst_cycles;
        if cooled {
            self.cooldown_until = None;
            if !bursting {
                self.multiplier = (self.multiplier * MULTIPLIER_DECAY).max(MIN_MULTIPLIER);
            }
        }
    }

    /// Whether one more action of `action_type` fits its hourly cap.
    /// Action types without a configured cap are always allowed.
    pub fn can_execute_action(&mut self, action_type: &str, now: f64) -> RateDecision {
        let Some(&cap) = self.config.action_limits.get(action_type) else {
            return RateDecision::allow();
        };
        match capped_wait(self.actions.get_mut(action_type), cap, now) {
            Some(wait) => {
                recording::record_rate_limit_denial("action");
                RateDecision::deny(wait, format!("{action_type} limit of {cap}/hour reached"))
            }
            None => RateDecision::allow(),
        }
    }

    /// Count one executed action against its hourly window. Uncapped
    /// types are tracked too so [`status`](Self::status) can report them.
    pub fn record_action(&mut self, action_type: &str, now: f64) {
        let window = self
            .actions
            .entry(action_type.to_string())
            .or_insert_with(|| RateWindow::new(HOUR_SECS));
        window.prune(now);
        window.record(now);
    }

    /// Whether one more send to `channel_id` fits the hourly cap of its
    /// platform.
    pub fn can_send_to_channel(
        &mut self,
        channel_id: &str,
        channel_type: ChannelType,
        now: f64,
    ) -> RateDecision {
        let Some(cap) = self.channel_cap(channel_type) else {
            return RateDecision::allow();
        };
        let window = self.channels.get_mut(channel_id).map(|(_, w)| w);
        match capped_wait(window, cap, now) {
            Some(wait) => {
                recording::record_rate_limit_denial("channel");
                RateDecision::deny(
                    wait,
                    format!("channel {channel_id} limit of {cap}/hour reached"),
                )
            }
            None => RateDecision::allow(),
        }
    }

    pub fn record_channel_send(&mut self, channel_id: &str, channel_type: ChannelType, now: f64) {
        let (_, window) = self
            .channels
            .entry(channel_id.to_string())
            .or_insert_with(|| (channel_type, RateWindow::new(HOUR_SECS)));
        window.prune(now);
        window.record(now);
    }

    fn channel_cap(&self, channel_type: ChannelType) -> Option<usize> {
        self.config
            .channel_type_limits
            .get(&channel_type.to_string())
            .copied()
    }

    /// Forget per-action and per-channel windows with no recent events.
    fn drop_idle_windows(&mut self, now: f64) {
        self.actions.retain(|_, window| {
            window.prune(now);
            !window.is_empty()
        });
        self.channels.retain(|_, (_, window)| {
            window.prune(now);
            !window.is_empty()
        });
    }

    pub fn status(&self, now: f64) -> RateLimitStatus {
        let cooldown_remaining_secs = self
            .cooldown_until
            .map_or(0.0, |until| (until - now).max(0.0));

        let actions = self
            .actions
            .iter()
            .map(|(name, window)| {
                let used = window.count_since(now, HOUR_SECS);
                let limit = self.config.action_limits.get(name).copied();
                (name.clone(), WindowUsage::new(used, limit))
            })
            .collect();
        let channels = self
            .channels
            .iter()
            .map(|(id, (channel_type, window))| {
                let used = window.count_since(now, HOUR_SECS);
                (id.clone(), WindowUsage::new(used, self.channel_cap(*channel_type)))
            })
            .collect();

        RateLimitStatus {
            cycles_last_hour: WindowUsage::new(
                self.cycles.count_since(now, HOUR_SECS),
                Some(self.config.max_cycles_per_hour),
            ),
            cycles_in_burst_window: WindowUsage::new(
                self.cycles.count_since(now, self.config.burst_window_secs),
                Some(self.config.max_burst_cycles),
            ),
            in_cooldown: cooldown_remaining_secs > 0.0,
            cooldown_remaining_secs,
            cooldown_multiplier: self.multiplier,
            cooldowns_entered: self.cooldowns_entered,
            actions,
            channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_per_hour: usize, max_burst: usize) -> RateLimitConfig {
        RateLimitConfig {
            max_cycles_per_hour: max_per_hour,
            max_burst_cycles: max_burst,
            ..RateLimitConfig::default()
        }
    }

    #[test]
    fn allows_under_caps() {
        let mut limiter = RateLimiter::new(&config(10, 5));
        limiter.record_cycle(0.0);
        assert!(limiter.can_process_cycle(1.0).allowed);
    }

    #[test]
    fn checks_do_not_record() {
        let mut limiter = RateLimiter::new(&config(1, 5));
        for t in 0..10 {
            assert!(limiter.can_process_cycle(t as f64).allowed);
        }
    }

    #[test]
    fn calm_cycles_decay_multiplier() {
        let mut limiter = RateLimiter::new(&RateLimitConfig {
            cooldown_multiplier: 2.0,
            ..RateLimitConfig::default()
        });
        limiter.record_cycle(0.0);
        assert!((limiter.multiplier() - 1.9).abs() < 1e-9);
        for i in 1..200 {
            limiter.record_cycle(i as f64 * 600.0);
        }
        assert_eq!(limiter.multiplier(), 1.0);
    }

    #[test]
    fn uncapped_action_is_allowed() {
        let mut limiter = RateLimiter::new(&RateLimitConfig::default());
        for t in 0..500 {
            limiter.record_action("wait", t as f64);
        }
        assert!(limiter.can_execute_action("wait", 500.0).allowed);
    }

    #[test]
    fn action_cap_denies_with_wait() {
        let mut cfg = RateLimitConfig::default();
        cfg.action_limits.insert("follow_user".into(), 2);
        let mut limiter = RateLimiter::new(&cfg);
        limiter.record_action("follow_user", 100.0);
        limiter.record_action("follow_user", 200.0);

        let decision = limiter.can_execute_action("follow_user", 300.0);
        assert!(!decision.allowed);
        assert_eq!(decision.wait_secs, 3400.0);
        assert!(decision.describe().contains("follow_user limit of 2/hour"));
        assert!(limiter.can_execute_action("follow_user", 3701.0).allowed);
    }

    #[test]
    fn channel_caps_follow_platform() {
        let mut cfg = RateLimitConfig::default();
        cfg.channel_type_limits.insert("farcaster".into(), 1);
        let mut limiter = RateLimiter::new(&cfg);
        limiter.record_channel_send("home", ChannelType::Farcaster, 0.0);
        assert!(!limiter.can_send_to_channel("home", ChannelType::Farcaster, 10.0).allowed);
        // Another channel has its own window.
        assert!(limiter.can_send_to_channel("dev", ChannelType::Farcaster, 10.0).allowed);
    }

    #[test]
    fn format_wait_is_readable() {
        assert_eq!(format_wait(0.2), "1s");
        assert_eq!(format_wait(200.0), "3m 20s");
        assert_eq!(format_wait(3900.0), "1h 5m");
    }
}
