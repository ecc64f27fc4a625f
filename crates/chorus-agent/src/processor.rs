// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Standard cycle processor: payload in, planned actions out.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chorus_context::ContextPayloadBuilder;
use chorus_core::error::ChorusError;
use chorus_core::traits::{
    CycleOutcome, CycleProcessor, CycleRequest, DecisionEngine, DecisionRequest, OutboundAction,
    PlannedAction,
};
use chorus_core::types::{ActionStatus, ChannelType};
use chorus_world::WorldStateStore;
use serde_json::Value;
use tracing::debug;

use crate::scheduler::{ActionScheduler, EnqueueOutcome};

/// Builds a payload from the store, asks the decision engine what to do and
/// records every planned action back into the store.
///
/// Actions planned as [`ActionStatus::Scheduled`] are outbound sends. When a
/// scheduler is attached for their platform they go through its queue
/// instead, and the scheduler records them once dispatched.
pub struct PayloadCycleProcessor {
    store: Arc<WorldStateStore>,
    builder: ContextPayloadBuilder,
    engine: Arc<dyn DecisionEngine>,
    schedulers: HashMap<ChannelType, Arc<ActionScheduler>>,
}

impl PayloadCycleProcessor {
    pub fn new(
        store: Arc<WorldStateStore>,
        builder: ContextPayloadBuilder,
        engine: Arc<dyn DecisionEngine>,
    ) -> Self {
        Self {
            store,
            builder,
            engine,
            schedulers: HashMap::new(),
        }
    }

    /// Route scheduled actions for the scheduler's platform through it.
    pub fn with_scheduler(mut self, scheduler: Arc<ActionScheduler>) -> Self {
        self.schedulers.insert(scheduler.platform(), scheduler);
        self
    }

    pub fn builder(&self) -> &ContextPayloadBuilder {
        &self.builder
    }

    /// Scheduler that should send `action`, if it is outbound and its
    /// platform has one. An explicit `platform` parameter wins over the
    /// platform of the channel named by `channel_id`.
    async fn scheduler_for(&self, action: &PlannedAction) -> Option<&Arc<ActionScheduler>> {
        if action.result != ActionStatus::Scheduled || self.schedulers.is_empty() {
            return None;
        }
        let explicit = action
            .parameters
            .get("platform")
            .and_then(Value::as_str)
            .and_then(|p| ChannelType::from_str(p).ok());
        let platform = match explicit {
            Some(platform) => platform,
            None => {
                let channel_id = action.parameters.get("channel_id").and_then(Value::as_str)?;
                self.store.read().await.find_channel(channel_id)?.channel_type
            }
        };
        self.schedulers.get(&platform)
    }
}

/// Split the well-known parameters back out of a planned send.
fn outbound_from(action: PlannedAction) -> OutboundAction {
    let mut parameters = action.parameters;
    let mut take = |key: &str| match parameters.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            parameters.insert(key.to_string(), other);
            None
        }
        None => None,
    };
    let channel_id = take("channel_id");
    let target_id = take("target_id");
    let content = take("content");
    parameters.remove("platform");

    OutboundAction {
        action_type: action.action_type,
        channel_id,
        target_id,
        content,
        parameters,
    }
}

#[async_trait]
impl CycleProcessor for PayloadCycleProcessor {
    async fn process_cycle(&self, request: CycleRequest) -> Result<CycleOutcome, ChorusError> {
        let built = {
            let state = self.store.read().await;
            self.builder.build(
                &state,
                request.primary_channel.as_deref(),
                request.started_at,
            )
        };

        debug!(
            cycle_id = request.cycle_id,
            engine = self.engine.name(),
            mode = %built.mode,
            size_bytes = built.stats.size_bytes,
            "payload built, requesting decision"
        );

        let planned = self
            .engine
            .decide(DecisionRequest {
                cycle_id: request.cycle_id,
                primary_channel: request.primary_channel.clone(),
                payload_mode: built.mode.to_string(),
                payload: built.payload,
            })
            .await?;

        let mut actions_recorded = 0;
        let mut actions_scheduled = 0;
        for action in planned {
            if let Some(scheduler) = self.scheduler_for(&action).await {
                let action_type = action.action_type.clone();
                match scheduler.enqueue(outbound_from(action)).await {
                    EnqueueOutcome::Queued { .. } => actions_scheduled += 1,
                    outcome => debug!(
                        cycle_id = request.cycle_id,
                        action_type = %action_type,
                        ?outcome,
                        "scheduled action not queued"
                    ),
                }
                continue;
            }
            actions_recorded += 1;
            self.store
                .record_action(
                    &action.action_type,
                    action.parameters,
                    action.result,
                    action.correlation_id,
                )
                .await;
        }

        Ok(CycleOutcome {
            actions_recorded,
            actions_scheduled,
            payload_mode: Some(built.mode.to_string()),
            payload_bytes: Some(built.stats.size_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chorus_config::model::WorldConfig;
    use chorus_core::traits::PlannedAction;
    use chorus_core::types::{ActionStatus, ChannelType, Message, SenderInfo};
    use serde_json::json;

    use super::*;

    struct Scripted {
        seen: Mutex<Vec<DecisionRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl DecisionEngine for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn decide(&self, request: DecisionRequest) -> Result<Vec<PlannedAction>, ChorusError> {
            self.seen.lock().unwrap().push(request);
            if self.fail {
                return Err(ChorusError::engine("model unavailable"));
            }
            Ok(vec![
                PlannedAction::new("wait", ActionStatus::Success)
                    .with_parameter("reason", json!("nothing new")),
            ])
        }
    }

    fn request() -> CycleRequest {
        CycleRequest {
            cycle_id: 7,
            primary_channel: None,
            trigger: Some("new_message".into()),
            started_at: 100.0,
        }
    }

    #[tokio::test]
    async fn records_planned_actions() {
        let store = Arc::new(WorldStateStore::new(&WorldConfig::default()));
        let msg = Message::new("m1", "C1", ChannelType::Farcaster, SenderInfo::new("fid:1"), "gm", 50.0);
        store.add_message("C1", msg).await;

        let engine = Arc::new(Scripted {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let processor =
            PayloadCycleProcessor::new(store.clone(), ContextPayloadBuilder::default(), engine.clone());

        let outcome = processor.process_cycle(request()).await.unwrap();
        assert_eq!(outcome.actions_recorded, 1);
        assert_eq!(outcome.payload_mode.as_deref(), Some("full"));

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen[0].cycle_id, 7);
        assert_eq!(seen[0].payload["channels"]["detailed"][0]["id"], "C1");

        let state = store.read().await;
        assert_eq!(state.actions().len(), 1);
        assert_eq!(state.actions()[0].action_type, "wait");
    }

    #[tokio::test]
    async fn engine_errors_propagate() {
        let store = Arc::new(WorldStateStore::new(&WorldConfig::default()));
        let engine = Arc::new(Scripted {
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let processor = PayloadCycleProcessor::new(store.clone(), ContextPayloadBuilder::default(), engine);
        let err = processor.process_cycle(request()).await.unwrap_err();
        assert!(matches!(err, ChorusError::Engine { .. }));
        assert!(store.read().await.actions().is_empty());
    }

    #[tokio::test]
    async fn scheduled_sends_go_through_platform_scheduler() {
        use chorus_config::model::{RateLimitConfig, SchedulerConfig};
        use chorus_ratelimit::RateLimiter;
        use chorus_test_utils::{MockDecisionEngine, MockSender};
        use tokio::sync::Mutex as AsyncMutex;

        let store = Arc::new(WorldStateStore::new(&WorldConfig::default()));
        let msg = Message::new("m1", "C1", ChannelType::Farcaster, SenderInfo::new("fid:1"), "gm", 50.0);
        store.add_message("C1", msg).await;

        let limiter = Arc::new(AsyncMutex::new(RateLimiter::new(&RateLimitConfig::default())));
        let scheduler = Arc::new(ActionScheduler::new(
            Arc::new(MockSender::new(ChannelType::Farcaster)),
            store.clone(),
            limiter,
            &SchedulerConfig::default(),
        ));

        let engine = Arc::new(MockDecisionEngine::with_plans(vec![vec![
            PlannedAction::new("like_cast", ActionStatus::Scheduled)
                .with_parameter("channel_id", json!("C1"))
                .with_parameter("target_id", json!("m1")),
            PlannedAction::new("send_matrix_message", ActionStatus::Scheduled)
                .with_parameter("platform", json!("matrix"))
                .with_parameter("content", json!("hello")),
            PlannedAction::new("wait", ActionStatus::Success),
        ]]));
        let processor =
            PayloadCycleProcessor::new(store.clone(), ContextPayloadBuilder::default(), engine)
                .with_scheduler(scheduler.clone());

        let outcome = processor.process_cycle(request()).await.unwrap();
        assert_eq!(outcome.actions_scheduled, 1);
        assert_eq!(outcome.actions_recorded, 2);
        assert_eq!(scheduler.queue_len().await, 1);

        // No matrix scheduler attached, so that send is recorded as planned.
        let state = store.read().await;
        let types: Vec<&str> = state.actions().iter().map(|a| a.action_type.as_str()).collect();
        assert_eq!(types, ["send_matrix_message", "wait"]);
    }

    #[test]
    fn outbound_conversion_splits_known_parameters() {
        let planned = PlannedAction::new("reply_to_cast", ActionStatus::Scheduled)
            .with_parameter("channel_id", json!("C1"))
            .with_parameter("target_id", json!(42))
            .with_parameter("content", json!("agreed"))
            .with_parameter("platform", json!("farcaster"))
            .with_parameter("embed", json!("https://example.com"));

        let outbound = outbound_from(planned);
        assert_eq!(outbound.channel_id.as_deref(), Some("C1"));
        assert_eq!(outbound.target_id.as_deref(), Some("42"));
        assert_eq!(outbound.content.as_deref(), Some("agreed"));
        assert_eq!(outbound.parameters.len(), 1);
        assert_eq!(outbound.parameters["embed"], "https://example.com");
    }
}
