// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform sender capturing outbound actions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chorus_core::error::ChorusError;
use chorus_core::traits::{ActionSender, OutboundAction, SendReceipt};
use chorus_core::types::ChannelType;
use tokio::sync::Mutex;

pub struct MockSender {
    platform: ChannelType,
    sent: Mutex<Vec<OutboundAction>>,
    fail: AtomicBool,
    next_id: AtomicU64,
}

impl MockSender {
    pub fn new(platform: ChannelType) -> Self {
        Self {
            platform,
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OutboundAction> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ActionSender for MockSender {
    fn platform(&self) -> ChannelType {
        self.platform
    }

    async fn send(&self, action: &OutboundAction) -> Result<SendReceipt, ChorusError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChorusError::Send {
                platform: self.platform.to_string(),
                message: "mock send failure".into(),
                source: None,
            });
        }
        self.sent.lock().await.push(action.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(SendReceipt {
            platform_id: Some(format!("mock-{id}")),
        })
    }
}
