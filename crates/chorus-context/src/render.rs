// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON renderers shared by the flat and node views.

use chorus_config::model::ContextConfig;
use chorus_core::types::{ActionRecord, Channel, Goal, Message, SenderInfo};
use serde_json::{Map, Value, json};

/// Characters kept from a message body in summarized form.
pub const SUMMARY_TEXT_CHARS: usize = 100;
/// Characters kept from the latest message in one-line channel summaries.
const PREVIEW_TEXT_CHARS: usize = 60;

/// Truncate to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}…", &text[..cut]),
    }
}

fn render_sender(sender: &SenderInfo, detailed: bool) -> Value {
    if !detailed {
        return Value::String(sender.label().to_string());
    }
    let mut obj = Map::new();
    obj.insert("id".into(), json!(sender.raw));
    if let Some(username) = &sender.username {
        obj.insert("username".into(), json!(username));
    }
    if let Some(display_name) = &sender.display_name {
        obj.insert("display_name".into(), json!(display_name));
    }
    if let Some(user_id) = sender.user_id {
        obj.insert("user_id".into(), json!(user_id));
    }
    Value::Object(obj)
}

/// Render one message, full or summarized according to `summarize`.
pub fn render_message(message: &Message, config: &ContextConfig, summarize: bool) -> Value {
    let sender = render_sender(&message.sender, config.include_detailed_user_info && !summarize);
    if summarize {
        return json!({
            "id": message.id,
            "sender": sender,
            "text": truncate_chars(&message.content, SUMMARY_TEXT_CHARS),
            "timestamp": message.timestamp,
        });
    }

    let mut obj = Map::new();
    obj.insert("id".into(), json!(message.id));
    obj.insert("sender".into(), sender);
    obj.insert("content".into(), json!(message.content));
    obj.insert("timestamp".into(), json!(message.timestamp));
    if let Some(reply_to) = &message.reply_to {
        obj.insert("reply_to".into(), json!(reply_to));
    }
    if !message.image_urls.is_empty() {
        obj.insert("image_urls".into(), json!(message.image_urls));
    }
    if !message.attachments.is_empty() {
        obj.insert("attachments".into(), json!(message.attachments));
    }
    if !message.metadata.is_empty() {
        obj.insert("metadata".into(), json!(message.metadata));
    }
    Value::Object(obj)
}

/// The `limit` most recent messages, oldest first.
pub fn recent_messages<'a, I>(messages: I, limit: usize) -> Vec<&'a Message>
where
    I: DoubleEndedIterator<Item = &'a Message>,
{
    let mut recent: Vec<&Message> = messages.rev().take(limit).collect();
    recent.reverse();
    recent
}

/// Channel attributes without messages.
pub fn render_channel_info(channel: &Channel) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(channel.id));
    obj.insert("platform".into(), json!(channel.channel_type));
    obj.insert("name".into(), json!(channel.name));
    obj.insert("status".into(), json!(channel.status));
    obj.insert("status_changed_at".into(), json!(channel.status_changed_at));
    obj.insert("message_count".into(), json!(channel.messages.len()));
    if let Some(last) = channel.last_activity() {
        obj.insert("last_activity".into(), json!(last));
    }
    if let Some(checked) = channel.last_checked {
        obj.insert("last_checked".into(), json!(checked));
    }
    let meta = &channel.metadata;
    if let Some(topic) = &meta.topic {
        obj.insert("topic".into(), json!(topic));
    }
    if let Some(members) = meta.member_count {
        obj.insert("member_count".into(), json!(members));
    }
    if meta.encrypted {
        obj.insert("encrypted".into(), json!(true));
    }
    if !meta.aliases.is_empty() {
        obj.insert("aliases".into(), json!(meta.aliases));
    }
    Value::Object(obj)
}

/// One-line summary of a channel that is not rendered in detail.
pub fn render_channel_summary(channel: &Channel) -> Value {
    let latest = channel.messages.back().map(|m| {
        format!(
            "{}: {}",
            m.sender.label(),
            truncate_chars(&m.content, PREVIEW_TEXT_CHARS)
        )
    });
    json!({
        "id": channel.id,
        "platform": channel.channel_type,
        "name": channel.name,
        "status": channel.status,
        "message_count": channel.messages.len(),
        "last_activity": channel.last_activity(),
        "latest": latest,
    })
}

pub fn render_action(record: &ActionRecord) -> Value {
    json!(record)
}

pub fn render_goal(goal: &Goal) -> Value {
    json!(goal)
}
