// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message builders for tests.

use chorus_core::types::{ChannelType, Message, SenderInfo};

/// A Matrix room message from `@{user}:example.org`.
pub fn matrix_message(id: &str, room: &str, user: &str, text: &str, timestamp: f64) -> Message {
    let mut sender = SenderInfo::new(format!("@{user}:example.org"));
    sender.display_name = Some(user.to_string());
    Message::new(id, room, ChannelType::Matrix, sender, text, timestamp)
}

/// A Farcaster cast from `fid` in `channel`.
pub fn farcaster_cast(id: &str, channel: &str, fid: u64, text: &str, timestamp: f64) -> Message {
    let mut sender = SenderInfo::new(format!("fid:{fid}"));
    sender.user_id = Some(fid);
    sender.username = Some(format!("user{fid}"));
    Message::new(id, channel, ChannelType::Farcaster, sender, text, timestamp)
}

/// A Farcaster reply to `parent`.
pub fn farcaster_reply(
    id: &str,
    channel: &str,
    fid: u64,
    parent: &str,
    text: &str,
    timestamp: f64,
) -> Message {
    farcaster_cast(id, channel, fid, text, timestamp).with_reply_to(parent)
}

/// `count` casts `{prefix}1..={prefix}{count}` one second apart from `start`.
pub fn cast_series(prefix: &str, channel: &str, count: usize, start: f64) -> Vec<Message> {
    (1..=count)
        .map(|i| {
            farcaster_cast(
                &format!("{prefix}{i}"),
                channel,
                100 + i as u64,
                &format!("cast number {i}"),
                start + i as f64,
            )
        })
        .collect()
}
