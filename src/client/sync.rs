//! Inbound sync-delta shapes, as delivered by the long-poll sync client.

use palaver_core::Event;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// One room's delta within a sync response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JoinedRoom {
	#[serde(default)]
	pub unread_notifications: UnreadNotifications,

	#[serde(default)]
	pub timeline: Timeline,

	#[serde(default)]
	pub ephemeral: Ephemeral,

	#[serde(default)]
	pub state: State,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct UnreadNotifications {
	#[serde(default)]
	pub highlight_count: u64,

	#[serde(default)]
	pub notification_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Timeline {
	#[serde(default)]
	pub limited: bool,

	#[serde(default)]
	pub prev_batch: String,

	#[serde(default)]
	pub events: Vec<Event>,
}

/// State known to precede the timeline section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct State {
	#[serde(default)]
	pub events: Vec<Event>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Ephemeral {
	#[serde(default)]
	pub events: Vec<EphemeralEvent>,
}

/// Ephemeral events carry neither sender nor id.
#[derive(Clone, Debug, Deserialize)]
pub struct EphemeralEvent {
	#[serde(rename = "type")]
	pub kind: String,

	#[serde(default)]
	pub content: JsonValue,
}
