use std::{
	collections::{BTreeMap, HashMap, VecDeque},
	sync::Arc,
};

use palaver_core::{Event, Result, implement};
use palaver_database::Map;
use ruma::{OwnedRoomId, OwnedUserId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{Receipt, Room, TimelineBatch, send::Outbox};
use crate::{
	members::Members,
	session::Session,
	state::{RoomState, StateJson},
	updates::Updates,
};

/// The persisted form of a room. Only the newest batch of the buffer
/// survives persistence; members live in the members index.
#[derive(Debug, Default, Deserialize, Serialize)]
struct RoomJson {
	#[serde(default)]
	initial_state: StateJson,

	#[serde(default)]
	buffer: BufferJson,

	#[serde(default)]
	highlight_count: u64,

	#[serde(default)]
	notification_count: u64,

	#[serde(default)]
	receipts: BTreeMap<OwnedUserId, Receipt>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct BufferJson {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	prev_batch: String,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	events: Vec<Event>,
}

impl BufferJson {
	fn is_empty(&self) -> bool { self.prev_batch.is_empty() && self.events.is_empty() }
}

#[implement(Room)]
/// Restore a room from its persisted JSON and the members index,
/// replaying the persisted batch onto the restored checkpoint.
pub fn open(
	session: Arc<dyn Session>,
	id: OwnedRoomId,
	members_map: Arc<Map>,
	info: &JsonValue,
) -> Result<Self> {
	let info: RoomJson = serde_json::from_value(info.clone())?;
	let members = Members::new(members_map, id.clone());

	let initial_state = RoomState::load(&info.initial_state, &members)?;
	let mut state = initial_state.clone();

	let mut room = Self {
		id,
		session,
		members,
		initial_state,
		state: RoomState::default(),
		buffer: VecDeque::new(),
		highlight_count: info.highlight_count,
		notification_count: info.notification_count,
		receipts_by_user: HashMap::new(),
		receipts_by_event: HashMap::new(),
		typing: Vec::new(),
		updates: Updates::default(),
		outbox: Outbox::default(),
	};

	if !info.buffer.is_empty() {
		let mut batch = TimelineBatch {
			prev_batch: info.buffer.prev_batch,
			events: Vec::with_capacity(info.buffer.events.len()),
		};
		for event in info.buffer.events {
			state.apply(&event);
			state.prune_departed(None);
			batch.events.push(event);
		}
		room.buffer.push_back(batch);
	}
	room.state = state;

	for (user_id, receipt) in info.receipts {
		room.update_receipt(user_id, receipt.event_id, receipt.ts);
	}

	Ok(room)
}

#[implement(Room)]
/// The persisted form of this room. Transient fields (the outbound
/// queue and pending updates) are not carried.
#[must_use]
pub fn to_json(&self) -> JsonValue {
	let buffer = self
		.buffer
		.back()
		.map(|batch| BufferJson {
			prev_batch: batch.prev_batch.clone(),
			events: batch.events.clone(),
		})
		.unwrap_or_default();

	let receipts = self
		.receipts_by_user
		.iter()
		.map(|(user_id, receipt)| (user_id.clone(), receipt.clone()))
		.collect();

	serde_json::to_value(RoomJson {
		initial_state: self.initial_state.to_json(),
		buffer,
		highlight_count: self.highlight_count,
		notification_count: self.notification_count,
		receipts,
	})
	.expect("room always serializes")
}
