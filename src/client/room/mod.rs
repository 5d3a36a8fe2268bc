mod dispatch;
mod fetch;
mod persist;
mod receipts;
mod send;
#[cfg(test)]
mod tests;
mod timeline;

use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
};

use palaver_database::Map;
use ruma::{OwnedEventId, OwnedRoomId, OwnedUserId, RoomId, UserId};
use serde::{Deserialize, Serialize};

pub use self::{
	fetch::{Direction, MessageBatch},
	send::OutgoingEvent,
	timeline::TimelineBatch,
};
use self::send::Outbox;
use crate::{
	members::Members,
	session::Session,
	state::RoomState,
	updates::{RoomUpdate, Updates},
};

/// A user's read position: the newest event they acknowledged and when.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Receipt {
	pub event_id: OwnedEventId,

	#[serde(default)]
	pub ts: u64,
}

/// One joined room: the state snapshots, the recent-events buffer, read
/// receipts, unread counters and the outbound queue.
pub struct Room {
	id: OwnedRoomId,
	session: Arc<dyn Session>,
	members: Members,
	initial_state: RoomState,
	state: RoomState,
	buffer: VecDeque<TimelineBatch>,
	highlight_count: u64,
	notification_count: u64,
	receipts_by_user: HashMap<OwnedUserId, Receipt>,
	receipts_by_event: HashMap<OwnedEventId, Vec<OwnedUserId>>,
	typing: Vec<OwnedUserId>,
	updates: Updates,
	outbox: Outbox,
}

impl Room {
	/// A room first seen, with nothing persisted yet.
	#[must_use]
	pub fn new(session: Arc<dyn Session>, id: OwnedRoomId, members_map: Arc<Map>) -> Self {
		let members = Members::new(members_map, id.clone());

		Self {
			id,
			session,
			members,
			initial_state: RoomState::default(),
			state: RoomState::default(),
			buffer: VecDeque::new(),
			highlight_count: 0,
			notification_count: 0,
			receipts_by_user: HashMap::new(),
			receipts_by_event: HashMap::new(),
			typing: Vec::new(),
			updates: Updates::default(),
			outbox: Outbox::default(),
		}
	}

	#[inline]
	#[must_use]
	pub fn id(&self) -> &RoomId { &self.id }

	#[inline]
	#[must_use]
	pub fn state(&self) -> &RoomState { &self.state }

	/// The checkpoint the buffered events replay onto.
	#[inline]
	#[must_use]
	pub fn initial_state(&self) -> &RoomState { &self.initial_state }

	#[inline]
	#[must_use]
	pub fn buffer(&self) -> &VecDeque<TimelineBatch> { &self.buffer }

	#[inline]
	#[must_use]
	pub fn highlight_count(&self) -> u64 { self.highlight_count }

	#[inline]
	#[must_use]
	pub fn notification_count(&self) -> u64 { self.notification_count }

	/// Users typing as of the latest ephemeral update.
	#[inline]
	#[must_use]
	pub fn typing(&self) -> &[OwnedUserId] { &self.typing }

	/// The rendered room name for the logged-in user.
	#[must_use]
	pub fn pretty_name(&self) -> String { self.state.pretty_name(self.session.user_id()) }

	/// Next pending change notification, in emission order.
	pub fn poll_update(&mut self) -> Option<RoomUpdate> { self.updates.pop() }

	/// Drain all pending change notifications.
	pub fn drain_updates(&mut self) -> Vec<RoomUpdate> { self.updates.drain() }

	fn user_id(&self) -> &UserId { self.session.user_id() }
}
