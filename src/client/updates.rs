use std::collections::VecDeque;

use palaver_core::{Event, Membership};
use ruma::{OwnedUserId, RoomId, UserId};

/// One observable change to a room. Subscribers drain these in emission
/// order after each sync delta or completed request.
#[derive(Clone, Debug, PartialEq)]
pub enum RoomUpdate {
	NameChanged,
	CanonicalAliasChanged,
	AliasesChanged,
	TopicChanged { old: Option<String> },
	AvatarChanged,
	MembershipChanged { user_id: OwnedUserId, membership: Membership },
	MemberNameChanged { user_id: OwnedUserId, old_name: String },
	MemberDisambiguationChanged { user_id: OwnedUserId, old: String },
	Left { membership: Membership },
	Discontinuity,
	PrevBatch { token: String },
	Message { event: Event },
	HighlightCountChanged { old: u64 },
	NotificationCountChanged { old: u64 },
	ReceiptsChanged,
	TypingChanged,
	StateChanged,
	Error { message: String },
}

/// Pending updates for one room, drained by the subscriber.
#[derive(Debug, Default)]
pub struct Updates {
	queue: VecDeque<RoomUpdate>,
}

/// Dispatch context: the room's identity and where its changes surface.
pub struct Context<'a> {
	pub room_id: &'a RoomId,
	pub updates: &'a mut Updates,
}

impl Updates {
	#[inline]
	pub fn push(&mut self, update: RoomUpdate) { self.queue.push_back(update); }

	#[inline]
	pub fn pop(&mut self) -> Option<RoomUpdate> { self.queue.pop_front() }

	pub fn drain(&mut self) -> Vec<RoomUpdate> { self.queue.drain(..).collect() }

	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool { self.queue.is_empty() }

	#[inline]
	#[must_use]
	pub fn len(&self) -> usize { self.queue.len() }

	pub(crate) fn name_changed(&mut self) { self.push(RoomUpdate::NameChanged); }

	pub(crate) fn canonical_alias_changed(&mut self) {
		self.push(RoomUpdate::CanonicalAliasChanged);
	}

	pub(crate) fn aliases_changed(&mut self) { self.push(RoomUpdate::AliasesChanged); }

	pub(crate) fn topic_changed(&mut self, old: Option<String>) {
		self.push(RoomUpdate::TopicChanged { old });
	}

	pub(crate) fn avatar_changed(&mut self) { self.push(RoomUpdate::AvatarChanged); }

	pub(crate) fn membership_changed(&mut self, user_id: &UserId, membership: Membership) {
		self.push(RoomUpdate::MembershipChanged { user_id: user_id.to_owned(), membership });
	}

	pub(crate) fn member_name_changed(&mut self, user_id: &UserId, old_name: String) {
		self.push(RoomUpdate::MemberNameChanged { user_id: user_id.to_owned(), old_name });
	}

	pub(crate) fn member_disambiguation_changed(&mut self, user_id: OwnedUserId, old: String) {
		self.push(RoomUpdate::MemberDisambiguationChanged { user_id, old });
	}

	pub(crate) fn left(&mut self, membership: Membership) {
		self.push(RoomUpdate::Left { membership });
	}

	pub(crate) fn discontinuity(&mut self) { self.push(RoomUpdate::Discontinuity); }

	pub(crate) fn prev_batch(&mut self, token: String) {
		self.push(RoomUpdate::PrevBatch { token });
	}

	pub(crate) fn message(&mut self, event: Event) { self.push(RoomUpdate::Message { event }); }

	pub(crate) fn highlight_count_changed(&mut self, old: u64) {
		self.push(RoomUpdate::HighlightCountChanged { old });
	}

	pub(crate) fn notification_count_changed(&mut self, old: u64) {
		self.push(RoomUpdate::NotificationCountChanged { old });
	}

	pub(crate) fn receipts_changed(&mut self) { self.push(RoomUpdate::ReceiptsChanged); }

	pub(crate) fn typing_changed(&mut self) { self.push(RoomUpdate::TypingChanged); }

	pub(crate) fn state_changed(&mut self) { self.push(RoomUpdate::StateChanged); }

	pub(crate) fn error(&mut self, message: String) { self.push(RoomUpdate::Error { message }); }
}
