use palaver_core::{Event, debug, implement};
use palaver_database::Batch;
use ruma::OwnedUserId;
use serde::Deserialize;

use super::{Room, TimelineBatch};
use crate::{sync::JoinedRoom, updates::Context};

#[derive(Default, Deserialize)]
struct ExtractTyping {
	#[serde(default)]
	user_ids: Vec<OwnedUserId>,
}

#[implement(Room)]
/// Consume one sync delta. Member writes land in the caller's batch;
/// the caller owns the commit, which makes the whole delta atomic.
/// Returns whether any state event changed the snapshot.
#[tracing::instrument(level = "debug", skip_all, fields(room_id = %self.id))]
pub fn dispatch(&mut self, txn: &mut Batch, joined: &JoinedRoom) -> bool {
	let mut state_touched = false;

	if joined.unread_notifications.highlight_count != self.highlight_count {
		let old = self.highlight_count;
		self.highlight_count = joined.unread_notifications.highlight_count;
		self.updates.highlight_count_changed(old);
	}

	if joined.unread_notifications.notification_count != self.notification_count {
		let old = self.notification_count;
		self.notification_count = joined.unread_notifications.notification_count;
		self.updates.notification_count_changed(old);
	}

	state_touched |= self.load_state(txn, &joined.state.events);

	if joined.timeline.limited {
		self.buffer.clear();
		self.updates.discontinuity();
	}

	// Must come after discontinuity so subscribers can discard their
	// existing timeline first
	self.updates
		.prev_batch(joined.timeline.prev_batch.clone());

	// Only the first batch in the buffer may ever be empty
	if joined.timeline.events.is_empty() && !self.buffer.is_empty() {
		self.buffer
			.back_mut()
			.expect("buffer is non-empty")
			.prev_batch = joined.timeline.prev_batch.clone();
	} else {
		self.buffer.push_back(TimelineBatch {
			prev_batch: joined.timeline.prev_batch.clone(),
			events: Vec::with_capacity(joined.timeline.events.len()),
		});

		for event in &joined.timeline.events {
			let mut context = Context {
				room_id: &self.id,
				updates: &mut self.updates,
			};
			state_touched |=
				self.state
					.dispatch(event, Some(&mut context), Some((&self.members, &mut *txn)));

			// In place before `message` so has_unread already accounts for
			// the event in question
			self.buffer
				.back_mut()
				.expect("batch was just appended")
				.events
				.push(event.clone());

			self.updates.message(event.clone());

			// After this event but before the next, so display names are
			// correct for leave/ban events as well as whatever follows
			let mut context = Context {
				room_id: &self.id,
				updates: &mut self.updates,
			};
			self.state.prune_departed(Some(&mut context));
		}

		self.evict_buffer();
	}

	for event in &joined.ephemeral.events {
		match event.kind.as_str() {
			| "m.receipt" => {
				self.ingest_receipts(&event.content);
				self.updates.receipts_changed();
			},
			| "m.typing" => {
				let ExtractTyping { user_ids } =
					serde_json::from_value(event.content.clone()).unwrap_or_default();
				self.typing = user_ids;
				self.updates.typing_changed();
			},
			| _ => debug!("unrecognized ephemeral event type {:?}", event.kind),
		}
	}

	if state_touched {
		self.updates.state_changed();
	}

	state_touched
}

#[implement(Room)]
/// Fold state known to precede the timeline into both snapshots. The
/// replay law is preserved because the events land on each side of the
/// buffer at once.
pub fn load_state(&mut self, txn: &mut Batch, events: &[Event]) -> bool {
	let mut touched = false;

	for event in events {
		self.initial_state.apply(event);
		self.initial_state.prune_departed(None);

		let mut context = Context {
			room_id: &self.id,
			updates: &mut self.updates,
		};
		touched |= self
			.state
			.dispatch(event, Some(&mut context), Some((&self.members, &mut *txn)));

		let mut context = Context {
			room_id: &self.id,
			updates: &mut self.updates,
		};
		self.state.prune_departed(Some(&mut context));
	}

	touched
}
