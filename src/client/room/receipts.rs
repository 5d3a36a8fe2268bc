use palaver_core::{StateEventKind, implement};
use ruma::{EventId, OwnedEventId, OwnedUserId, UserId};
use serde_json::Value as JsonValue;

use super::{Receipt, Room};

#[implement(Room)]
/// Record a user's read receipt, keeping both directions of the index
/// consistent: the user's previous receipt, if any, loses its entry
/// under the old event first.
pub fn update_receipt(&mut self, user_id: OwnedUserId, event_id: OwnedEventId, ts: u64) {
	let receipt = Receipt { event_id: event_id.clone(), ts };

	if let Some(old) = self.receipts_by_user.insert(user_id.clone(), receipt) {
		if let Some(readers) = self.receipts_by_event.get_mut(&old.event_id) {
			readers.retain(|reader| reader != &user_id);
		}
	}

	self.receipts_by_event
		.entry(event_id)
		.or_default()
		.push(user_id);
}

#[implement(Room)]
/// Everyone whose receipt points at this event.
pub fn receipts_for(
	&self,
	event_id: &EventId,
) -> impl Iterator<Item = (&UserId, &Receipt)> + '_ {
	self.receipts_by_event
		.get(event_id)
		.into_iter()
		.flatten()
		.map(|user_id| {
			let receipt = self
				.receipts_by_user
				.get(user_id)
				.expect("receipt cross-index is consistent");

			(&**user_id, receipt)
		})
}

#[implement(Room)]
#[must_use]
pub fn receipt_from(&self, user_id: &UserId) -> Option<&Receipt> {
	self.receipts_by_user.get(user_id)
}

#[implement(Room)]
/// Whether the buffer holds messages from others newer than our own
/// read receipt. Empty or receipt-less buffers count as unread.
#[must_use]
pub fn has_unread(&self) -> bool {
	let Some(tail) = self.buffer.back() else {
		return true;
	};
	if tail.events.is_empty() {
		return true;
	}
	let Some(receipt) = self.receipt_from(self.user_id()) else {
		return true;
	};

	for batch in self.buffer.iter().rev() {
		for event in batch.events.iter().rev() {
			if receipt.event_id == event.event_id {
				return false;
			}
			if event.state_kind() == StateEventKind::Message && event.sender != *self.user_id() {
				return true;
			}
		}
	}

	true
}

#[implement(Room)]
/// Ingest one `m.receipt` ephemeral: `{event_id: {"m.read": {user:
/// {ts}}}}` for any number of events and users.
pub(super) fn ingest_receipts(&mut self, content: &JsonValue) {
	let Some(by_event) = content.as_object() else {
		return;
	};

	for (event_id, receipts) in by_event {
		let Ok(event_id) = EventId::parse(event_id.as_str()) else {
			continue;
		};
		let Some(readers) = receipts
			.get("m.read")
			.and_then(JsonValue::as_object)
		else {
			continue;
		};

		for (user_id, receipt) in readers {
			let Ok(user_id) = UserId::parse(user_id.as_str()) else {
				continue;
			};
			let ts = receipt
				.get("ts")
				.and_then(JsonValue::as_u64)
				.unwrap_or(0);

			self.update_receipt(user_id, event_id.clone(), ts);
		}
	}
}
