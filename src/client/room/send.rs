use std::{collections::VecDeque, time::Duration};

use palaver_core::{debug, implement};
use serde_json::{Value as JsonValue, json};

use super::Room;
use crate::http::encode_segment;

/// Floor of the retry schedule; default synapse seconds-per-message
/// when throttled.
const MINIMUM_BACKOFF: Duration = Duration::from_secs(5);

const MAXIMUM_BACKOFF: Duration = Duration::from_secs(30);

const BACKOFF_MULTIPLIER: f64 = 1.25;

/// An event queued for transmission.
#[derive(Clone, Debug)]
pub struct OutgoingEvent {
	pub kind: String,
	pub content: JsonValue,
}

/// Single-flight outbound queue. The transaction id sticks to the head
/// event across retries so the server deduplicates; it is released only
/// once that event leaves the queue.
#[derive(Debug)]
pub(super) struct Outbox {
	pending: VecDeque<OutgoingEvent>,
	txn_id: Option<String>,
	backoff: Duration,
}

impl Default for Outbox {
	fn default() -> Self {
		Self {
			pending: VecDeque::new(),
			txn_id: None,
			backoff: MINIMUM_BACKOFF,
		}
	}
}

#[implement(Room)]
/// Queue an event for transmission; [`Self::transmit_events`] drives
/// delivery.
pub fn send(&mut self, kind: impl Into<String>, content: JsonValue) {
	self.outbox.pending.push_back(OutgoingEvent { kind: kind.into(), content });
}

#[implement(Room)]
pub fn send_message(&mut self, body: &str) {
	self.send("m.room.message", json!({
		"msgtype": "m.text",
		"body": body,
	}));
}

#[implement(Room)]
pub fn send_emote(&mut self, body: &str) {
	self.send("m.room.message", json!({
		"msgtype": "m.emote",
		"body": body,
	}));
}

#[implement(Room)]
pub fn send_file(&mut self, url: &str, name: &str, media_type: &str, size: u64) {
	self.send("m.room.message", json!({
		"msgtype": "m.file",
		"url": url,
		"filename": name,
		"body": name,
		"info": {
			"mimetype": media_type,
			"size": size,
		},
	}));
}

#[implement(Room)]
#[must_use]
pub fn pending_events(&self) -> usize { self.outbox.pending.len() }

#[implement(Room)]
/// Drive the outbound queue until empty: at most one request is ever in
/// flight. Transient failures (rate-limiting, server errors, transport)
/// retry the head event after an exponential back-off with its
/// transaction id intact; other client errors surface an error update
/// and advance the queue.
#[tracing::instrument(level = "debug", skip_all, fields(room_id = %self.id))]
pub async fn transmit_events(&mut self) {
	while let Some(event) = self.outbox.pending.front().cloned() {
		let txn_id = self
			.outbox
			.txn_id
			.get_or_insert_with(|| self.session.next_transaction_id())
			.clone();

		let path = format!(
			"client/r0/rooms/{}/send/{}/{}",
			encode_segment(self.id.as_str()),
			encode_segment(&event.kind),
			txn_id,
		);

		let reply = self.session.client().put(&path, event.content).await;

		let mut retrying = false;
		match reply {
			| Ok(reply) if (400..500).contains(&reply.status) && reply.status != 429 => {
				// Client errors other than rate-limiting are unrecoverable
				self.updates.error(reply.error_message());
				self.outbox.pending.pop_front();
			},
			| Ok(reply) if reply.is_success() => {
				self.outbox.pending.pop_front();
			},
			| Ok(reply) => {
				retrying = true;
				debug!(
					"retrying send in {:?} due to: {}",
					self.outbox.backoff,
					reply.error_message(),
				);
			},
			| Err(e) => {
				retrying = true;
				debug!("retrying send in {:?} due to error: {e}", self.outbox.backoff);
			},
		}

		if retrying {
			tokio::time::sleep(self.outbox.backoff).await;
			self.outbox.backoff = MAXIMUM_BACKOFF.min(self.outbox.backoff.mul_f64(BACKOFF_MULTIPLIER));
		} else {
			self.outbox.txn_id = None;
			self.outbox.backoff = MINIMUM_BACKOFF;
		}
	}
}
