use palaver_core::{Event, Result, err, implement};
use ruma::EventId;
use serde_json::{Value as JsonValue, json};

use super::Room;
use crate::http::encode_segment;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
	Forward,
	Backward,
}

impl Direction {
	#[inline]
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			| Self::Forward => "f",
			| Self::Backward => "b",
		}
	}
}

/// One page of history from `/messages`.
#[derive(Clone, Debug)]
pub struct MessageBatch {
	pub start: String,
	pub end: String,
	pub events: Vec<Event>,
}

#[implement(Room)]
/// Fetch a page of history around a pagination token.
pub async fn messages(
	&self,
	dir: Direction,
	from: &str,
	limit: u64,
	to: Option<&str>,
) -> Result<MessageBatch> {
	let mut query: Vec<(&str, String)> =
		vec![("from", from.to_owned()), ("dir", dir.as_str().to_owned())];
	if limit != 0 {
		query.push(("limit", limit.to_string()));
	}
	if let Some(to) = to {
		query.push(("to", to.to_owned()));
	}

	let path = format!("client/r0/rooms/{}/messages", encode_segment(self.id.as_str()));
	let body = self
		.session
		.client()
		.get(&path, &query)
		.await?
		.into_result()?;

	let start = body
		.get("start")
		.and_then(JsonValue::as_str)
		.ok_or(err!(BadServerResponse("start")))?
		.to_owned();
	let end = body
		.get("end")
		.and_then(JsonValue::as_str)
		.ok_or(err!(BadServerResponse("end")))?
		.to_owned();
	let chunk = body
		.get("chunk")
		.and_then(JsonValue::as_array)
		.ok_or(err!(BadServerResponse("chunk")))?;

	let events = chunk
		.iter()
		.map(|raw| serde_json::from_value(raw.clone()))
		.collect::<Result<Vec<Event>, _>>()?;

	Ok(MessageBatch { start, end, events })
}

#[implement(Room)]
pub async fn leave(&self) -> Result {
	let path = format!("client/r0/rooms/{}/leave", encode_segment(self.id.as_str()));
	self.session
		.client()
		.post(&path, None)
		.await?
		.into_result()?;

	Ok(())
}

#[implement(Room)]
/// Redact an event. Redactions take a fresh transaction id; they do not
/// go through the outbound queue.
pub async fn redact(&mut self, event_id: &EventId, reason: Option<&str>) -> Result {
	let txn_id = self.session.next_transaction_id();
	let path = format!(
		"client/r0/rooms/{}/redact/{}/{}",
		encode_segment(self.id.as_str()),
		encode_segment(event_id.as_str()),
		txn_id,
	);
	let body = reason.map_or_else(|| json!({}), |reason| json!({ "reason": reason }));

	let result = match self.session.client().put(&path, body).await {
		| Ok(reply) => reply.into_result().map(|_| ()),
		| Err(e) => Err(e),
	};

	if let Err(e) = &result {
		self.updates.error(e.to_string());
	}

	result
}

#[implement(Room)]
/// Acknowledge an event as read.
pub async fn send_read_receipt(&mut self, event_id: &EventId) -> Result {
	let path = format!(
		"client/r0/rooms/{}/receipt/m.read/{}",
		encode_segment(self.id.as_str()),
		encode_segment(event_id.as_str()),
	);

	let result = match self.session.client().post(&path, None).await {
		| Ok(reply) => reply.into_result().map(|_| ()),
		| Err(e) => Err(e),
	};

	if let Err(e) = &result {
		self.updates.error(e.to_string());
	}

	result
}
