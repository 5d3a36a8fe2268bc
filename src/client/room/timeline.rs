use palaver_core::{Event, implement};

use super::Room;

/// A run of timeline events under one pagination token.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineBatch {
	pub prev_batch: String,
	pub events: Vec<Event>,
}

#[implement(Room)]
/// Events currently buffered, across all batches.
#[must_use]
pub fn buffer_size(&self) -> usize {
	self.buffer
		.iter()
		.map(|batch| batch.events.len())
		.sum()
}

#[implement(Room)]
/// Evict from the front while the buffer exceeds the session's
/// high-water mark, folding evicted events into the checkpoint so the
/// buffered remainder still replays onto it exactly.
pub(super) fn evict_buffer(&mut self) {
	while self
		.buffer
		.front()
		.is_some_and(|front| self.buffer_size() - front.events.len() >= self.session.buffer_size())
	{
		let front = self.buffer.pop_front().expect("front was just checked");
		for event in &front.events {
			self.initial_state.apply(event);
			self.initial_state.prune_departed(None);
		}
	}
}
