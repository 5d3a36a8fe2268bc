use std::{
	collections::VecDeque,
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use async_trait::async_trait;
use palaver_core::{Result, err};
use ruma::{OwnedRoomId, OwnedUserId, UserId};
use serde_json::{Value as JsonValue, json};
use tempfile::{TempDir, tempdir};

use super::Room;
use crate::{
	members::Members,
	session::{Client, Reply, Session},
	sync::JoinedRoom,
	updates::RoomUpdate,
};

#[derive(Default)]
struct MockClient {
	gets: Mutex<Vec<String>>,
	posts: Mutex<Vec<String>>,
	puts: Mutex<Vec<(String, JsonValue)>>,
	replies: Mutex<VecDeque<Result<Reply>>>,
}

impl MockClient {
	fn push_reply(&self, status: u16, body: JsonValue) {
		self.replies
			.lock()
			.expect("locked")
			.push_back(Ok(Reply { status, body }));
	}

	fn push_transport_error(&self) {
		self.replies
			.lock()
			.expect("locked")
			.push_back(Err(err!("connection reset")));
	}

	fn next_reply(&self) -> Result<Reply> {
		self.replies
			.lock()
			.expect("locked")
			.pop_front()
			.unwrap_or_else(|| Ok(Reply { status: 200, body: json!({}) }))
	}

	fn put_paths(&self) -> Vec<String> {
		self.puts
			.lock()
			.expect("locked")
			.iter()
			.map(|(path, _)| path.clone())
			.collect()
	}
}

#[async_trait]
impl Client for MockClient {
	async fn get(&self, path: &str, _query: &[(&str, String)]) -> Result<Reply> {
		self.gets.lock().expect("locked").push(path.to_owned());
		self.next_reply()
	}

	async fn post(&self, path: &str, _body: Option<JsonValue>) -> Result<Reply> {
		self.posts.lock().expect("locked").push(path.to_owned());
		self.next_reply()
	}

	async fn put(&self, path: &str, body: JsonValue) -> Result<Reply> {
		self.puts
			.lock()
			.expect("locked")
			.push((path.to_owned(), body));
		self.next_reply()
	}
}

struct MockSession {
	user_id: OwnedUserId,
	capacity: usize,
	transactions: AtomicU64,
	client: MockClient,
}

impl MockSession {
	fn new(capacity: usize) -> Arc<Self> {
		Arc::new(Self {
			user_id: UserId::parse("@self:x").expect("valid user id"),
			capacity,
			transactions: AtomicU64::new(0),
			client: MockClient::default(),
		})
	}
}

impl Session for MockSession {
	fn user_id(&self) -> &UserId { &self.user_id }

	fn next_transaction_id(&self) -> String {
		format!("txn{}", self.transactions.fetch_add(1, Ordering::Relaxed))
	}

	fn buffer_size(&self) -> usize { self.capacity }

	fn client(&self) -> &dyn Client { &self.client }
}

struct Harness {
	_dir: TempDir,
	db: Arc<palaver_database::Engine>,
	session: Arc<MockSession>,
	room: Room,
}

fn harness(capacity: usize) -> Harness {
	let dir = tempdir().expect("tempdir");
	let db = palaver_database::Engine::open(dir.path(), &[Members::MAP]).expect("opens");
	let session = MockSession::new(capacity);
	let room_id: OwnedRoomId = <&ruma::RoomId>::try_from("!room:x")
		.expect("valid room id")
		.to_owned();
	let room = Room::new(session.clone(), room_id, db.map(Members::MAP));

	Harness { _dir: dir, db, session, room }
}

impl Harness {
	fn dispatch(&mut self, delta: JsonValue) -> bool {
		let delta: JoinedRoom = serde_json::from_value(delta).expect("valid delta");
		let mut txn = self.db.batch();
		let touched = self.room.dispatch(&mut txn, &delta);
		self.db.commit(txn).expect("commits");
		touched
	}
}

fn message(sender: &str, event_id: &str, body: &str) -> JsonValue {
	json!({
		"type": "m.room.message",
		"sender": sender,
		"event_id": event_id,
		"content": {"msgtype": "m.text", "body": body},
	})
}

fn join(user: &str, displayname: &str) -> JsonValue {
	json!({
		"type": "m.room.member",
		"sender": user,
		"event_id": format!("$j-{}:x", user.trim_start_matches('@').replace(':', "-")),
		"state_key": user,
		"content": {"membership": "join", "displayname": displayname},
	})
}

fn delta(prev_batch: &str, events: Vec<JsonValue>) -> JsonValue {
	json!({"timeline": {"prev_batch": prev_batch, "events": events}})
}

/// The checkpoint plus a replay of the buffer equals the tip.
fn assert_replay_law(room: &Room) {
	let mut replayed = room.initial_state().clone();
	for batch in room.buffer() {
		for event in &batch.events {
			replayed.apply(event);
			replayed.prune_departed(None);
		}
	}

	assert_eq!(&replayed, room.state());
}

#[test]
fn replay_law_holds_across_deltas() {
	let mut h = harness(100);

	h.dispatch(delta("t1", vec![join("@a:x", "Sam"), message("@a:x", "$1:x", "hi")]));
	assert_replay_law(&h.room);

	h.dispatch(delta("t2", vec![
		join("@b:x", "Frodo"),
		json!({
			"type": "m.room.name",
			"sender": "@a:x",
			"event_id": "$n:x",
			"state_key": "",
			"content": {"name": "The Shire"},
		}),
	]));
	assert_replay_law(&h.room);

	h.dispatch(delta("t3", vec![json!({
		"type": "m.room.member",
		"sender": "@b:x",
		"event_id": "$l:x",
		"state_key": "@b:x",
		"content": {"membership": "leave"},
	})]));
	assert_replay_law(&h.room);
	assert!(h.room.state().member_from_id(<&UserId>::try_from("@b:x").expect("valid")).is_none());
}

#[test]
fn limited_sync_resets_the_buffer() {
	let mut h = harness(100);

	h.dispatch(delta("t1", vec![message("@a:x", "$1:x", "one"), message("@a:x", "$2:x", "two")]));
	h.dispatch(delta("t2", vec![message("@a:x", "$3:x", "three")]));
	assert_eq!(h.room.buffer().len(), 2);
	assert_eq!(h.room.buffer_size(), 3);
	drop(h.room.drain_updates());

	h.dispatch(json!({
		"timeline": {
			"limited": true,
			"prev_batch": "P",
			"events": [message("@b:x", "$4:x", "gap")],
		},
	}));

	assert_eq!(h.room.buffer().len(), 1);
	let batch = h.room.buffer().front().expect("one batch");
	assert_eq!(batch.prev_batch, "P");
	assert_eq!(batch.events.len(), 1);

	// Subscribers see the reset before the new token
	let updates = h.room.drain_updates();
	let discontinuity = updates
		.iter()
		.position(|update| matches!(update, RoomUpdate::Discontinuity))
		.expect("discontinuity emitted");
	let prev_batch = updates
		.iter()
		.position(|update| matches!(update, RoomUpdate::PrevBatch { token } if token == "P"))
		.expect("prev_batch emitted");
	assert!(discontinuity < prev_batch);

	assert_replay_law(&h.room);
}

#[test]
fn empty_timeline_only_moves_the_tail_token() {
	let mut h = harness(100);

	h.dispatch(delta("t1", vec![message("@a:x", "$1:x", "one")]));
	h.dispatch(delta("t2", vec![]));

	assert_eq!(h.room.buffer().len(), 1);
	assert_eq!(h.room.buffer().back().expect("one batch").prev_batch, "t2");
}

#[test]
fn eviction_respects_the_high_water_mark() {
	let mut h = harness(3);

	for n in 0..6 {
		h.dispatch(delta(&format!("t{n}"), vec![message(
			"@a:x",
			&format!("${n}:x"),
			"spam",
		)]));

		let front = h.room.buffer().front().expect("non-empty").events.len();
		assert!(h.room.buffer_size() - front < 3);
		assert_replay_law(&h.room);
	}
}

#[test]
fn eviction_folds_members_into_the_checkpoint() {
	let mut h = harness(1);

	h.dispatch(delta("t1", vec![join("@a:x", "Sam")]));
	h.dispatch(delta("t2", vec![message("@a:x", "$1:x", "hi")]));

	let user = <&UserId>::try_from("@a:x").expect("valid");
	assert!(h.room.initial_state().member_from_id(user).is_some());
	assert_replay_law(&h.room);
}

#[test]
fn receipts_cross_index_stays_consistent() {
	let mut h = harness(100);

	h.dispatch(json!({
		"ephemeral": {"events": [{
			"type": "m.receipt",
			"content": {
				"$1:x": {"m.read": {"@a:x": {"ts": 100}, "@b:x": {"ts": 150}}},
			},
		}]},
	}));

	let a = <&UserId>::try_from("@a:x").expect("valid");
	let event1 = <&ruma::EventId>::try_from("$1:x").expect("valid");
	let event2 = <&ruma::EventId>::try_from("$2:x").expect("valid");

	assert_eq!(h.room.receipt_from(a).expect("receipt").ts, 100);
	assert_eq!(h.room.receipts_for(event1).count(), 2);

	// Batched into a single notification
	assert_eq!(
		h.room
			.drain_updates()
			.iter()
			.filter(|update| matches!(update, RoomUpdate::ReceiptsChanged))
			.count(),
		1,
	);

	// Moving a user's receipt drops the stale entry
	h.dispatch(json!({
		"ephemeral": {"events": [{
			"type": "m.receipt",
			"content": {"$2:x": {"m.read": {"@a:x": {"ts": 200}}}},
		}]},
	}));

	assert_eq!(h.room.receipt_from(a).expect("receipt").event_id, event2);
	assert_eq!(h.room.receipts_for(event1).count(), 1);
	assert_eq!(h.room.receipts_for(event2).count(), 1);
	for (user_id, receipt) in h.room.receipts_for(event2) {
		assert_eq!(user_id, a);
		assert_eq!(receipt.ts, 200);
	}
}

#[test]
fn unread_scan_stops_at_own_receipt() {
	let mut h = harness(100);

	// Empty buffer counts as unread
	assert!(h.room.has_unread());

	h.dispatch(delta("t1", vec![
		message("@self:x", "$1:x", "mine"),
		message("@a:x", "$2:x", "theirs"),
		message("@self:x", "$3:x", "mine again"),
		message("@a:x", "$4:x", "newest"),
	]));

	// No receipt of our own yet
	assert!(h.room.has_unread());

	h.dispatch(json!({
		"ephemeral": {"events": [{
			"type": "m.receipt",
			"content": {"$3:x": {"m.read": {"@self:x": {"ts": 1}}}},
		}]},
	}));
	assert!(h.room.has_unread(), "a newer message from another user is unread");

	h.dispatch(json!({
		"ephemeral": {"events": [{
			"type": "m.receipt",
			"content": {"$4:x": {"m.read": {"@self:x": {"ts": 2}}}},
		}]},
	}));
	assert!(!h.room.has_unread());
}

#[test]
fn counts_surface_with_previous_values() {
	let mut h = harness(100);

	h.dispatch(json!({
		"unread_notifications": {"highlight_count": 2, "notification_count": 5},
	}));

	let updates = h.room.drain_updates();
	assert!(updates.contains(&RoomUpdate::HighlightCountChanged { old: 0 }));
	assert!(updates.contains(&RoomUpdate::NotificationCountChanged { old: 0 }));
	assert_eq!(h.room.highlight_count(), 2);
	assert_eq!(h.room.notification_count(), 5);
}

#[test]
fn typing_list_is_replaced() {
	let mut h = harness(100);

	h.dispatch(json!({
		"ephemeral": {"events": [{
			"type": "m.typing",
			"content": {"user_ids": ["@a:x", "@b:x"]},
		}]},
	}));
	assert_eq!(h.room.typing().len(), 2);

	h.dispatch(json!({
		"ephemeral": {"events": [{"type": "m.typing", "content": {"user_ids": []}}]},
	}));
	assert!(h.room.typing().is_empty());
}

#[test]
fn state_changed_fires_once_and_last() {
	let mut h = harness(100);

	h.dispatch(delta("t1", vec![
		join("@a:x", "Sam"),
		message("@a:x", "$1:x", "hi"),
		join("@b:x", "Frodo"),
	]));

	let updates = h.room.drain_updates();
	let state_changes: Vec<_> = updates
		.iter()
		.enumerate()
		.filter(|(_, update)| matches!(update, RoomUpdate::StateChanged))
		.map(|(index, _)| index)
		.collect();

	assert_eq!(state_changes, [updates.len() - 1]);
	assert_eq!(
		updates
			.iter()
			.filter(|update| matches!(update, RoomUpdate::Message { .. }))
			.count(),
		3,
	);
}

#[test]
fn persisted_rooms_round_trip() {
	let mut h = harness(100);

	h.dispatch(json!({
		"unread_notifications": {"highlight_count": 1, "notification_count": 2},
		"timeline": {"prev_batch": "t1", "events": [
			join("@a:x", "Sam"),
			message("@a:x", "$1:x", "hi"),
		]},
		"ephemeral": {"events": [{
			"type": "m.receipt",
			"content": {"$1:x": {"m.read": {"@self:x": {"ts": 7}}}},
		}]},
	}));

	let persisted = h.room.to_json();
	let restored = Room::open(
		h.session.clone(),
		h.room.id().to_owned(),
		h.db.map(Members::MAP),
		&persisted,
	)
	.expect("restores");

	assert_eq!(restored.to_json(), persisted);
	assert_eq!(restored.state(), h.room.state());
	assert_eq!(restored.highlight_count(), 1);
	assert_eq!(restored.notification_count(), 2);
	assert_eq!(
		restored
			.receipt_from(<&UserId>::try_from("@self:x").expect("valid"))
			.expect("receipt")
			.ts,
		7,
	);
	assert_replay_law(&restored);
}

#[tokio::test(start_paused = true)]
async fn retries_reuse_the_transaction_id() {
	let mut h = harness(100);

	h.session.client.push_reply(429, json!({"error": "Too Many Requests"}));
	h.session.client.push_reply(200, json!({"event_id": "$1:x"}));

	h.room.send_message("hi");
	assert_eq!(h.room.pending_events(), 1);
	h.room.transmit_events().await;

	let puts = h.session.client.put_paths();
	assert_eq!(puts.len(), 2, "one retry after the rate-limit");
	assert_eq!(puts[0], puts[1], "identical URL including the txn id");
	assert!(puts[0].ends_with("/txn0"));
	assert_eq!(h.room.pending_events(), 0);

	// The next event acquires a fresh token
	h.room.send_message("again");
	h.room.transmit_events().await;

	let puts = h.session.client.put_paths();
	assert_eq!(puts.len(), 3);
	assert!(puts[2].ends_with("/txn1"));
}

#[tokio::test(start_paused = true)]
async fn permanent_failures_drop_the_event() {
	let mut h = harness(100);

	h.session.client.push_reply(403, json!({"error": "Forbidden"}));

	h.room.send_message("nope");
	h.room.transmit_events().await;

	assert_eq!(h.session.client.put_paths().len(), 1, "no retry");
	assert_eq!(h.room.pending_events(), 0);
	assert!(
		h.room
			.drain_updates()
			.contains(&RoomUpdate::Error { message: "Forbidden".to_owned() }),
	);
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_and_resets() {
	let mut h = harness(100);

	h.session.client.push_transport_error();
	h.session.client.push_reply(502, json!({"error": "Bad Gateway"}));
	h.session.client.push_reply(500, json!({"error": "Internal Server Error"}));
	h.session.client.push_reply(200, json!({"event_id": "$1:x"}));

	let started = tokio::time::Instant::now();
	h.room.send_message("persistent");
	h.room.transmit_events().await;

	// 5s, then 6.25s, then 7.8125s of back-off (timer granularity may
	// round each sleep up slightly)
	let elapsed = started.elapsed();
	assert!(elapsed >= Duration::from_micros(19_062_500), "elapsed {elapsed:?}");
	assert!(elapsed < Duration::from_secs(20), "elapsed {elapsed:?}");
	assert_eq!(h.session.client.put_paths().len(), 4);

	// Success resets the schedule for the next event
	h.session.client.push_reply(500, json!({"error": "Internal Server Error"}));
	h.session.client.push_reply(200, json!({"event_id": "$2:x"}));

	let started = tokio::time::Instant::now();
	h.room.send_message("anew");
	h.room.transmit_events().await;

	let elapsed = started.elapsed();
	assert!(elapsed >= Duration::from_secs(5), "elapsed {elapsed:?}");
	assert!(elapsed < Duration::from_micros(6_250_000), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn queued_events_transmit_in_order() {
	let mut h = harness(100);

	h.room.send_message("first");
	h.room.send_emote("waves");
	h.room.send_file("mxc://x/file", "notes.txt", "text/plain", 42);
	assert_eq!(h.room.pending_events(), 3);

	h.room.transmit_events().await;

	let puts = h.session.client.puts.lock().expect("locked").clone();
	assert_eq!(puts.len(), 3);
	assert_eq!(puts[0].1["body"], "first");
	assert_eq!(puts[1].1["msgtype"], "m.emote");
	assert_eq!(puts[2].1["info"]["size"], 42);

	// Distinct events, distinct transaction ids
	assert!(puts[0].0.ends_with("/txn0"));
	assert!(puts[1].0.ends_with("/txn1"));
	assert!(puts[2].0.ends_with("/txn2"));
}

#[tokio::test]
async fn messages_parses_the_envelope() {
	let mut h = harness(100);

	h.session.client.push_reply(200, json!({
		"start": "s",
		"end": "e",
		"chunk": [message("@a:x", "$1:x", "hello")],
	}));

	let batch = h
		.room
		.messages(super::Direction::Backward, "s", 10, None)
		.await
		.expect("parses");

	assert_eq!(batch.start, "s");
	assert_eq!(batch.end, "e");
	assert_eq!(batch.events.len(), 1);
	assert_eq!(batch.events[0].sender, "@a:x");

	let gets = h.session.client.gets.lock().expect("locked").clone();
	assert_eq!(gets, ["client/r0/rooms/%21room%3Ax/messages"]);
}

#[tokio::test]
async fn malformed_envelopes_surface_typed_errors() {
	let mut h = harness(100);

	h.session.client.push_reply(200, json!({"start": "s", "chunk": []}));

	let err = h
		.room
		.messages(super::Direction::Forward, "s", 0, None)
		.await
		.expect_err("missing end");

	assert!(matches!(err, palaver_core::Error::BadServerResponse("end")));
}

#[tokio::test]
async fn read_receipts_and_leave_hit_their_endpoints() {
	let mut h = harness(100);

	let event_id = <&ruma::EventId>::try_from("$1:x").expect("valid");
	h.room.send_read_receipt(event_id).await.expect("sends");
	h.room.leave().await.expect("leaves");

	let posts = h.session.client.posts.lock().expect("locked").clone();
	assert_eq!(posts, [
		"client/r0/rooms/%21room%3Ax/receipt/m.read/%241%3Ax",
		"client/r0/rooms/%21room%3Ax/leave",
	]);
}
