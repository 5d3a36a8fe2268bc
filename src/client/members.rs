use std::sync::Arc;

use palaver_core::{Member, MemberRecord, Result, err};
use palaver_database::{Batch, KEY_SEPARATOR, Map};
use ruma::{OwnedRoomId, UserId};

/// Room-scoped view over the shared members map. Keys are
/// `room_id 0xFF user_id`; values are JSON member records.
pub struct Members {
	map: Arc<Map>,
	room_id: OwnedRoomId,
}

impl Members {
	/// Column family holding every room's member index.
	pub const MAP: &'static str = "roomuserid_member";

	#[must_use]
	pub fn new(map: Arc<Map>, room_id: OwnedRoomId) -> Self { Self { map, room_id } }

	/// Persist a member within the caller's batch.
	pub fn put(&self, batch: &mut Batch, member: &Member) {
		let value =
			serde_json::to_vec(&member.record()).expect("member record always serializes");

		self.map.put(batch, &self.key(member.id()), value);
	}

	/// Delete a member within the caller's batch.
	pub fn del(&self, batch: &mut Batch, user_id: &UserId) {
		self.map.del(batch, &self.key(user_id));
	}

	/// Cursor over every persisted member of the room.
	pub fn scan(&self) -> impl Iterator<Item = Result<Member>> + '_ {
		let prefix = self.prefix();
		let skip = prefix.len();

		self.map
			.raw_prefix(prefix)
			.map(move |item| {
				let (key, value) = item?;
				let user_id = std::str::from_utf8(&key[skip..])
					.map_err(|e| err!(Database("non-utf8 member key: {e}")))?;
				let user_id = UserId::parse(user_id)
					.map_err(|e| err!(Database("invalid member key {user_id:?}: {e}")))?;
				let record: MemberRecord = serde_json::from_slice(&value)
					.map_err(|e| err!(Database("invalid member record for {user_id}: {e}")))?;

				Ok(Member::from_record(user_id, record))
			})
	}

	fn key(&self, user_id: &UserId) -> Vec<u8> {
		[
			self.room_id.as_str().as_bytes(),
			&[KEY_SEPARATOR],
			user_id.as_str().as_bytes(),
		]
		.concat()
	}

	fn prefix(&self) -> Vec<u8> {
		[self.room_id.as_str().as_bytes(), &[KEY_SEPARATOR]].concat()
	}
}
