mod dispatch;
mod membership;
mod names;

use std::collections::HashMap;

use palaver_core::{Member, Result, utils::normalize_nfc};
use ruma::{OwnedMxcUri, OwnedUserId, UserId};
use serde::{Deserialize, Serialize};

use crate::{members::Members, updates::Context};

/// Authoritative snapshot of one room's state. A room holds two of
/// these: the tip, and the checkpoint behind the event buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoomState {
	name: Option<String>,
	canonical_alias: Option<String>,
	topic: Option<String>,
	avatar: Option<OwnedMxcUri>,
	aliases: Vec<String>,
	members_by_id: HashMap<OwnedUserId, Member>,
	members_by_displayname: HashMap<String, Vec<OwnedUserId>>,
	departed: Option<OwnedUserId>,
}

/// Persisted room metadata. Members are stored separately in the
/// members index; only non-null fields are emitted.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StateJson {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub canonical_alias: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub topic: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<OwnedMxcUri>,

	#[serde(default)]
	pub aliases: Vec<String>,
}

impl RoomState {
	/// Restore a snapshot: metadata from the persisted info, members by
	/// cursor-scanning the room's index.
	pub fn load(info: &StateJson, members: &Members) -> Result<Self> {
		let mut state = Self {
			name: info.name.clone(),
			canonical_alias: info.canonical_alias.clone(),
			topic: info.topic.clone(),
			avatar: info.avatar.clone(),
			aliases: info.aliases.clone(),
			..Self::default()
		};

		for member in members.scan() {
			let member = member?;
			let user_id = member.id().to_owned();
			let display_name = member.display_name().map(ToOwned::to_owned);
			state.members_by_id.insert(user_id.clone(), member);
			state.record_displayname(&user_id, display_name.as_deref(), None);
		}

		Ok(state)
	}

	#[must_use]
	pub fn to_json(&self) -> StateJson {
		StateJson {
			name: self.name.clone(),
			canonical_alias: self.canonical_alias.clone(),
			topic: self.topic.clone(),
			avatar: self.avatar.clone(),
			aliases: self.aliases.clone(),
		}
	}

	#[inline]
	#[must_use]
	pub fn name(&self) -> Option<&str> { self.name.as_deref() }

	#[inline]
	#[must_use]
	pub fn canonical_alias(&self) -> Option<&str> { self.canonical_alias.as_deref() }

	#[inline]
	#[must_use]
	pub fn topic(&self) -> Option<&str> { self.topic.as_deref() }

	#[inline]
	#[must_use]
	pub fn avatar(&self) -> Option<&ruma::MxcUri> { self.avatar.as_deref() }

	#[inline]
	#[must_use]
	pub fn aliases(&self) -> &[String] { &self.aliases }

	pub fn members(&self) -> impl Iterator<Item = &Member> + '_ { self.members_by_id.values() }

	#[inline]
	#[must_use]
	pub fn member_from_id(&self, user_id: &UserId) -> Option<&Member> {
		self.members_by_id.get(user_id)
	}

	/// The ids recorded under a display name, NFC-normalized.
	#[must_use]
	pub fn members_named(&self, displayname: &str) -> &[OwnedUserId] {
		self.members_by_displayname
			.get(&normalize_nfc(displayname))
			.map_or(&[], Vec::as_slice)
	}

	/// A member whose id equals the given string, if any.
	fn member_from_id_str(&self, id: &str) -> Option<&Member> {
		<&UserId>::try_from(id)
			.ok()
			.and_then(|id| self.members_by_id.get(id))
	}
}

/// Reborrow an optional context so it can be threaded through several
/// calls within one dispatch.
fn reborrow<'s, 'c>(room: &'s mut Option<&mut Context<'c>>) -> Option<&'s mut Context<'c>> {
	room.as_mut().map(|room| &mut **room)
}
