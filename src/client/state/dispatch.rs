use palaver_core::{
	Event, Member, Membership, MembershipContent, StateEventKind, debug, implement,
};
use palaver_database::Batch;
use ruma::{OwnedMxcUri, UserId};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{RoomState, reborrow};
use crate::{members::Members, updates::Context};

#[derive(Default, Deserialize)]
struct ExtractAliases {
	#[serde(default)]
	aliases: Vec<String>,
}

#[derive(Default, Deserialize)]
struct ExtractCanonicalAlias {
	#[serde(default)]
	alias: Option<String>,
}

#[derive(Default, Deserialize)]
struct ExtractName {
	#[serde(default)]
	name: Option<String>,
}

#[derive(Default, Deserialize)]
struct ExtractTopic {
	#[serde(default)]
	topic: Option<String>,
}

#[derive(Default, Deserialize)]
struct ExtractAvatarUrl {
	#[serde(default)]
	url: Option<String>,
}

fn extract<T>(content: Option<&JsonValue>) -> T
where
	T: Default + for<'de> Deserialize<'de>,
{
	content
		.map(|content| serde_json::from_value(content.clone()).unwrap_or_default())
		.unwrap_or_default()
}

#[implement(RoomState)]
/// Forward-apply a state event. Returns whether the snapshot changed.
/// Unknown types log and change nothing.
#[tracing::instrument(level = "trace", skip_all, fields(kind = %event.kind))]
pub fn dispatch(
	&mut self,
	event: &Event,
	mut room: Option<&mut Context<'_>>,
	store: Option<(&Members, &mut Batch)>,
) -> bool {
	match event.state_kind() {
		| StateEventKind::Message => false,
		| StateEventKind::Aliases => {
			let ExtractAliases { aliases } = extract(Some(&event.content));

			// Merged, never replaced
			for alias in aliases {
				if !self.aliases.contains(&alias) {
					self.aliases.push(alias);
				}
			}

			if let Some(room) = reborrow(&mut room) {
				room.updates.aliases_changed();
			}

			true
		},
		| StateEventKind::CanonicalAlias => {
			let ExtractCanonicalAlias { alias } = extract(Some(&event.content));
			let old = self.canonical_alias.take();
			self.canonical_alias = alias.filter(|alias| !alias.is_empty());

			if self.canonical_alias != old {
				if let Some(room) = reborrow(&mut room) {
					room.updates.canonical_alias_changed();
				}
			}

			true
		},
		| StateEventKind::Name => {
			let ExtractName { name } = extract(Some(&event.content));
			let old = self.name.take();
			self.name = name.filter(|name| !name.is_empty());

			if self.name != old {
				if let Some(room) = reborrow(&mut room) {
					room.updates.name_changed();
				}
			}

			true
		},
		| StateEventKind::Topic => {
			let ExtractTopic { topic } = extract(Some(&event.content));
			let old = self.topic.take();
			self.topic = topic.filter(|topic| !topic.is_empty());

			if self.topic != old {
				if let Some(room) = reborrow(&mut room) {
					room.updates.topic_changed(old);
				}
			}

			true
		},
		| StateEventKind::Avatar => {
			let ExtractAvatarUrl { url } = extract(Some(&event.content));
			let old = self.avatar.take();
			self.avatar = url
				.filter(|url| !url.is_empty())
				.map(OwnedMxcUri::from);

			if self.avatar != old {
				if let Some(room) = reborrow(&mut room) {
					room.updates.avatar_changed();
				}
			}

			true
		},
		// Rooms are created implicitly
		| StateEventKind::Create => false,
		| StateEventKind::Member => {
			let Some(user_id) = member_state_key(event) else {
				return false;
			};

			self.update_membership(user_id, &event.content, room, store)
		},
		| StateEventKind::Unknown => {
			debug!("unrecognized event type {:?}", event.kind);
			false
		},
	}
}

#[implement(RoomState)]
/// Forward-apply without callbacks or persistence; used when replaying
/// buffered events onto the checkpoint snapshot.
pub fn apply(&mut self, event: &Event) { self.dispatch(event, None, None); }

#[implement(RoomState)]
/// Inverse of [`Self::dispatch`], for replaying backward through
/// history. State is restored from `unsigned.prev_content`; a member
/// event without it reverts to an unknown, departed user.
pub fn revert(&mut self, event: &Event) {
	match event.state_kind() {
		| StateEventKind::CanonicalAlias => {
			let ExtractCanonicalAlias { alias } = extract(event.prev_content());
			self.canonical_alias = alias.filter(|alias| !alias.is_empty());
		},
		| StateEventKind::Name => {
			let ExtractName { name } = extract(event.prev_content());
			self.name = name.filter(|name| !name.is_empty());
		},
		| StateEventKind::Topic => {
			let ExtractTopic { topic } = extract(event.prev_content());
			self.topic = topic.filter(|topic| !topic.is_empty());
		},
		| StateEventKind::Avatar => {
			let ExtractAvatarUrl { url } = extract(event.prev_content());
			self.avatar = url
				.filter(|url| !url.is_empty())
				.map(OwnedMxcUri::from);
		},
		| StateEventKind::Member => {
			let Some(user_id) = member_state_key(event) else {
				return;
			};

			let prev = event
				.prev_content()
				.cloned()
				.unwrap_or_else(|| JsonValue::Object(serde_json::Map::new()));
			self.update_membership(user_id, &prev, None, None);
			self.prune_departed(None);
		},
		| _ => {},
	}
}

#[implement(RoomState)]
/// Idempotently create a placeholder for the departed subject of a
/// leave or ban, populated from `prev_content` so the display name at
/// the time of departure survives into historical rendering.
pub fn ensure_member(&mut self, event: &Event) {
	if event.state_kind() != StateEventKind::Member {
		return;
	}

	let content: MembershipContent = match event.get_content() {
		| Ok(content) => content,
		| Err(e) => {
			debug!("{e}");
			return;
		},
	};

	if !matches!(content.membership, Membership::Leave | Membership::Ban) {
		return;
	}

	let Some(user_id) = member_state_key(event) else {
		return;
	};

	if self.members_by_id.contains_key(user_id) {
		return;
	}

	let mut member = Member::new(user_id.to_owned());
	if let Some(prev) = event.prev_content() {
		// Recover display name and avatar, if available
		if let Ok(prev) = serde_json::from_value::<MembershipContent>(prev.clone()) {
			member.update_membership(&prev);
		}
	}
	member.update_membership(&content);

	let display_name = member.display_name().map(ToOwned::to_owned);
	self.members_by_id.insert(user_id.to_owned(), member);
	self.record_displayname(user_id, display_name.as_deref(), None);
}

/// The member event's subject, from its state key.
fn member_state_key(event: &Event) -> Option<&UserId> {
	let Some(state_key) = event.state_key.as_deref() else {
		debug!("membership event without state key");
		return None;
	};

	match <&UserId>::try_from(state_key) {
		| Ok(user_id) => Some(user_id),
		| Err(e) => {
			debug!("membership event with invalid state key {state_key:?}: {e}");
			None
		},
	}
}
