use palaver_core::{
	Member, Membership, MembershipContent, debug, implement, utils::is_empty_object,
};
use palaver_database::Batch;
use ruma::UserId;
use serde_json::Value as JsonValue;

use super::{RoomState, reborrow};
use crate::{members::Members, updates::Context};

#[implement(RoomState)]
/// Apply an `m.room.member` content body to the member keyed by
/// `user_id`, maintaining the name index, persisting the change within
/// the caller's batch, and notifying through the context. Returns
/// whether the snapshot changed.
#[tracing::instrument(level = "debug", skip_all, fields(%user_id))]
pub fn update_membership(
	&mut self,
	user_id: &UserId,
	content: &JsonValue,
	mut room: Option<&mut Context<'_>>,
	store: Option<(&Members, &mut Batch)>,
) -> bool {
	let content: MembershipContent = if is_empty_object(content) {
		// Empty content arises when moving backwards from an initial event
		MembershipContent::default()
	} else {
		match serde_json::from_value(content.clone()) {
			| Ok(content) => content,
			| Err(e) => {
				debug!("unrecognized membership for {user_id}: {e}");
				return false;
			},
		}
	};

	match content.membership {
		| Membership::Invite | Membership::Join => {
			self.members_by_id
				.entry(user_id.to_owned())
				.or_insert_with(|| Member::new(user_id.to_owned()));

			let member = &self.members_by_id[user_id];
			let old_membership = member.membership();
			let old_display_name = member.display_name().map(ToOwned::to_owned);
			let old_member_name = self.member_name(member);

			let member = self
				.members_by_id
				.get_mut(user_id)
				.expect("member was just inserted");
			member.update_membership(&content);
			let new_display_name = member.display_name().map(ToOwned::to_owned);
			let new_membership = member.membership();
			let persisted = member.clone();

			if new_display_name != old_display_name {
				self.forget_displayname(user_id, old_display_name.as_deref(), reborrow(&mut room));
				self.record_displayname(user_id, new_display_name.as_deref(), reborrow(&mut room));
				if old_membership.is_displayable() {
					if let Some(room) = reborrow(&mut room) {
						room.updates
							.member_name_changed(user_id, old_member_name);
					}
				}
			}

			if new_membership != old_membership {
				if let Some(room) = reborrow(&mut room) {
					room.updates
						.membership_changed(user_id, new_membership);
				}
			}

			if let Some((members, batch)) = store {
				members.put(batch, &persisted);
			}
		},
		| Membership::Leave | Membership::Ban => {
			if let Some(room) = reborrow(&mut room) {
				if user_id.as_str() == room.room_id.as_str() {
					room.updates.left(content.membership);
				}
			}

			if self.members_by_id.contains_key(user_id) {
				let member = self
					.members_by_id
					.get_mut(user_id)
					.expect("member is present");
				let old_display_name = member.display_name().map(ToOwned::to_owned);
				member.update_membership(&content);
				let new_display_name = member.display_name().map(ToOwned::to_owned);

				if new_display_name != old_display_name {
					self.forget_displayname(
						user_id,
						old_display_name.as_deref(),
						reborrow(&mut room),
					);
					self.record_displayname(
						user_id,
						new_display_name.as_deref(),
						reborrow(&mut room),
					);
				}

				if let Some(room) = reborrow(&mut room) {
					room.updates
						.membership_changed(user_id, content.membership);
				}

				assert!(
					self.departed.is_none(),
					"departure still pending a prune_departed"
				);
				self.departed = Some(user_id.to_owned());
			}

			if let Some((members, batch)) = store {
				members.del(batch, user_id);
			}
		},
	}

	true
}

#[implement(RoomState)]
/// Drop the member recorded by a leave or ban. Must run after every
/// timeline event that may have affected membership, so naming stays
/// correct for the events that follow.
pub fn prune_departed(&mut self, room: Option<&mut Context<'_>>) {
	if let Some(departed) = self.departed.take() {
		let display_name = self
			.members_by_id
			.get(&departed)
			.expect("departed member is present")
			.display_name()
			.map(ToOwned::to_owned);

		self.forget_displayname(&departed, display_name.as_deref(), room);
		self.members_by_id.remove(&departed);
	}
}
