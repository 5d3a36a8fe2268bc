use palaver_core::{Member, implement, utils::normalize_nfc};
use ruma::{OwnedUserId, UserId};

use super::{RoomState, reborrow};
use crate::updates::Context;

#[implement(RoomState)]
/// The rendered room name: explicit name, canonical alias, any alias
/// (non-standard, but matches vector-web), else derived from the
/// displayable members other than `own_id`.
#[must_use]
pub fn pretty_name(&self, own_id: &UserId) -> String {
	if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
		return name.to_owned();
	}
	if let Some(alias) = self
		.canonical_alias
		.as_deref()
		.filter(|alias| !alias.is_empty())
	{
		return alias.to_owned();
	}
	if let Some(alias) = self.aliases.first() {
		return alias.clone();
	}

	let mut members: Vec<&Member> = self
		.members()
		.filter(|member| member.membership().is_displayable())
		.filter(|member| member.id() != own_id)
		.collect();

	members.sort_unstable_by(|a, b| a.id().cmp(b.id()));

	match members.as_slice() {
		| [] => "Empty room".to_owned(),
		| [member] => member.pretty_name().to_owned(),
		| [first, second] => {
			format!("{} and {}", self.member_name(first), self.member_name(second))
		},
		| [first, rest @ ..] => {
			format!("{} and {} others", self.member_name(first), rest.len())
		},
	}
}

#[implement(RoomState)]
/// A member's rendered name, disambiguated with their id if required.
#[must_use]
pub fn member_name(&self, member: &Member) -> String {
	let disambiguation = self.member_disambiguation(member);
	if disambiguation.is_empty() {
		member.pretty_name().to_owned()
	} else {
		format!("{} ({disambiguation})", member.pretty_name())
	}
}

#[implement(RoomState)]
/// The id suffix a member must be rendered with, or empty. A member
/// without a display name needs one only when another member's display
/// name equals their id; a named member needs one when the name is
/// shared or equals some member's id.
#[must_use]
pub fn member_disambiguation(&self, member: &Member) -> String {
	match member.display_name() {
		| None =>
			if self
				.members_by_displayname
				.contains_key(member.id().as_str())
			{
				member.id().to_string()
			} else {
				String::new()
			},
		| Some(name) =>
			if self.members_named(name).len() > 1 || self.member_from_id_str(name).is_some() {
				member.id().to_string()
			} else {
				String::new()
			},
	}
}

#[implement(RoomState)]
/// Add `id` to the name-index bucket for `name`, notifying the at most
/// one other member whose disambiguation this collision changes.
pub(super) fn record_displayname(
	&mut self,
	id: &UserId,
	name: Option<&str>,
	mut room: Option<&mut Context<'_>>,
) {
	let Some(name) = name.filter(|name| !name.is_empty()) else {
		return;
	};

	let normalized = normalize_nfc(name);
	let vec = self
		.members_by_displayname
		.entry(normalized.clone())
		.or_default();
	assert!(
		!vec.iter().any(|recorded| recorded == id),
		"member already recorded under this display name"
	);
	vec.push(id.to_owned());

	let first = vec.first().cloned();
	let existing_displayname = vec.len() == 2;

	if let Some(room) = reborrow(&mut room) {
		let existing_mxid = self
			.member_from_id_str(&normalized)
			.map(|member| member.id().to_owned());

		let mut other: Option<OwnedUserId> = None;
		if !existing_displayname || existing_mxid.is_none() {
			// With only one user left under the name, they may get newly
			// disambiguated too
			if existing_displayname {
				other = first;
			}
			if let Some(mxid) = existing_mxid {
				other = Some(mxid);
			}
		}

		if let Some(other) = other {
			room.updates
				.member_disambiguation_changed(other, String::new());
		}
	}
}

#[implement(RoomState)]
/// Remove `id` from the bucket for `old_name`, capturing the affected
/// other member's disambiguation before erasure so subscribers see what
/// it was.
pub(super) fn forget_displayname(
	&mut self,
	id: &UserId,
	old_name: Option<&str>,
	mut room: Option<&mut Context<'_>>,
) {
	let Some(old_name) = old_name.filter(|name| !name.is_empty()) else {
		return;
	};

	let normalized = normalize_nfc(old_name);

	let mut other: Option<OwnedUserId> = None;
	{
		let vec = self
			.members_by_displayname
			.get(&normalized)
			.expect("forgotten display name is recorded");
		let existing_displayname = vec.len() == 2;
		let existing_mxid = self
			.member_from_id_str(&normalized)
			.map(|member| member.id().to_owned());

		if room.is_some() && (!existing_displayname || existing_mxid.is_none()) {
			if existing_displayname {
				let other_id = if vec[0] == *id { &vec[1] } else { &vec[0] };
				other = Some(other_id.clone());
			}
			if let Some(mxid) = existing_mxid {
				other = Some(mxid);
			}
		}
	}

	let other_disambiguation = other.as_ref().map(|other| {
		let member = self
			.members_by_id
			.get(other)
			.expect("affected member exists");

		self.member_disambiguation(member)
	});

	let vec = self
		.members_by_displayname
		.get_mut(&normalized)
		.expect("forgotten display name is recorded");
	let before = vec.len();
	vec.retain(|recorded| recorded != id);
	assert_eq!(before - vec.len(), 1, "member was recorded exactly once");
	if vec.is_empty() {
		self.members_by_displayname.remove(&normalized);
	}

	if let (Some(other), Some(old)) = (other, other_disambiguation) {
		if let Some(room) = reborrow(&mut room) {
			room.updates.member_disambiguation_changed(other, old);
		}
	}
}
