use ruma::{OwnedMxcUri, OwnedUserId};
use serde::{Deserialize, Serialize};

/// Room membership variant. Parsing rejects anything the engine does not
/// model; callers log and skip such events.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
	Invite,
	Join,
	#[default]
	Leave,
	Ban,
}

impl Membership {
	/// Whether this membership participates in naming.
	#[inline]
	#[must_use]
	pub fn is_displayable(self) -> bool { matches!(self, Self::Invite | Self::Join) }
}

/// Extract for an `m.room.member` content body. Fields absent from the
/// body clear the member's corresponding optionals.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MembershipContent {
	pub membership: Membership,

	#[serde(default)]
	pub displayname: Option<String>,

	#[serde(default)]
	pub avatar_url: Option<OwnedMxcUri>,
}

/// Per-user record within one room.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Member {
	id: OwnedUserId,
	display_name: Option<String>,
	avatar_url: Option<OwnedMxcUri>,
	membership: Membership,
}

/// The persisted form of a [`Member`]; the store key carries the id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemberRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<OwnedMxcUri>,

	pub membership: Membership,
}

impl Member {
	#[must_use]
	pub fn new(id: OwnedUserId) -> Self {
		Self {
			id,
			display_name: None,
			avatar_url: None,
			membership: Membership::Leave,
		}
	}

	#[must_use]
	pub fn from_record(id: OwnedUserId, record: MemberRecord) -> Self {
		Self {
			id,
			display_name: record.display_name.filter(|name| !name.is_empty()),
			avatar_url: record.avatar_url,
			membership: record.membership,
		}
	}

	/// Overwrite membership, display name and avatar from a content body.
	pub fn update_membership(&mut self, content: &MembershipContent) {
		self.display_name = content
			.displayname
			.clone()
			.filter(|name| !name.is_empty());
		self.avatar_url = content
			.avatar_url
			.clone()
			.filter(|url| !url.as_str().is_empty());
		self.membership = content.membership;
	}

	#[must_use]
	pub fn record(&self) -> MemberRecord {
		MemberRecord {
			display_name: self.display_name.clone(),
			avatar_url: self.avatar_url.clone(),
			membership: self.membership,
		}
	}

	#[inline]
	#[must_use]
	pub fn id(&self) -> &ruma::UserId { &self.id }

	#[inline]
	#[must_use]
	pub fn display_name(&self) -> Option<&str> { self.display_name.as_deref() }

	#[inline]
	#[must_use]
	pub fn avatar_url(&self) -> Option<&ruma::MxcUri> { self.avatar_url.as_deref() }

	#[inline]
	#[must_use]
	pub fn membership(&self) -> Membership { self.membership }

	/// The display name, falling back to the id.
	#[inline]
	#[must_use]
	pub fn pretty_name(&self) -> &str {
		self.display_name
			.as_deref()
			.unwrap_or_else(|| self.id.as_str())
	}
}
