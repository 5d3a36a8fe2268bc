use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::{Result, err};

/// A timeline or state event as delivered by sync, history fetches and
/// persisted buffers. Content stays a raw JSON body; typed access goes
/// through [`Event::get_content`] with a small extract struct.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Event {
	#[serde(rename = "type")]
	pub kind: String,

	pub sender: ruma::OwnedUserId,

	pub event_id: ruma::OwnedEventId,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state_key: Option<String>,

	#[serde(default)]
	pub content: JsonValue,

	#[serde(default, skip_serializing_if = "Unsigned::is_empty")]
	pub unsigned: Unsigned,
}

/// Metadata container; peer-trusted only.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Unsigned {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub prev_content: Option<JsonValue>,

	#[serde(flatten)]
	pub extra: serde_json::Map<String, JsonValue>,
}

/// Tagged variant of the state-event types this engine dispatches on,
/// decoded from the JSON `type`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StateEventKind {
	Aliases,
	CanonicalAlias,
	Name,
	Topic,
	Avatar,
	Create,
	Member,
	Message,
	Unknown,
}

impl From<&str> for StateEventKind {
	fn from(kind: &str) -> Self {
		match kind {
			| "m.room.aliases" => Self::Aliases,
			| "m.room.canonical_alias" => Self::CanonicalAlias,
			| "m.room.name" => Self::Name,
			| "m.room.topic" => Self::Topic,
			| "m.room.avatar" => Self::Avatar,
			| "m.room.create" => Self::Create,
			| "m.room.member" => Self::Member,
			| "m.room.message" => Self::Message,
			| _ => Self::Unknown,
		}
	}
}

impl Event {
	#[inline]
	#[must_use]
	pub fn state_kind(&self) -> StateEventKind { StateEventKind::from(self.kind.as_str()) }

	/// Deserialize the content body into an extract type.
	pub fn get_content<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		serde_json::from_value(self.content.clone())
			.map_err(|e| err!(Malformed("failed to deserialize {} content: {e}", self.kind)))
	}

	/// The content the event replaced, if the server disclosed it.
	#[inline]
	#[must_use]
	pub fn prev_content(&self) -> Option<&JsonValue> { self.unsigned.prev_content.as_ref() }
}

impl Unsigned {
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool { self.prev_content.is_none() && self.extra.is_empty() }
}
