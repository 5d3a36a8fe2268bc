use serde_json::Value as JsonValue;

/// Whether an event content body is absent for state purposes. Empty
/// content arises when replaying backward past the earliest known state.
#[must_use]
pub fn is_empty_object(value: &JsonValue) -> bool {
	match value {
		| JsonValue::Null => true,
		| JsonValue::Object(map) => map.is_empty(),
		| _ => false,
	}
}
