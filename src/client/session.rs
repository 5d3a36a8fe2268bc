use async_trait::async_trait;
use palaver_core::{Result, err};
use ruma::UserId;
use serde_json::Value as JsonValue;

/// A decoded homeserver reply. Transport failures surface as
/// [`palaver_core::Error::Request`]; any HTTP status lands here.
#[derive(Clone, Debug)]
pub struct Reply {
	pub status: u16,
	pub body: JsonValue,
}

impl Reply {
	#[inline]
	#[must_use]
	pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

	/// The server's error string, falling back to the status code.
	#[must_use]
	pub fn error_message(&self) -> String {
		self.body
			.get("error")
			.and_then(JsonValue::as_str)
			.map_or_else(|| format!("HTTP {}", self.status), ToOwned::to_owned)
	}

	/// The body on success, a typed error otherwise.
	pub fn into_result(self) -> Result<JsonValue> {
		if self.is_success() {
			Ok(self.body)
		} else {
			Err(err!(Http(self.status, "{}", self.error_message())))
		}
	}
}

/// Homeserver REST transport. Paths are relative to the API root and
/// already percent-encoded.
#[async_trait]
pub trait Client: Send + Sync {
	async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Reply>;

	async fn post(&self, path: &str, body: Option<JsonValue>) -> Result<Reply>;

	async fn put(&self, path: &str, body: JsonValue) -> Result<Reply>;
}

/// Per-login facilities the engine borrows from its owner.
pub trait Session: Send + Sync {
	/// The logged-in user.
	fn user_id(&self) -> &UserId;

	/// A fresh idempotency token for PUTs. Tokens are reused across
	/// retries of the same logical event, never across events.
	fn next_transaction_id(&self) -> String;

	/// High-water mark for the recent-events buffer.
	fn buffer_size(&self) -> usize;

	fn client(&self) -> &dyn Client;
}
