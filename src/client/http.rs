use std::time::Duration;

use async_trait::async_trait;
use palaver_core::{Result, err};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Url, redirect};
use serde_json::Value as JsonValue;

use crate::session::{Client, Reply};

/// Characters escaped within one path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'~');

/// Percent-encode one path segment.
#[must_use]
pub fn encode_segment(s: &str) -> String { utf8_percent_encode(s, PATH_SEGMENT).to_string() }

/// reqwest-backed homeserver transport.
pub struct Homeserver {
	http: reqwest::Client,
	base_url: Url,
	access_token: String,
}

impl Homeserver {
	/// `base_url` must end in a slash; request paths are joined onto it.
	pub fn new(base_url: Url, access_token: String) -> Result<Self> {
		Ok(Self {
			http: base().build()?,
			base_url,
			access_token,
		})
	}

	fn url(&self, path: &str) -> Result<Url> {
		self.base_url
			.join(path)
			.map_err(|e| err!("invalid request path {path:?}: {e}"))
	}

	async fn reply(response: reqwest::Response) -> Result<Reply> {
		let status = response.status().as_u16();
		let body = response.bytes().await?;
		let body = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);

		Ok(Reply { status, body })
	}
}

fn base() -> reqwest::ClientBuilder {
	reqwest::Client::builder()
		.connect_timeout(Duration::from_secs(10))
		.read_timeout(Duration::from_secs(35))
		.timeout(Duration::from_secs(60))
		.pool_max_idle_per_host(1)
		.redirect(redirect::Policy::limited(3))
		.user_agent(concat!("palaver/", env!("CARGO_PKG_VERSION")))
}

#[async_trait]
impl Client for Homeserver {
	async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Reply> {
		let response = self
			.http
			.get(self.url(path)?)
			.bearer_auth(&self.access_token)
			.query(query)
			.send()
			.await?;

		Self::reply(response).await
	}

	async fn post(&self, path: &str, body: Option<JsonValue>) -> Result<Reply> {
		let request = self
			.http
			.post(self.url(path)?)
			.bearer_auth(&self.access_token);

		let request = match body {
			| Some(body) => request.json(&body),
			| None => request,
		};

		Self::reply(request.send().await?).await
	}

	async fn put(&self, path: &str, body: JsonValue) -> Result<Reply> {
		let response = self
			.http
			.put(self.url(path)?)
			.bearer_auth(&self.access_token)
			.json(&body)
			.send()
			.await?;

		Self::reply(response).await
	}
}
