use std::convert::AsRef;

use palaver_core::{Result, implement};

use crate::util::or_else;

/// Fetch a value by raw key.
#[implement(super::Map)]
#[tracing::instrument(skip(self, key), fields(%self), level = "trace")]
pub fn get<K>(&self, key: &K) -> Result<Option<Vec<u8>>>
where
	K: AsRef<[u8]> + ?Sized,
{
	self.db
		.db()
		.get_cf(&self.cf(), key)
		.or_else(or_else)
}
