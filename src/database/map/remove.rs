use std::{convert::AsRef, fmt::Debug};

use palaver_core::{Result, implement};

use crate::{Batch, util::or_else};

/// Delete a key, bypassing any batch.
#[implement(super::Map)]
#[tracing::instrument(skip(self, key), fields(%self), level = "trace")]
pub fn remove<K>(&self, key: &K) -> Result
where
	K: AsRef<[u8]> + ?Sized + Debug,
{
	self.db
		.db()
		.delete_cf(&self.cf(), key)
		.or_else(or_else)
}

/// Delete a key within the caller's batch.
#[implement(super::Map)]
#[tracing::instrument(skip(self, key), fields(%self), level = "trace")]
pub fn del<K>(&self, batch: &mut Batch, key: &K)
where
	K: AsRef<[u8]> + ?Sized + Debug,
{
	batch
		.inner_mut()
		.delete_cf(&self.cf(), key.as_ref());
}
