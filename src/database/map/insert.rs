//! Insert a Key+Value into the database.
//!
//! Overloads are provided for writing directly or within a caller-owned
//! batch that commits a whole sync delta at once.

use std::convert::AsRef;

use palaver_core::{Result, implement};

use crate::{Batch, util::or_else};

/// Insert Key/Value, bypassing any batch.
///
/// - Key is raw
/// - Val is raw
#[implement(super::Map)]
#[tracing::instrument(skip_all, fields(%self), level = "trace")]
pub fn insert<K, V>(&self, key: &K, val: V) -> Result
where
	K: AsRef<[u8]> + ?Sized,
	V: AsRef<[u8]>,
{
	self.db
		.db()
		.put_cf(&self.cf(), key, val)
		.or_else(or_else)
}

/// Insert Key/Value within the caller's batch.
#[implement(super::Map)]
#[tracing::instrument(skip_all, fields(%self), level = "trace")]
pub fn put<K, V>(&self, batch: &mut Batch, key: &K, val: V)
where
	K: AsRef<[u8]> + ?Sized,
	V: AsRef<[u8]>,
{
	batch
		.inner_mut()
		.put_cf(&self.cf(), key.as_ref(), val.as_ref());
}
