mod get;
mod insert;
mod remove;
mod scan;

use std::{fmt, sync::Arc};

use rocksdb::BoundColumnFamily;

use crate::Engine;

/// Handle to one column family of the engine.
pub struct Map {
	db: Arc<Engine>,
	name: &'static str,
}

impl Map {
	pub(crate) fn open(db: &Arc<Engine>, name: &'static str) -> Arc<Self> {
		Arc::new(Self { db: db.clone(), name })
	}

	#[inline]
	#[must_use]
	pub fn name(&self) -> &str { self.name }

	fn cf(&self) -> Arc<BoundColumnFamily<'_>> {
		self.db
			.db()
			.cf_handle(self.name)
			.expect("column family exists")
	}
}

impl fmt::Display for Map {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

impl fmt::Debug for Map {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Map {:?}", self.name) }
}
