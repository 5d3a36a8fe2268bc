use std::{path::Path, sync::Arc};

use palaver_core::{Result, debug};
use rocksdb::{DBWithThreadMode, MultiThreaded, Options};

use crate::{Batch, Map, util::or_else};

pub(crate) type Db = DBWithThreadMode<MultiThreaded>;

/// The open database environment, shared across rooms.
pub struct Engine {
	db: Db,
}

impl Engine {
	/// Open or create the database with the named column families.
	pub fn open(path: &Path, maps: &[&'static str]) -> Result<Arc<Self>> {
		let mut opts = Options::default();
		opts.create_if_missing(true);
		opts.create_missing_column_families(true);

		let db = Db::open_cf(&opts, path, maps).or_else(or_else)?;
		debug!(?path, "opened database");

		Ok(Arc::new(Self { db }))
	}

	/// Handle to one column family.
	#[must_use]
	pub fn map(self: &Arc<Self>, name: &'static str) -> Arc<Map> { Map::open(self, name) }

	/// Start an atomic write spanning any number of maps. The caller owns
	/// the commit.
	#[must_use]
	pub fn batch(&self) -> Batch { Batch::default() }

	/// Commit a batch. Failure aborts whatever delta the batch covered.
	pub fn commit(&self, batch: Batch) -> Result {
		self.db
			.write(batch.into_inner())
			.or_else(or_else)
	}

	pub(crate) fn db(&self) -> &Db { &self.db }
}
