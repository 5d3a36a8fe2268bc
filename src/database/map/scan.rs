use palaver_core::{Result, implement};
use rocksdb::{Direction, IteratorMode};

use crate::util::or_else;

/// Iterate key/value pairs under a key prefix, in key order.
#[implement(super::Map)]
#[tracing::instrument(skip(self, prefix), fields(%self), level = "trace")]
pub fn raw_prefix(
	&self,
	prefix: Vec<u8>,
) -> impl Iterator<Item = Result<(Box<[u8]>, Box<[u8]>)>> + '_ {
	self.db
		.db()
		.iterator_cf(&self.cf(), IteratorMode::From(&prefix, Direction::Forward))
		.map(|item| item.or_else(or_else))
		.take_while(move |item| match item {
			| Ok((key, _)) => key.starts_with(&prefix),
			| Err(_) => true,
		})
}
