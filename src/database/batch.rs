use rocksdb::WriteBatchWithTransaction;

/// A set of writes committed atomically by [`crate::Engine::commit`]. One
/// batch spans a whole sync delta.
#[derive(Default)]
pub struct Batch {
	inner: WriteBatchWithTransaction<false>,
}

impl Batch {
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool { self.inner.is_empty() }

	#[inline]
	#[must_use]
	pub fn len(&self) -> usize { self.inner.len() }

	pub(crate) fn inner_mut(&mut self) -> &mut WriteBatchWithTransaction<false> {
		&mut self.inner
	}

	pub(crate) fn into_inner(self) -> WriteBatchWithTransaction<false> { self.inner }
}
