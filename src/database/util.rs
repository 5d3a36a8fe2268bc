use palaver_core::{Error, Result, err};

#[inline]
pub(crate) fn or_else<T>(e: rocksdb::Error) -> Result<T> { Err(map_err(e)) }

#[inline]
pub(crate) fn map_err(e: rocksdb::Error) -> Error { err!(Database("{e}")) }
