use std::borrow::Cow;

/// Default result type carrying the workspace error.
pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Err(Cow<'static, str>),

	/// An event the protocol should never have produced. Logged and
	/// skipped; never fatal.
	#[error("malformed event: {0}")]
	Malformed(Cow<'static, str>),

	#[error("database error: {0}")]
	Database(Cow<'static, str>),

	/// The response parsed but a required field is missing or of the
	/// wrong shape.
	#[error("invalid or missing {0:?} attribute in server's response")]
	BadServerResponse(&'static str),

	/// A reply carrying a non-success HTTP status.
	#[error("{message} (HTTP {status})")]
	Http { status: u16, message: String },

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Request(#[from] reqwest::Error),
}

impl Error {
	/// Whether a retry may succeed: rate-limiting, server errors and
	/// transport failures are transient; other client errors are not.
	#[must_use]
	pub fn is_transient(&self) -> bool {
		match self {
			| Self::Http { status, .. } => *status == 429 || *status >= 500,
			| Self::Request(_) => true,
			| _ => false,
		}
	}
}

/// Construct an [`Error`] variant from a format expression.
#[macro_export]
macro_rules! err {
	(Database($($args:tt)+)) => {
		$crate::Error::Database(::std::format!($($args)+).into())
	};

	(Malformed($($args:tt)+)) => {
		$crate::Error::Malformed(::std::format!($($args)+).into())
	};

	(BadServerResponse($attr:literal)) => {
		$crate::Error::BadServerResponse($attr)
	};

	(Http($status:expr, $($args:tt)+)) => {
		$crate::Error::Http {
			status: $status,
			message: ::std::format!($($args)+),
		}
	};

	($($args:tt)+) => {
		$crate::Error::Err(::std::format!($($args)+).into())
	};
}

/// Shorthand for `Err(err!(..))`.
#[macro_export]
#[allow(non_snake_case)]
macro_rules! Err {
	($($args:tt)+) => {
		::std::result::Result::Err($crate::err!($($args)+))
	};
}
