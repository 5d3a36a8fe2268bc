pub mod error;
pub mod matrix;
pub mod utils;

pub use error::{Error, Result};
pub use matrix::{
	event::{Event, StateEventKind, Unsigned},
	member::{Member, MemberRecord, Membership, MembershipContent},
};
pub use palaver_macros::implement;
pub use tracing::{debug, info, trace, warn};
