//! Core Matrix Library

pub mod event;
pub mod member;

pub use event::{Event, StateEventKind, Unsigned};
pub use member::{Member, MemberRecord, Membership, MembershipContent};
