//! Room state engine for a Matrix chat client.
//!
//! Consumes per-room sync deltas and maintains membership with
//! display-name disambiguation, room metadata, a bounded recent-events
//! buffer, read receipts and a retrying outbound transmitter, persisting
//! the members index through the caller's database batch.

pub mod http;
pub mod members;
pub mod room;
pub mod session;
pub mod state;
pub mod sync;
pub mod updates;

pub use self::{
	http::Homeserver,
	members::Members,
	room::{Direction, MessageBatch, OutgoingEvent, Receipt, Room, TimelineBatch},
	session::{Client, Reply, Session},
	state::{RoomState, StateJson},
	sync::{Ephemeral, EphemeralEvent, JoinedRoom, State, Timeline, UnreadNotifications},
	updates::{Context, RoomUpdate, Updates},
};
