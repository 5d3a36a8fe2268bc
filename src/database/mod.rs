mod batch;
mod engine;
mod map;
pub(crate) mod util;

pub use batch::Batch;
pub use engine::Engine;
pub use map::Map;

/// Compound keys join their fixed-width parts with this separator.
pub const KEY_SEPARATOR: u8 = 0xFF;
