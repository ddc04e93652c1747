pub mod header;
pub mod revision;

pub mod read;
pub mod write;

pub mod io;

pub mod mesh;

pub use read::{decode, detect, detect_revision};
pub use revision::Revision;
pub use write::encode;

/// Identifies the file as a lens model, for every revision.
pub const MAGIC: u32 = 0x0053_9474;
