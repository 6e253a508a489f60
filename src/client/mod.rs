//! Client registration
//!
//! Records which callers registered and the address each was seen from.

pub mod record;
pub mod registry;

pub use record::ClientRecord;
pub use registry::ClientRegistry;
