//! Platform abstraction layer
//!
//! The combat core only talks to the host through these seams:
//! - Storage (one writable local directory, documents by simple name)
//! - Input events (most recent touch)
//! - Resource ids (textures, shaders, fonts)
//! - User-visible alerts

pub mod input;
pub mod resources;
pub mod storage;

pub use input::{InputContext, TouchEvent, TouchKind};
pub use resources::{ResourceCache, ResourceId, ResourceLoader};
pub use storage::{DirStorage, LogAlerts, MemoryStorage, RecordedAlerts, Storage, UserAlerts};
