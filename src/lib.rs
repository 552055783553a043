//! Nova Waves - wave-based combat core for a top-down arcade shooter
//!
//! Core modules:
//! - `content`: Data-driven object types, wave blocks, upgrades and GUI scenes
//! - `sim`: Physics, scene, flows, game states and the per-frame level updater
//! - `persistence`: Run save with corruption recovery
//! - `platform`: Storage, input, resource and alert seams to the host
//! - `settings`: Gameplay tuning

pub mod content;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

#[cfg(test)]
mod testing;

pub use content::DefinitionStore;
pub use error::{CoreError, Result};
pub use settings::Settings;
