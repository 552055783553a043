//! Gameplay tuning and host configuration
//!
//! Persisted separately from the run save as `settings.json`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::Storage;

/// Axis-aligned world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Tuning knobs for the combat core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Simulation ===
    /// Fixed physics sub-step (seconds)
    pub physics_dt: f32,
    /// Maximum physics sub-steps per frame
    pub max_substeps: u32,
    /// Frame delta clamp (seconds)
    pub max_frame_dt: f32,
    /// Objects leaving this rectangle are destroyed
    pub world_bounds: WorldBounds,

    // === Level generation ===
    /// Per-enemy jitter amplitude for flexible blocks
    pub position_jitter: f32,
    /// Vertical gap between extended wave-block lines
    pub wave_line_spacing: f32,
    /// Baseline the block's top is measured against when extending
    pub wave_visible_y: f32,
    /// Boss block used for the last wave of a boss node
    pub boss_block_name: String,

    // === Movement ===
    /// Chasing enemies closer than this go to sleep (inclusive)
    pub chase_sleep_distance: f32,
    /// Virtual joystick radius in world units
    pub joystick_radius: f32,
    /// Player spawn point
    pub player_spawn: Vec2,

    // === States ===
    pub wave_intro_duration_ms: f32,
    pub overlay_fade_ms: f32,
    pub card_slide_ms: f32,
    pub shine_ms: f32,
    pub overlay_max_alpha: f32,

    // === Content ===
    pub player_type: String,
    pub save_file: String,
    /// Shield health granted per shield equip
    pub shield_health_per_equip: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            physics_dt: 1.0 / 60.0,
            max_substeps: 8,
            max_frame_dt: 0.1,
            world_bounds: WorldBounds {
                min: Vec2::new(-12.0, -12.0),
                max: Vec2::new(12.0, 40.0),
            },

            position_jitter: 1.0,
            wave_line_spacing: 1.5,
            wave_visible_y: 0.0,
            boss_block_name: "Ka'thun".to_string(),

            chase_sleep_distance: 0.5,
            joystick_radius: 1.5,
            player_spawn: Vec2::new(0.0, -6.0),

            wave_intro_duration_ms: 2000.0,
            overlay_fade_ms: 400.0,
            card_slide_ms: 600.0,
            shine_ms: 500.0,
            overlay_max_alpha: 0.7,

            player_type: "player".to_string(),
            save_file: "save.json".to_string(),
            shield_health_per_equip: 3.0,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "settings.json";

    /// Load settings from storage, falling back to defaults
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.read(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", Self::STORAGE_KEY);
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed {}: {}", Self::STORAGE_KEY, e);
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", Self::STORAGE_KEY, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        storage.write(Self::STORAGE_KEY, &serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Fixed physics step in milliseconds
    pub fn physics_dt_ms(&self) -> f32 {
        self.physics_dt * 1000.0
    }
}
