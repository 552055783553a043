//! Per-object animation playback over a shared spec

use std::sync::Arc;

use rand::Rng;

use crate::content::AnimationSpec;

/// Loop position of a sprite-sheet animation, in [0, 1)
pub const PROGRESS_UNIFORM: &str = "animationProgress";
/// Dissolve amount, in [0, 1]
pub const DISSOLVE_UNIFORM: &str = "dissolve";

/// Playback cursor over an immutable animation spec
#[derive(Debug, Clone)]
pub struct Animation {
    spec: Arc<AnimationSpec>,
    /// Seconds since the animation started
    elapsed: f32,
    /// Texture picked at clone time
    texture: String,
}

impl Animation {
    pub fn new<R: Rng + ?Sized>(spec: Arc<AnimationSpec>, rng: &mut R) -> Self {
        let texture = match spec.as_ref() {
            AnimationSpec::VariableTextured { textures } if !textures.is_empty() => {
                textures[rng.random_range(0..textures.len())].clone()
            }
            other => other.base_texture().unwrap_or_default().to_string(),
        };
        Self {
            spec,
            elapsed: 0.0,
            texture,
        }
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Normalized cursor: loop position for sheets, dissolve amount for dissolves
    pub fn progress(&self) -> f32 {
        match self.spec.as_ref() {
            AnimationSpec::MultiFrame { duration, .. } if *duration > 0.0 => {
                (self.elapsed % duration) / duration
            }
            AnimationSpec::Dissolve { speed, .. } => (self.elapsed * speed).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Shader uniform that carries `progress()`; static textures have none
    pub fn uniform(&self) -> Option<&'static str> {
        match self.spec.as_ref() {
            AnimationSpec::MultiFrame { .. } => Some(PROGRESS_UNIFORM),
            AnimationSpec::Dissolve { .. } => Some(DISSOLVE_UNIFORM),
            AnimationSpec::SingleFrame { .. } | AnimationSpec::VariableTextured { .. } => None,
        }
    }
}
