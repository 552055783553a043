//! Easing curves and millisecond tweens for overlays and cards

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    BounceOut,
    BounceIn,
}

impl Easing {
    /// Eased fraction for `t` in [0, 1]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::BounceOut => bounce_out(t),
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
        }
    }
}

pub fn bounce_out(t: f32) -> f32 {
    if t < 1.0 / 2.75 {
        7.5625 * t * t
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        7.5625 * t * t + 0.75
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        7.5625 * t * t + 0.9375
    } else {
        let t = t - 2.625 / 2.75;
        7.5625 * t * t + 0.984375
    }
}

/// Interpolates a 2D value over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Vec2,
    pub to: Vec2,
    pub duration_ms: f32,
    pub easing: Easing,
    elapsed_ms: f32,
}

impl Tween {
    pub fn new(from: Vec2, to: Vec2, duration_ms: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration_ms,
            easing,
            elapsed_ms: 0.0,
        }
    }

    /// Advance and return the current value
    pub fn advance(&mut self, dt_ms: f32) -> Vec2 {
        self.elapsed_ms = (self.elapsed_ms + dt_ms).min(self.duration_ms.max(0.0));
        self.value()
    }

    pub fn value(&self) -> Vec2 {
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(self.to, self.easing.apply(self.fraction()))
    }

    pub fn fraction(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            self.elapsed_ms / self.duration_ms
        }
    }

    pub fn is_finished(&self) -> bool {
        self.fraction() >= 1.0
    }
}
