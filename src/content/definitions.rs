//! Immutable records parsed from content documents

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Physics category bits
pub mod category {
    pub const ENEMY: u16 = 0x0001;
    pub const ENEMY_BULLET: u16 = 0x0002;
    pub const PLAYER: u16 = 0x0004;
    pub const PLAYER_BULLET: u16 = 0x0008;
    pub const PLAYER_ONLY_WALL: u16 = 0x0010;
    pub const BULLET_ONLY_WALL: u16 = 0x0020;

    /// Map a content `category` attribute to its bit; `boss` shares the enemy bit
    pub fn from_name(name: &str) -> Option<u16> {
        match name {
            "enemy" | "boss" => Some(ENEMY),
            "enemy_bullet" => Some(ENEMY_BULLET),
            "player" => Some(PLAYER),
            "player_bullet" => Some(PLAYER_BULLET),
            "player_only_wall" => Some(PLAYER_ONLY_WALL),
            "bullet_only_wall" => Some(BULLET_ONLY_WALL),
            _ => None,
        }
    }
}

/// Category + mask bits of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFilter {
    pub category: u16,
    pub mask: u16,
}

impl ContactFilter {
    /// Filter for a category with the mask trimmed against friendly fire and
    /// the walls that category passes through
    pub fn for_category(cat: u16) -> Self {
        use category::*;
        let mask = match cat {
            ENEMY => PLAYER | PLAYER_BULLET,
            ENEMY_BULLET => PLAYER | BULLET_ONLY_WALL,
            PLAYER => ENEMY | ENEMY_BULLET | PLAYER_ONLY_WALL,
            PLAYER_BULLET => ENEMY | BULLET_ONLY_WALL,
            PLAYER_ONLY_WALL => PLAYER,
            BULLET_ONLY_WALL => PLAYER_BULLET | ENEMY_BULLET,
            _ => 0,
        };
        Self {
            category: cat,
            mask,
        }
    }

    /// Both fixtures must accept each other
    pub fn accepts(&self, other: &ContactFilter) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

impl Default for ContactFilter {
    fn default() -> Self {
        Self::for_category(category::ENEMY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementPattern {
    #[default]
    ConstantVelocity,
    ChasingPlayer,
    InputControlled,
}

impl MovementPattern {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "constant_velocity" => Some(MovementPattern::ConstantVelocity),
            "chasing_player" => Some(MovementPattern::ChasingPlayer),
            "input_controlled" => Some(MovementPattern::InputControlled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlipMode {
    #[default]
    None,
    X,
    Y,
    XY,
}

impl FlipMode {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "x" => Some(FlipMode::X),
            "y" => Some(FlipMode::Y),
            "xy" => Some(FlipMode::XY),
            _ => None,
        }
    }

    pub fn flips_x(&self) -> bool {
        matches!(self, FlipMode::X | FlipMode::XY)
    }

    pub fn flips_y(&self) -> bool {
        matches!(self, FlipMode::Y | FlipMode::XY)
    }
}

/// Shared, immutable animation description; clones carry their own cursor
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationSpec {
    SingleFrame {
        texture: String,
    },
    MultiFrame {
        sheet: String,
        row: i32,
        /// Seconds per loop
        duration: f32,
        scale: f32,
    },
    /// One texture picked at clone time
    VariableTextured {
        textures: Vec<String>,
    },
    Dissolve {
        texture: String,
        dissolve_texture: String,
        /// Progress per second
        speed: f32,
    },
}

impl AnimationSpec {
    /// Texture shown before any playback
    pub fn base_texture(&self) -> Option<&str> {
        match self {
            AnimationSpec::SingleFrame { texture } => Some(texture),
            AnimationSpec::MultiFrame { sheet, .. } => Some(sheet),
            AnimationSpec::VariableTextured { textures } => textures.first().map(String::as_str),
            AnimationSpec::Dissolve { texture, .. } => Some(texture),
        }
    }

    /// Expand `"name{a:b}"` into `name<a>..=name<b>`
    pub fn expand_variable(texture: &str) -> Option<Vec<String>> {
        let open = texture.find('{')?;
        let close = texture.rfind('}')?;
        if close < open {
            return None;
        }
        let (from, to) = texture[open + 1..close].split_once(':')?;
        let from: i32 = from.trim().parse().ok()?;
        let to: i32 = to.trim().parse().ok()?;
        if to < from {
            return None;
        }
        let prefix = &texture[..open];
        let suffix = &texture[close + 1..];
        Some((from..=to).map(|i| format!("{prefix}{i}{suffix}")).collect())
    }
}

pub const DEFAULT_ANIMATION_STATE: &str = "idle";

/// Template for any spawnable entity
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeDefinition {
    pub name: String,
    pub body_size: f32,
    pub density: f32,
    pub linear_damping: f32,
    /// Chase force / joystick speed
    pub speed: f32,
    pub constant_velocity: Option<Vec2>,
    pub movement: MovementPattern,
    pub health: f32,
    pub damage: f32,
    /// Shooting period in milliseconds
    pub shooting_period_ms: Option<f32>,
    pub projectile: Option<String>,
    pub filter: ContactFilter,
    pub boss: bool,
    pub flip: FlipMode,
    pub animations: BTreeMap<String, Arc<AnimationSpec>>,
}

impl ObjectTypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body_size: 1.0,
            density: 1.0,
            linear_damping: 0.0,
            speed: 1.0,
            constant_velocity: None,
            movement: MovementPattern::default(),
            health: 1.0,
            damage: 0.0,
            shooting_period_ms: None,
            projectile: None,
            filter: ContactFilter::default(),
            boss: false,
            flip: FlipMode::None,
            animations: BTreeMap::new(),
        }
    }

    /// Animation for a state name, falling back to `idle`, then to any
    pub fn animation(&self, state: &str) -> Option<&Arc<AnimationSpec>> {
        self.animations
            .get(state)
            .or_else(|| self.animations.get(DEFAULT_ANIMATION_STATE))
            .or_else(|| self.animations.values().next())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveBlockEnemy {
    pub type_name: String,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaveBlockLine {
    pub enemies: Vec<WaveBlockEnemy>,
}

impl WaveBlockLine {
    pub fn min_y(&self) -> Option<f32> {
        self.enemies.iter().map(|e| e.position.y).reduce(f32::min)
    }

    pub fn max_y(&self) -> Option<f32> {
        self.enemies.iter().map(|e| e.position.y).reduce(f32::max)
    }

    /// Vertical extent of the line (0 for a single row)
    pub fn height(&self) -> f32 {
        match (self.min_y(), self.max_y()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0.0,
        }
    }
}

/// A reusable enemy formation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaveBlock {
    pub lines: Vec<WaveBlockLine>,
    pub difficulty: i32,
    pub extensible: bool,
    pub inflexible: bool,
    pub boss_name: Option<String>,
    pub boss_health: Option<f32>,
}

impl WaveBlock {
    pub fn enemy_count(&self) -> usize {
        self.lines.iter().map(|l| l.enemies.len()).sum()
    }

    pub fn enemies(&self) -> impl Iterator<Item = &WaveBlockEnemy> {
        self.lines.iter().flat_map(|l| l.enemies.iter())
    }

    pub fn is_boss(&self) -> bool {
        self.boss_name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeDefinition {
    pub name: String,
    pub description: String,
    pub texture: String,
    /// Crystals required to unlock
    pub cost: u32,
    /// Stays in the available pool after being picked
    pub intransient: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuiElementDefinition {
    pub name: String,
    pub font_name: Option<String>,
    pub position: Vec3,
    pub scale: Vec2,
    pub texture: Option<String>,
    pub shader: Option<String>,
    pub text: Option<String>,
    pub invisible: bool,
}

impl Default for GuiElementDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            font_name: None,
            position: Vec3::ZERO,
            scale: Vec2::ONE,
            texture: None,
            shader: None,
            text: None,
            invisible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuiScene {
    pub name: String,
    pub elements: Vec<GuiElementDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use category::*;

    #[test]
    fn test_filters_suppress_friendly_fire() {
        let enemy = ContactFilter::for_category(ENEMY);
        let enemy_bullet = ContactFilter::for_category(ENEMY_BULLET);
        let player = ContactFilter::for_category(PLAYER);
        let player_bullet = ContactFilter::for_category(PLAYER_BULLET);

        assert!(enemy.accepts(&player));
        assert!(enemy.accepts(&player_bullet));
        assert!(!enemy.accepts(&enemy_bullet));
        assert!(!enemy.accepts(&enemy));
        assert!(!player.accepts(&player_bullet));
        assert!(player.accepts(&enemy_bullet));
    }

    #[test]
    fn test_walls_are_category_specific() {
        let player_wall = ContactFilter::for_category(PLAYER_ONLY_WALL);
        let bullet_wall = ContactFilter::for_category(BULLET_ONLY_WALL);
        let player = ContactFilter::for_category(PLAYER);
        let player_bullet = ContactFilter::for_category(PLAYER_BULLET);

        assert!(player_wall.accepts(&player));
        assert!(!player_wall.accepts(&player_bullet));
        assert!(bullet_wall.accepts(&player_bullet));
        assert!(!bullet_wall.accepts(&player));
    }

    #[test]
    fn test_expand_variable_texture() {
        assert_eq!(
            AnimationSpec::expand_variable("asteroid{1:3}"),
            Some(vec![
                "asteroid1".to_string(),
                "asteroid2".to_string(),
                "asteroid3".to_string()
            ])
        );
        assert_eq!(AnimationSpec::expand_variable("plain"), None);
        assert_eq!(AnimationSpec::expand_variable("bad{3:1}"), None);
    }

    #[test]
    fn test_line_height() {
        let line = WaveBlockLine {
            enemies: vec![
                WaveBlockEnemy {
                    type_name: "a".into(),
                    position: Vec2::new(0.0, 2.0),
                },
                WaveBlockEnemy {
                    type_name: "a".into(),
                    position: Vec2::new(1.0, 3.5),
                },
            ],
        };
        assert_eq!(line.height(), 1.5);
        assert_eq!(WaveBlockLine::default().height(), 0.0);
    }
}
