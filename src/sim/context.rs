//! Run-wide game state threaded through states, updater and persistence

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::content::{Level, LevelWave, ObjectTypeDefinition};

/// Position of an encounter on the run map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapCoord {
    pub col: i32,
    pub row: i32,
}

impl MapCoord {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Identifier used for per-node documents
    pub fn id(&self) -> String {
        format!("{}_{}", self.col, self.row)
    }
}

/// Kind of map node the level is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeType {
    #[default]
    Normal,
    Hard,
    Boss,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerStats {
    pub max_health: f32,
    pub current_health: f32,
    pub attack: f32,
    pub movement_speed: f32,
    /// Multiplier on the player's projectile velocity
    pub bullet_speed: f32,
    pub shield_health: f32,
    pub crystals: u32,
}

impl PlayerStats {
    /// Fresh stats from the player object type
    pub fn from_definition(def: &ObjectTypeDefinition) -> Self {
        Self {
            max_health: def.health,
            current_health: def.health,
            attack: def.damage,
            movement_speed: def.speed,
            bullet_speed: 1.0,
            shield_health: 0.0,
            crystals: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquippedUpgrade {
    pub name: String,
    /// Shield health granted by this equip
    pub shield_health: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvailableUpgrade {
    pub name: String,
    pub cost: u32,
}

/// Process-wide run state
#[derive(Debug, Clone)]
pub struct GameContext {
    /// Run seed; 0 marks a corrupted save
    pub seed: u32,
    pub map_coord: MapCoord,
    pub map_level: i32,
    pub node_type: NodeType,
    pub player: PlayerStats,
    pub equipped: Vec<EquippedUpgrade>,
    pub available: Vec<AvailableUpgrade>,

    /// Level being fought
    pub level: Level,
    /// Wave index within `level` (0-based)
    pub current_wave: usize,
    pub level_cleared: bool,
    pub player_defeated: bool,

    /// Gameplay random stream, seeded from `seed`
    pub rng: Pcg32,
}

impl GameContext {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            map_coord: MapCoord::default(),
            map_level: 0,
            node_type: NodeType::Normal,
            player: PlayerStats::default(),
            equipped: Vec::new(),
            available: Vec::new(),
            level: Level::default(),
            current_wave: 0,
            level_cleared: false,
            player_defeated: false,
            rng: Pcg32::seed_from_u64(seed as u64),
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed as u64);
    }

    /// Stream used to generate the level at a map coordinate: the same seed and
    /// coordinate always yield the same layout
    pub fn level_rng(&self, coord: MapCoord) -> Pcg32 {
        let col = coord.col as u32 as u64;
        let row = coord.row as u32 as u64;
        Pcg32::seed_from_u64(((self.seed as u64) << 32) ^ (col << 16) ^ row)
    }

    /// Begin fighting a freshly generated or loaded level
    pub fn start_level(&mut self, level: Level) {
        self.level = level;
        self.current_wave = 0;
        self.level_cleared = false;
        self.player_defeated = false;
    }

    pub fn current_wave(&self) -> Option<&LevelWave> {
        self.level.waves.get(self.current_wave)
    }

    pub fn is_last_wave(&self) -> bool {
        self.current_wave + 1 >= self.level.waves.len()
    }

    /// Shield absorbs first; returns remaining health
    pub fn damage_player(&mut self, amount: f32) -> f32 {
        let mut amount = amount.max(0.0);
        if self.player.shield_health > 0.0 {
            let absorbed = amount.min(self.player.shield_health);
            self.player.shield_health -= absorbed;
            amount -= absorbed;
        }
        self.player.current_health = (self.player.current_health - amount).max(0.0);
        if self.player.current_health <= 0.0 && !self.player_defeated {
            log::info!("Player defeated on wave {}", self.current_wave + 1);
            self.player_defeated = true;
        }
        self.player.current_health
    }
}
