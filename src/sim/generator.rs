//! Level generation: wave blocks picked by difficulty, stretched and jittered
//!
//! The same seed, coordinate and content always yield the same level.

use glam::Vec2;
use rand::Rng;

use super::context::{MapCoord, NodeType};
use crate::content::{
    BossAttributes, Level, LevelEnemy, LevelWave, WaveBlock, WaveBlockEnemy, WaveBlockLine,
};
use crate::error::Result;
use crate::platform::Storage;
use crate::settings::Settings;

/// Difficulty gained per map level
pub const DIFFICULTY_PER_MAP_LEVEL: i32 = 10;
/// Difficulty points per extra wave
pub const DIFFICULTY_PER_WAVE: i32 = 5;
/// Extension shrinks line spacing to zero at this many extra lines
pub const EXTENSION_COMPRESSION: f32 = 20.0;

/// Difficulty score of a node; the scaled column is floored
pub fn difficulty_for(coord: MapCoord, node: NodeType, map_level: i32) -> i32 {
    let multiplier = match node {
        NodeType::Normal => 1.0,
        NodeType::Hard => 2.0,
        NodeType::Boss => 1.5,
    };
    (coord.col as f32 * multiplier).floor() as i32 + DIFFICULTY_PER_MAP_LEVEL * map_level
}

/// File a generated level is written to
pub fn level_path(coord: MapCoord) -> String {
    format!("level_{}.json", coord.id())
}

pub fn write_level(storage: &dyn Storage, coord: MapCoord, level: &Level) -> Result<()> {
    let path = level_path(coord);
    storage.write(&path, &level.to_node().to_json()?)?;
    log::debug!("Wrote {} ({} waves)", path, level.waves.len());
    Ok(())
}

/// Stretch an extensible block by `difficulty - block.difficulty` lines.
///
/// Lines are cloned round-robin and stacked above the block's top; each clone's
/// lowest enemy sits on the cursor. Flexible blocks pack tighter the more lines
/// they gain.
pub fn extend_for_difficulty(block: &WaveBlock, difficulty: i32, settings: &Settings) -> WaveBlock {
    let mut extended = block.clone();
    let extra = difficulty - block.difficulty;
    if !block.extensible || extra <= 0 || block.lines.is_empty() {
        return extended;
    }

    let top = block
        .lines
        .iter()
        .rev()
        .find_map(WaveBlockLine::max_y)
        .unwrap_or(settings.wave_visible_y);
    let mut cursor = top.max(settings.wave_visible_y) + settings.wave_line_spacing;
    let compression = if block.inflexible {
        1.0
    } else {
        (1.0 - extra as f32 / EXTENSION_COMPRESSION).max(0.0)
    };

    for i in 0..extra as usize {
        let line = &block.lines[i % block.lines.len()];
        let shift = line.min_y().map_or(0.0, |lo| cursor - lo);
        extended.lines.push(WaveBlockLine {
            enemies: line
                .enemies
                .iter()
                .map(|e| WaveBlockEnemy {
                    type_name: e.type_name.clone(),
                    position: e.position + Vec2::new(0.0, shift),
                })
                .collect(),
        });
        cursor += (line.height() + settings.wave_line_spacing) * compression;
    }
    extended
}

pub struct LevelGenerator<'a> {
    blocks: &'a [WaveBlock],
    settings: &'a Settings,
}

impl<'a> LevelGenerator<'a> {
    pub fn new(blocks: &'a [WaveBlock], settings: &'a Settings) -> Self {
        Self { blocks, settings }
    }

    /// Indices of regular blocks playable at `difficulty`
    fn eligible(&self, difficulty: i32) -> Vec<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_boss() && b.enemy_count() > 0 && b.difficulty <= difficulty)
            .map(|(i, _)| i)
            .collect()
    }

    fn boss_block(&self) -> Option<(usize, &'a WaveBlock)> {
        let name = self.settings.boss_block_name.as_str();
        self.blocks
            .iter()
            .enumerate()
            .find(|(_, b)| b.boss_name.as_deref() == Some(name))
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        coord: MapCoord,
        node: NodeType,
        map_level: i32,
        rng: &mut R,
    ) -> Level {
        let difficulty = difficulty_for(coord, node, map_level);
        let wave_count = rng.random_range(2..=3) + (difficulty / DIFFICULTY_PER_WAVE).max(0);

        let eligible = self.eligible(difficulty);
        if eligible.is_empty() {
            log::warn!(
                "No wave block playable at difficulty {} ({:?} node {}), emitting empty level",
                difficulty,
                node,
                coord.id()
            );
            return Level::default();
        }

        let mut level = Level::default();
        for j in 0..wave_count {
            let pick = eligible[rng.random_range(0..eligible.len())];
            let mut index = pick;
            let mut block = &self.blocks[pick];
            let mut boss = None;

            if node == NodeType::Boss && j == wave_count - 1 {
                match self.boss_block() {
                    Some((i, b)) => {
                        index = i;
                        block = b;
                        boss = Some(BossAttributes {
                            name: self.settings.boss_block_name.clone(),
                            health: b.boss_health.unwrap_or(0.0),
                        });
                    }
                    None => log::warn!(
                        "Boss block `{}` not loaded, keeping a regular wave",
                        self.settings.boss_block_name
                    ),
                }
            }

            let block = if boss.is_none() && block.extensible && difficulty != block.difficulty {
                extend_for_difficulty(block, difficulty, self.settings)
            } else {
                block.clone()
            };
            let enemies = self.place(&block, rng);

            level.waves.push(LevelWave {
                block_index: index,
                difficulty,
                boss,
                enemies,
            });
        }

        log::info!(
            "Generated level {} ({:?}, difficulty {}): {} waves, {} enemies",
            coord.id(),
            node,
            difficulty,
            level.waves.len(),
            level.waves.iter().map(|w| w.enemies.len()).sum::<usize>()
        );
        level
    }

    /// World positions for a block, jittered unless the block is inflexible
    fn place<R: Rng + ?Sized>(&self, block: &WaveBlock, rng: &mut R) -> Vec<LevelEnemy> {
        let jitter = self.settings.position_jitter;
        block
            .enemies()
            .map(|e| {
                let offset = if block.inflexible || jitter <= 0.0 {
                    Vec2::ZERO
                } else {
                    Vec2::new(
                        rng.random_range(-jitter..=jitter),
                        rng.random_range(-jitter..=jitter),
                    )
                };
                LevelEnemy {
                    type_name: e.type_name.clone(),
                    position: e.position + offset,
                }
            })
            .collect()
    }
}
