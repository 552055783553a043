//! Generated level documents

use glam::Vec2;

use super::{Node, Warnings, attr_f32, attr_i32, attr_vec2, format_vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct BossAttributes {
    pub name: String,
    pub health: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelEnemy {
    pub type_name: String,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelWave {
    /// Index of the source block in the store's wave-block list
    pub block_index: usize,
    pub difficulty: i32,
    pub boss: Option<BossAttributes>,
    pub enemies: Vec<LevelEnemy>,
}

/// Output of level generation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Level {
    pub waves: Vec<LevelWave>,
}

impl Level {
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn to_node(&self) -> Node {
        let mut root = Node::new("Level");
        for wave in &self.waves {
            let mut w = Node::new("Wave")
                .attr("blockIndex", wave.block_index)
                .attr("difficulty", wave.difficulty);
            if let Some(boss) = &wave.boss {
                w.set("bossName", &boss.name);
                w.set("bossHealth", boss.health);
            }
            for enemy in &wave.enemies {
                w.push(
                    Node::new("Enemy")
                        .attr("position", format_vec2(enemy.position))
                        .attr("type", &enemy.type_name),
                );
            }
            root.push(w);
        }
        root
    }

    /// Read a level document; enemies without a type are skipped
    pub fn from_node(root: &Node, warnings: &mut Warnings) -> Self {
        let waves = root
            .children_named("Wave")
            .map(|w| {
                let boss = w.get("bossName").map(|name| BossAttributes {
                    name: name.to_string(),
                    health: attr_f32(w, "bossHealth", warnings).unwrap_or(0.0),
                });
                let enemies = w
                    .children_named("Enemy")
                    .filter_map(|e| {
                        let type_name = e.get("type")?.to_string();
                        let position = attr_vec2(e, "position", warnings).unwrap_or(Vec2::ZERO);
                        Some(LevelEnemy {
                            type_name,
                            position,
                        })
                    })
                    .collect();
                LevelWave {
                    block_index: attr_i32(w, "blockIndex", warnings).unwrap_or(0).max(0) as usize,
                    difficulty: attr_i32(w, "difficulty", warnings).unwrap_or(0),
                    boss,
                    enemies,
                }
            })
            .collect();
        Self { waves }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_document_keeps_boss_annotation() {
        let level = Level {
            waves: vec![
                LevelWave {
                    block_index: 0,
                    difficulty: 4,
                    boss: None,
                    enemies: vec![LevelEnemy {
                        type_name: "drone".into(),
                        position: Vec2::new(-1.25, 8.0),
                    }],
                },
                LevelWave {
                    block_index: 2,
                    difficulty: 16,
                    boss: Some(BossAttributes {
                        name: "Ka'thun".into(),
                        health: 250.0,
                    }),
                    enemies: vec![LevelEnemy {
                        type_name: "kathun".into(),
                        position: Vec2::new(0.0, 10.0),
                    }],
                },
            ],
        };
        let mut warnings = Warnings::default();
        let json = level.to_node().to_json().unwrap();
        let back = Level::from_node(&Node::from_json(&json).unwrap(), &mut warnings);
        assert_eq!(back, level);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_boss_without_health_defers_to_type() {
        let doc = Node::new("Level").child(
            Node::new("Wave")
                .attr("bossName", "Ka'thun")
                .child(Node::new("Enemy").attr("type", "kathun").attr("position", "0,12")),
        );
        let level = Level::from_node(&doc, &mut Warnings::default());
        let boss = level.waves[0].boss.as_ref().unwrap();
        assert_eq!(boss.name, "Ka'thun");
        assert_eq!(boss.health, 0.0);
    }

    #[test]
    fn test_enemy_without_type_is_skipped() {
        let doc = Node::new("Level").child(
            Node::new("Wave")
                .attr("blockIndex", 0)
                .attr("difficulty", 0)
                .child(Node::new("Enemy").attr("position", "0,0"))
                .child(Node::new("Enemy").attr("position", "1,1").attr("type", "drone")),
        );
        let level = Level::from_node(&doc, &mut Warnings::default());
        assert_eq!(level.waves[0].enemies.len(), 1);
    }
}
