//! Run persistence: one save document holding everything needed to resume
//!
//! Sections: `Seed`, `CurrentMapCoord`, `MapLevel`, `PlayerData`,
//! `EquippedUpgrades`, `AvailableUpgrades`. A zero seed, a missing section or a
//! malformed value marks the save as corrupted; the player is warned and a new
//! run is generated in its place.

use std::str::FromStr;

use crate::content::{DefinitionStore, Node};
use crate::error::{CoreError, DefinitionKind, Result};
use crate::platform::{Storage, UserAlerts};
use crate::settings::Settings;
use crate::sim::context::{AvailableUpgrade, EquippedUpgrade, GameContext, MapCoord, PlayerStats};

/// How the run was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// No save existed yet
    Created,
    /// The save was corrupted and replaced
    Regenerated,
}

/// Persisted part of the run
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSnapshot {
    pub seed: u32,
    pub map_coord: MapCoord,
    pub map_level: i32,
    pub player: PlayerStats,
    pub equipped: Vec<EquippedUpgrade>,
    pub available: Vec<AvailableUpgrade>,
}

impl SaveSnapshot {
    pub fn capture(game: &GameContext) -> Self {
        Self {
            seed: game.seed,
            map_coord: game.map_coord,
            map_level: game.map_level,
            player: game.player.clone(),
            equipped: game.equipped.clone(),
            available: game.available.clone(),
        }
    }

    pub fn apply(self, game: &mut GameContext) {
        game.reseed(self.seed);
        game.map_coord = self.map_coord;
        game.map_level = self.map_level;
        game.player = self.player;
        game.equipped = self.equipped;
        game.available = self.available;
    }

    pub fn to_node(&self) -> Node {
        let p = &self.player;
        let mut equipped = Node::new("EquippedUpgrades");
        for upgrade in &self.equipped {
            let mut node = Node::new("Upgrade").attr("name", &upgrade.name);
            if let Some(shield) = upgrade.shield_health {
                node.set("shieldHealth", shield);
            }
            equipped.push(node);
        }
        let mut available = Node::new("AvailableUpgrades");
        for upgrade in &self.available {
            available.push(
                Node::new("Upgrade")
                    .attr("name", &upgrade.name)
                    .attr("cost", upgrade.cost),
            );
        }

        Node::new("Save")
            .child(Node::new("Seed").attr("value", self.seed))
            .child(
                Node::new("CurrentMapCoord")
                    .attr("col", self.map_coord.col)
                    .attr("row", self.map_coord.row),
            )
            .child(Node::new("MapLevel").attr("value", self.map_level))
            .child(
                Node::new("PlayerData")
                    .attr("maxHealth", p.max_health)
                    .attr("currentHealth", p.current_health)
                    .attr("attack", p.attack)
                    .attr("movementSpeed", p.movement_speed)
                    .attr("bulletSpeed", p.bullet_speed)
                    .attr("shieldHealth", p.shield_health)
                    .attr("crystals", p.crystals),
            )
            .child(equipped)
            .child(available)
    }

    /// Parse a save document. Upgrade names unknown to `store` are dropped and
    /// current health is clamped to the maximum.
    pub fn from_node(root: &Node, store: &DefinitionStore) -> Result<Self> {
        let seed: u32 = required(section(root, "Seed")?, "value")?;
        if seed == 0 {
            return Err(CoreError::CorruptedSave("seed is 0".into()));
        }
        let coord = section(root, "CurrentMapCoord")?;
        let map_coord = MapCoord::new(required(coord, "col")?, required(coord, "row")?);
        let map_level = required(section(root, "MapLevel")?, "value")?;

        let data = section(root, "PlayerData")?;
        let mut player = PlayerStats {
            max_health: required(data, "maxHealth")?,
            current_health: required(data, "currentHealth")?,
            attack: required(data, "attack")?,
            movement_speed: required(data, "movementSpeed")?,
            bullet_speed: required(data, "bulletSpeed")?,
            shield_health: required(data, "shieldHealth")?,
            crystals: required(data, "crystals")?,
        };
        if player.current_health > player.max_health {
            log::warn!(
                "Save health {} above max {}, clamping",
                player.current_health,
                player.max_health
            );
            player.current_health = player.max_health;
        }

        let mut equipped = Vec::new();
        for node in section(root, "EquippedUpgrades")?.children_named("Upgrade") {
            let name: String = required(node, "name")?;
            if !known_upgrade(store, &name) {
                continue;
            }
            let shield_health = match node.get("shieldHealth") {
                Some(_) => Some(required(node, "shieldHealth")?),
                None => None,
            };
            equipped.push(EquippedUpgrade {
                name,
                shield_health,
            });
        }

        let mut available = Vec::new();
        for node in section(root, "AvailableUpgrades")?.children_named("Upgrade") {
            let name: String = required(node, "name")?;
            if !known_upgrade(store, &name) {
                continue;
            }
            available.push(AvailableUpgrade {
                name,
                cost: required(node, "cost")?,
            });
        }

        Ok(Self {
            seed,
            map_coord,
            map_level,
            player,
            equipped,
            available,
        })
    }
}

fn section<'a>(root: &'a Node, tag: &str) -> Result<&'a Node> {
    root.find(tag)
        .ok_or_else(|| CoreError::CorruptedSave(format!("missing section `{tag}`")))
}

fn required<T: FromStr>(node: &Node, key: &str) -> Result<T> {
    let raw = node.get(key).ok_or_else(|| {
        CoreError::CorruptedSave(format!("`{}` has no `{}`", node.tag, key))
    })?;
    raw.trim().parse().map_err(|_| {
        CoreError::CorruptedSave(format!("`{}.{}` is malformed: `{}`", node.tag, key, raw))
    })
}

fn known_upgrade(store: &DefinitionStore, name: &str) -> bool {
    let known = store.upgrade(name).is_some();
    if !known {
        log::warn!("Dropping unknown upgrade `{}` from save", name);
    }
    known
}

/// Fresh non-zero run seed
pub fn fresh_seed() -> u32 {
    loop {
        let seed = rand::random::<u32>();
        if seed != 0 {
            return seed;
        }
    }
}

/// Write the current run to the save file
pub fn build_save(game: &GameContext, storage: &dyn Storage, settings: &Settings) -> Result<()> {
    let json = SaveSnapshot::capture(game).to_node().to_json()?;
    storage.write(&settings.save_file, &json)?;
    log::info!(
        "Saved run (seed {}, coord {}, map level {})",
        game.seed,
        game.map_coord.id(),
        game.map_level
    );
    Ok(())
}

/// Start a new run from the player type's defaults and the full upgrade
/// catalog, then write it
pub fn generate_new_save(
    game: &mut GameContext,
    storage: &dyn Storage,
    store: &DefinitionStore,
    settings: &Settings,
) -> Result<()> {
    let player = store
        .object_type(&settings.player_type)
        .ok_or_else(|| CoreError::missing(DefinitionKind::ObjectType, &settings.player_type))?;
    SaveSnapshot {
        seed: fresh_seed(),
        map_coord: MapCoord::default(),
        map_level: 0,
        player: PlayerStats::from_definition(player),
        equipped: Vec::new(),
        available: store
            .upgrades()
            .iter()
            .map(|u| AvailableUpgrade {
                name: u.name.clone(),
                cost: u.cost,
            })
            .collect(),
    }
    .apply(game);
    log::info!("Generated new run with seed {}", game.seed);
    build_save(game, storage, settings)
}

/// Restore the run from the save file. A missing save starts a new run; a
/// corrupted one warns the player and is replaced by a new run.
pub fn load_from_save(
    game: &mut GameContext,
    storage: &dyn Storage,
    store: &DefinitionStore,
    settings: &Settings,
    alerts: &mut dyn UserAlerts,
) -> Result<LoadOutcome> {
    let Some(json) = storage.read(&settings.save_file)? else {
        log::info!("No save found, starting a new run");
        generate_new_save(game, storage, store, settings)?;
        return Ok(LoadOutcome::Created);
    };

    let parsed = Node::from_json(&json)
        .map_err(|e| CoreError::CorruptedSave(e.to_string()))
        .and_then(|root| SaveSnapshot::from_node(&root, store));
    match parsed {
        Ok(snapshot) => {
            snapshot.apply(game);
            log::info!(
                "Loaded run (seed {}, coord {}, map level {})",
                game.seed,
                game.map_coord.id(),
                game.map_level
            );
            Ok(LoadOutcome::Loaded)
        }
        Err(CoreError::CorruptedSave(reason)) => {
            log::error!("Corrupted save: {}", reason);
            alerts.warn_user(
                "Corrupted save",
                "Your save file could not be read. A new run has been started.",
            );
            generate_new_save(game, storage, store, settings)?;
            Ok(LoadOutcome::Regenerated)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryStorage, RecordedAlerts};
    use crate::testing::{loaded_store, test_settings};

    #[test]
    fn test_save_round_trip() {
        let store = loaded_store();
        let settings = test_settings();
        let storage = MemoryStorage::new();
        let mut game = GameContext::new(777);
        game.map_coord = MapCoord::new(3, 1);
        game.map_level = 2;
        game.player = PlayerStats {
            max_health: 12.0,
            current_health: 7.5,
            attack: 1.25,
            movement_speed: 6.0,
            bullet_speed: 1.2,
            shield_health: 3.5,
            crystals: 42,
        };
        game.equipped = vec![EquippedUpgrade {
            name: "shield".into(),
            shield_health: Some(3.5),
        }];
        game.available = vec![
            AvailableUpgrade {
                name: "attack_boost".into(),
                cost: 10,
            },
            AvailableUpgrade {
                name: "health_potion".into(),
                cost: 5,
            },
        ];
        build_save(&game, &storage, &settings).unwrap();

        let mut restored = GameContext::new(1);
        let mut alerts = RecordedAlerts::default();
        let outcome =
            load_from_save(&mut restored, &storage, &store, &settings, &mut alerts).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert!(alerts.messages.is_empty());
        assert_eq!(SaveSnapshot::capture(&restored), SaveSnapshot::capture(&game));
    }

    #[test]
    fn test_zero_seed_regenerates() {
        let store = loaded_store();
        let settings = test_settings();
        let mut game = GameContext::new(5);
        let doc = SaveSnapshot {
            seed: 0,
            ..SaveSnapshot::capture(&game)
        }
        .to_node();
        let storage = MemoryStorage::new().with_file(&settings.save_file, &doc.to_json().unwrap());

        let mut alerts = RecordedAlerts::default();
        let outcome = load_from_save(&mut game, &storage, &store, &settings, &mut alerts).unwrap();

        assert_eq!(outcome, LoadOutcome::Regenerated);
        assert_eq!(alerts.messages.len(), 1);
        assert_ne!(game.seed, 0);
        let player = store.object_type("player").unwrap();
        assert_eq!(game.player, PlayerStats::from_definition(player));
        assert!(game.equipped.is_empty());
        assert_eq!(game.available.len(), store.upgrades().len());

        let saved = storage.read(&settings.save_file).unwrap().unwrap();
        let root = Node::from_json(&saved).unwrap();
        let snapshot = SaveSnapshot::from_node(&root, &store).unwrap();
        assert_eq!(snapshot.seed, game.seed);
    }

    #[test]
    fn test_missing_section_and_garbage_are_corruption() {
        let store = loaded_store();
        let game = GameContext::new(3);
        let mut doc = SaveSnapshot::capture(&game).to_node();
        doc.children.retain(|c| c.tag != "PlayerData");
        assert!(matches!(
            SaveSnapshot::from_node(&doc, &store),
            Err(CoreError::CorruptedSave(_))
        ));

        let settings = test_settings();
        let storage = MemoryStorage::new().with_file(&settings.save_file, "not json");
        let mut game = GameContext::new(3);
        let mut alerts = RecordedAlerts::default();
        let outcome = load_from_save(&mut game, &storage, &store, &settings, &mut alerts).unwrap();
        assert_eq!(outcome, LoadOutcome::Regenerated);
    }

    #[test]
    fn test_missing_save_creates_run_silently() {
        let store = loaded_store();
        let settings = test_settings();
        let storage = MemoryStorage::new();
        let mut game = GameContext::new(0);
        let mut alerts = RecordedAlerts::default();
        let outcome = load_from_save(&mut game, &storage, &store, &settings, &mut alerts).unwrap();
        assert_eq!(outcome, LoadOutcome::Created);
        assert!(alerts.messages.is_empty());
        assert!(storage.exists(&settings.save_file));
        assert_ne!(game.seed, 0);
    }

    #[test]
    fn test_unknown_upgrades_dropped_and_health_clamped() {
        let store = loaded_store();
        let mut game = GameContext::new(8);
        game.player.max_health = 5.0;
        game.player.current_health = 9.0;
        game.equipped = vec![
            EquippedUpgrade {
                name: "laser_eyes".into(),
                shield_health: None,
            },
            EquippedUpgrade {
                name: "speed_boost".into(),
                shield_health: None,
            },
        ];
        let doc = SaveSnapshot::capture(&game).to_node();
        let snapshot = SaveSnapshot::from_node(&doc, &store).unwrap();
        assert_eq!(snapshot.player.current_health, 5.0);
        assert_eq!(snapshot.equipped.len(), 1);
        assert_eq!(snapshot.equipped[0].name, "speed_boost");
    }
}
