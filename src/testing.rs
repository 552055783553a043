//! Shared in-memory content for unit tests

use std::sync::Arc;

use crate::content::store::{UPGRADES_FILE, WAVE_BLOCKS_FILE, gui_scene_path, object_type_path};
use crate::content::{DefinitionStore, Node};
use crate::platform::{MemoryStorage, ResourceCache};
use crate::settings::Settings;
use crate::sim::context::{GameContext, PlayerStats};
use crate::sim::world::CombatWorld;

/// Minimal object type document
pub fn object_type_doc(category: &str, pattern: &str, projectile: Option<&str>) -> Node {
    let mut attrs = Node::new("GameAttributes")
        .attr("movementControllerPattern", pattern)
        .attr("health", 3)
        .attr("damage", 1);
    if let Some(p) = projectile {
        attrs.set("projectile", p);
        attrs.set("shootingFrequency", 1000);
    }
    Node::new("ObjectType")
        .child(
            Node::new("Physics")
                .attr("bodySize", 1.0)
                .attr("category", category)
                .attr("constantVelocity", "0,-0.5"),
        )
        .child(Node::new("Animation").attr("state", "idle").attr("texture", "sprite"))
        .child(attrs)
}

fn enemy(ty: &str, x: f32, y: f32) -> Node {
    Node::new("Enemy").attr("type", ty).attr("position", format!("{x},{y}"))
}

pub fn object_type_docs() -> Vec<(&'static str, Node)> {
    vec![
        (
            "player",
            Node::new("ObjectType")
                .child(
                    Node::new("Physics")
                        .attr("bodySize", 1.0)
                        .attr("linearDamping", 2.0)
                        .attr("speed", 5.0)
                        .attr("category", "player"),
                )
                .child(Node::new("Animation").attr("state", "idle").attr("texture", "player"))
                .child(
                    Node::new("GameAttributes")
                        .attr("movementControllerPattern", "input_controlled")
                        .attr("health", 10)
                        .attr("damage", 1)
                        .attr("shootingFrequency", 400)
                        .attr("projectile", "player_bullet"),
                ),
        ),
        (
            "player_bullet",
            Node::new("ObjectType")
                .child(
                    Node::new("Physics")
                        .attr("bodySize", 0.2)
                        .attr("category", "player_bullet")
                        .attr("constantVelocity", "0,12"),
                )
                .child(Node::new("Animation").attr("texture", "player_bullet"))
                .child(Node::new("GameAttributes").attr("damage", 1)),
        ),
        ("drone", object_type_doc("enemy", "constant_velocity", None)),
        (
            "shooter",
            object_type_doc("enemy", "constant_velocity", Some("enemy_bullet")),
        ),
        ("chaser", object_type_doc("enemy", "chasing_player", None)),
        (
            "enemy_bullet",
            Node::new("ObjectType")
                .child(
                    Node::new("Physics")
                        .attr("bodySize", 0.2)
                        .attr("category", "enemy_bullet")
                        .attr("constantVelocity", "0,-8"),
                )
                .child(Node::new("Animation").attr("texture", "enemy_bullet"))
                .child(Node::new("GameAttributes").attr("damage", 1)),
        ),
        (
            "kathun",
            Node::new("ObjectType")
                .child(
                    Node::new("Physics")
                        .attr("bodySize", 3.0)
                        .attr("category", "boss")
                        .attr("constantVelocity", "0,0"),
                )
                .child(
                    Node::new("Animation")
                        .attr("state", "idle")
                        .attr("texture", "kathun_sheet")
                        .attr("textureSheetRow", 0)
                        .attr("duration", 1.0),
                )
                .child(
                    Node::new("GameAttributes")
                        .attr("movementControllerPattern", "constant_velocity")
                        .attr("health", 100)
                        .attr("damage", 3),
                ),
        ),
    ]
}

/// Blocks: an inflexible difficulty-0 trio, an extensible two-line block,
/// the Ka'thun boss block and a block of unknown enemies
pub fn wave_blocks_doc() -> Node {
    Node::new("WaveBlocks")
        .child(
            Node::new("WaveBlock")
                .attr("difficulty", 0)
                .attr("inflexible", true)
                .child(
                    Node::new("WaveBlockLine")
                        .child(enemy("drone", -2.0, 10.0))
                        .child(enemy("drone", 0.0, 10.0))
                        .child(enemy("drone", 2.0, 10.0)),
                ),
        )
        .child(
            Node::new("WaveBlock")
                .attr("difficulty", 3)
                .attr("extensible", true)
                .child(
                    Node::new("WaveBlockLine")
                        .child(enemy("drone", -1.0, 8.0))
                        .child(enemy("drone", 1.0, 8.0)),
                )
                .child(Node::new("WaveBlockLine").child(enemy("shooter", 0.0, 10.0))),
        )
        .child(
            Node::new("WaveBlock")
                .attr("difficulty", 10)
                .attr("bossName", "Ka'thun")
                .attr("bossHealth", 250)
                .attr("inflexible", true)
                .child(Node::new("WaveBlockLine").child(enemy("kathun", 0.0, 12.0))),
        )
        .child(
            Node::new("WaveBlock")
                .attr("difficulty", 0)
                .child(Node::new("WaveBlockLine").child(enemy("phantom", 0.0, 9.0))),
        )
}

pub fn upgrades_doc() -> Node {
    let upgrade = |name: &str, cost: u32| {
        Node::new("Upgrade")
            .attr("name", name)
            .attr("description", format!("{name} upgrade"))
            .attr("texture", format!("{name}_icon"))
            .attr("cost", cost)
    };
    Node::new("Upgrades")
        .child(upgrade("shield", 0))
        .child(upgrade("attack_boost", 10))
        .child(upgrade("speed_boost", 10))
        .child(upgrade("bullet_speed_boost", 15))
        .child(upgrade("max_health_up", 20))
        .child(upgrade("health_potion", 5).attr("intransient", true))
}

pub fn pause_menu_doc() -> Node {
    Node::new("GUIScene")
        .child(
            Node::new("GUIElement")
                .attr("name", "pause_overlay")
                .attr("texture", "black")
                .attr("position", "0,0,0.5")
                .attr("scale", "40,80"),
        )
        .child(
            Node::new("GUIElement")
                .attr("name", "continue_button")
                .attr("texture", "button")
                .attr("fontName", "main")
                .attr("text", "Continue")
                .attr("position", "0,0,0.6")
                .attr("scale", "4,1.5"),
        )
}

pub fn content_storage() -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    for (name, doc) in object_type_docs() {
        storage = storage.with_file(&object_type_path(name), &doc.to_json().unwrap());
    }
    storage
        .with_file(WAVE_BLOCKS_FILE, &wave_blocks_doc().to_json().unwrap())
        .with_file(UPGRADES_FILE, &upgrades_doc().to_json().unwrap())
        .with_file(
            &gui_scene_path("pause_menu"),
            &pause_menu_doc().to_json().unwrap(),
        )
}

pub fn loaded_store() -> DefinitionStore {
    let storage = content_storage();
    let mut store = DefinitionStore::load_all(&storage, "player", &["pause_menu"]).unwrap();
    store.load_object_type(&storage, "chaser").unwrap();
    store
}

pub fn test_settings() -> Settings {
    Settings::default()
}

/// Combat world over the fixture content, player stats from the player type
pub fn test_world() -> CombatWorld {
    let defs = Arc::new(loaded_store());
    let mut game = GameContext::new(9);
    game.player = PlayerStats::from_definition(defs.object_type("player").unwrap());
    let mut resources = ResourceCache::new();
    resources.set_aspect_ratio("kathun_sheet", 2.0);
    CombatWorld::new(defs, game, Box::new(resources), Arc::new(test_settings()))
}
