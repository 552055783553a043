//! Definition store: parses content documents into records
//!
//! Each record kind has a tag → handler table. Handlers mutate the record under
//! construction; unknown tags and missing attributes are tolerated. A reference
//! to an object type that cannot be loaded drops the referring record.

use std::collections::HashMap;
use std::sync::Arc;

use super::definitions::*;
use super::level::Level;
use super::{
    Node, NodeHandlers, Warnings, attr_bool, attr_f32, attr_i32, attr_vec2, attr_vec3,
};
use crate::error::{CoreError, DefinitionKind, Result};
use crate::platform::Storage;

pub const UPGRADES_FILE: &str = "upgrades.json";
pub const WAVE_BLOCKS_FILE: &str = "wave_blocks.json";

pub fn object_type_path(name: &str) -> String {
    format!("object_types/{name}.json")
}

pub fn gui_scene_path(name: &str) -> String {
    format!("gui/{name}.json")
}

/// All parsed content, immutable once gameplay starts
#[derive(Debug, Default)]
pub struct DefinitionStore {
    object_types: HashMap<String, Arc<ObjectTypeDefinition>>,
    wave_blocks: Vec<WaveBlock>,
    upgrades: Vec<UpgradeDefinition>,
    gui_scenes: HashMap<String, GuiScene>,
    warnings: Vec<CoreError>,
}

fn unknown_value(node: &Node, key: &str, warnings: &mut Warnings) {
    if let Some(value) = node.get(key) {
        warnings.push(CoreError::ContentParse {
            tag: node.tag.clone(),
            attribute: key.to_string(),
            value: value.to_string(),
        });
    }
}

fn object_type_handlers() -> NodeHandlers<ObjectTypeDefinition> {
    NodeHandlers::<ObjectTypeDefinition>::new()
        .on("Physics", |node, def, warnings| {
            if let Some(v) = attr_f32(node, "bodySize", warnings) {
                def.body_size = v;
            }
            if let Some(v) = attr_f32(node, "density", warnings) {
                def.density = v;
            }
            if let Some(v) = attr_f32(node, "linearDamping", warnings) {
                def.linear_damping = v;
            }
            if let Some(v) = attr_f32(node, "speed", warnings) {
                def.speed = v;
            }
            if let Some(v) = attr_vec2(node, "constantVelocity", warnings) {
                def.constant_velocity = Some(v);
            }
            if let Some(name) = node.get("category") {
                match category::from_name(name) {
                    Some(cat) => {
                        def.filter = ContactFilter::for_category(cat);
                        def.boss = name == "boss";
                    }
                    None => unknown_value(node, "category", warnings),
                }
            }
        })
        .on("Animation", |node, def, warnings| {
            let state = node
                .get("state")
                .unwrap_or(DEFAULT_ANIMATION_STATE)
                .to_string();
            let texture = node.get("texture").map(str::to_string);
            let spec = if let Some(row) = attr_i32(node, "textureSheetRow", warnings) {
                texture.map(|sheet| AnimationSpec::MultiFrame {
                    sheet,
                    row,
                    duration: attr_f32(node, "duration", warnings).unwrap_or(1.0),
                    scale: attr_f32(node, "scale", warnings).unwrap_or(1.0),
                })
            } else if let Some(dissolve_texture) = node.get("dissolveTexture") {
                texture.map(|texture| AnimationSpec::Dissolve {
                    texture,
                    dissolve_texture: dissolve_texture.to_string(),
                    speed: attr_f32(node, "dissolveSpeed", warnings).unwrap_or(1.0),
                })
            } else {
                texture.map(|texture| match AnimationSpec::expand_variable(&texture) {
                    Some(textures) => AnimationSpec::VariableTextured { textures },
                    None => AnimationSpec::SingleFrame { texture },
                })
            };
            if let Some(spec) = spec {
                def.animations.insert(state, Arc::new(spec));
            }
        })
        .on("GameAttributes", |node, def, warnings| {
            if let Some(name) = node.get("movementControllerPattern") {
                match MovementPattern::from_name(name) {
                    Some(pattern) => def.movement = pattern,
                    None => unknown_value(node, "movementControllerPattern", warnings),
                }
            }
            if let Some(v) = attr_f32(node, "health", warnings) {
                def.health = v;
            }
            if let Some(v) = attr_f32(node, "damage", warnings) {
                def.damage = v;
            }
            if let Some(v) = attr_f32(node, "shootingFrequency", warnings) {
                def.shooting_period_ms = (v > 0.0).then_some(v);
            }
            if let Some(projectile) = node.get("projectile") {
                def.projectile = Some(projectile.to_string());
            }
            if let Some(name) = node.get("flipped") {
                match FlipMode::from_name(name) {
                    Some(flip) => def.flip = flip,
                    None => unknown_value(node, "flipped", warnings),
                }
            }
        })
}

fn wave_block_handlers() -> NodeHandlers<WaveBlock> {
    NodeHandlers::<WaveBlock>::new()
        .on("WaveBlock", |node, block, warnings| {
            if let Some(v) = attr_i32(node, "difficulty", warnings) {
                block.difficulty = v;
            }
            if let Some(v) = attr_bool(node, "extensible", warnings) {
                block.extensible = v;
            }
            if let Some(v) = attr_bool(node, "inflexible", warnings) {
                block.inflexible = v;
            }
            block.boss_name = node.get("bossName").map(str::to_string);
            block.boss_health = attr_f32(node, "bossHealth", warnings);
        })
        .on("WaveBlockLine", |_, block, _| {
            block.lines.push(WaveBlockLine::default());
        })
        .on("Enemy", |node, block, warnings| {
            let Some(type_name) = node.get("type") else {
                warnings.push(CoreError::ContentParse {
                    tag: node.tag.clone(),
                    attribute: "type".into(),
                    value: String::new(),
                });
                return;
            };
            let position = attr_vec2(node, "position", warnings).unwrap_or_default();
            if block.lines.is_empty() {
                block.lines.push(WaveBlockLine::default());
            }
            if let Some(line) = block.lines.last_mut() {
                line.enemies.push(WaveBlockEnemy {
                    type_name: type_name.to_string(),
                    position,
                });
            }
        })
}

fn upgrade_handlers() -> NodeHandlers<UpgradeDefinition> {
    NodeHandlers::<UpgradeDefinition>::new().on("Upgrade", |node, upgrade, warnings| {
        upgrade.name = node.get("name").unwrap_or_default().to_string();
        upgrade.description = node.get("description").unwrap_or_default().to_string();
        upgrade.texture = node.get("texture").unwrap_or_default().to_string();
        upgrade.cost = attr_i32(node, "cost", warnings).unwrap_or(0).max(0) as u32;
        upgrade.intransient = attr_bool(node, "intransient", warnings).unwrap_or(false);
    })
}

fn gui_scene_handlers() -> NodeHandlers<GuiScene> {
    NodeHandlers::<GuiScene>::new().on("GUIElement", |node, scene, warnings| {
        let mut element = GuiElementDefinition {
            name: node.get("name").unwrap_or_default().to_string(),
            font_name: node.get("fontName").map(str::to_string),
            texture: node.get("texture").map(str::to_string),
            shader: node.get("shader").map(str::to_string),
            text: node.get("text").map(str::to_string),
            ..Default::default()
        };
        if let Some(v) = attr_vec3(node, "position", warnings) {
            element.position = v;
        }
        if let Some(v) = attr_vec2(node, "scale", warnings) {
            element.scale = v;
        }
        if let Some(v) = attr_bool(node, "invisible", warnings) {
            element.invisible = v;
        }
        scene.elements.push(element);
    })
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an object type and, transitively, everything it fires
    pub fn load_object_type(
        &mut self,
        storage: &dyn Storage,
        name: &str,
    ) -> Result<Arc<ObjectTypeDefinition>> {
        let mut chain = Vec::new();
        self.load_object_type_inner(storage, name, &mut chain)
    }

    fn load_object_type_inner(
        &mut self,
        storage: &dyn Storage,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<Arc<ObjectTypeDefinition>> {
        if let Some(def) = self.object_types.get(name) {
            return Ok(Arc::clone(def));
        }
        if chain.iter().any(|n| n == name) {
            log::warn!(
                "Projectile cycle through `{}` ({})",
                name,
                chain.join(" -> ")
            );
            return Err(CoreError::missing(DefinitionKind::ObjectType, name));
        }

        let json = storage
            .read(&object_type_path(name))?
            .ok_or_else(|| CoreError::missing(DefinitionKind::ObjectType, name))?;
        let root = Node::from_json(&json)?;

        let mut def = ObjectTypeDefinition::new(name);
        let mut warnings = Warnings::default();
        object_type_handlers().visit(&root, &mut def, &mut warnings);
        self.warnings.extend(warnings.items);

        if let Some(projectile) = def.projectile.clone() {
            chain.push(name.to_string());
            let loaded = self.load_object_type_inner(storage, &projectile, chain);
            chain.pop();
            if let Err(e) = loaded {
                log::warn!("Dropping object type `{}`: {}", name, e);
                if let CoreError::MissingDefinition { kind, name } = &e {
                    self.warnings.push(CoreError::missing(*kind, name.clone()));
                }
                return Err(e);
            }
        }

        log::debug!("Loaded object type `{}`", name);
        let def = Arc::new(def);
        self.object_types.insert(name.to_string(), Arc::clone(&def));
        Ok(def)
    }

    /// Load the upgrade catalog; returns the number of upgrades
    pub fn load_all_upgrades(&mut self, storage: &dyn Storage) -> Result<usize> {
        let json = storage
            .read(UPGRADES_FILE)?
            .ok_or_else(|| CoreError::missing(DefinitionKind::Upgrade, UPGRADES_FILE))?;
        let root = Node::from_json(&json)?;
        let handlers = upgrade_handlers();
        let mut warnings = Warnings::default();

        self.upgrades.clear();
        for node in root.children_named("Upgrade") {
            let mut upgrade = UpgradeDefinition::default();
            handlers.visit(node, &mut upgrade, &mut warnings);
            if upgrade.name.is_empty() {
                warnings.push(CoreError::ContentParse {
                    tag: node.tag.clone(),
                    attribute: "name".into(),
                    value: String::new(),
                });
                continue;
            }
            self.upgrades.push(upgrade);
        }
        self.warnings.extend(warnings.items);
        log::info!("Loaded {} upgrades", self.upgrades.len());
        Ok(self.upgrades.len())
    }

    /// Load every wave block, dropping blocks that reference unknown enemy types
    pub fn load_all_wave_blocks(&mut self, storage: &dyn Storage) -> Result<usize> {
        let json = storage
            .read(WAVE_BLOCKS_FILE)?
            .ok_or_else(|| CoreError::missing(DefinitionKind::WaveBlock, WAVE_BLOCKS_FILE))?;
        let root = Node::from_json(&json)?;
        let handlers = wave_block_handlers();
        let mut warnings = Warnings::default();

        self.wave_blocks.clear();
        'blocks: for node in root.children_named("WaveBlock") {
            let mut block = WaveBlock::default();
            handlers.visit(node, &mut block, &mut warnings);

            let mut type_names: Vec<String> =
                block.enemies().map(|e| e.type_name.clone()).collect();
            type_names.dedup();
            for type_name in type_names {
                match self.load_object_type(storage, &type_name) {
                    Ok(_) => {}
                    Err(e @ CoreError::MissingDefinition { .. }) => {
                        log::warn!("Dropping wave block (difficulty {}): {}", block.difficulty, e);
                        self.warnings.push(e);
                        continue 'blocks;
                    }
                    Err(e) => return Err(e),
                }
            }
            self.wave_blocks.push(block);
        }
        self.warnings.extend(warnings.items);
        log::info!("Loaded {} wave blocks", self.wave_blocks.len());
        Ok(self.wave_blocks.len())
    }

    pub fn load_gui_scene(&mut self, storage: &dyn Storage, name: &str) -> Result<GuiScene> {
        if let Some(scene) = self.gui_scenes.get(name) {
            return Ok(scene.clone());
        }
        let json = storage
            .read(&gui_scene_path(name))?
            .ok_or_else(|| CoreError::missing(DefinitionKind::GuiScene, name))?;
        let root = Node::from_json(&json)?;
        let mut scene = GuiScene {
            name: name.to_string(),
            elements: Vec::new(),
        };
        let mut warnings = Warnings::default();
        gui_scene_handlers().visit(&root, &mut scene, &mut warnings);
        self.warnings.extend(warnings.items);
        self.gui_scenes.insert(name.to_string(), scene.clone());
        Ok(scene)
    }

    pub fn load_level(&mut self, storage: &dyn Storage, path: &str) -> Result<Level> {
        let json = storage
            .read(path)?
            .ok_or_else(|| CoreError::missing(DefinitionKind::Level, path))?;
        let root = Node::from_json(&json)?;
        let mut warnings = Warnings::default();
        let level = Level::from_node(&root, &mut warnings);
        self.warnings.extend(warnings.items);
        Ok(level)
    }

    /// Load the player type, wave blocks, upgrades and the known GUI scenes.
    /// Missing optional documents are logged and skipped.
    pub fn load_all(storage: &dyn Storage, player_type: &str, gui_scenes: &[&str]) -> Result<Self> {
        let mut store = Self::new();
        store.load_object_type(storage, player_type)?;
        store.load_all_wave_blocks(storage)?;
        match store.load_all_upgrades(storage) {
            Ok(_) => {}
            Err(e @ CoreError::MissingDefinition { .. }) => log::warn!("{}", e),
            Err(e) => return Err(e),
        }
        for scene in gui_scenes {
            if let Err(e) = store.load_gui_scene(storage, scene) {
                log::info!("GUI scene `{}` not loaded: {}", scene, e);
            }
        }
        Ok(store)
    }

    pub fn object_type(&self, name: &str) -> Option<&Arc<ObjectTypeDefinition>> {
        self.object_types.get(name)
    }

    pub fn wave_blocks(&self) -> &[WaveBlock] {
        &self.wave_blocks
    }

    /// Upgrade catalog in document order
    pub fn upgrades(&self) -> &[UpgradeDefinition] {
        &self.upgrades
    }

    pub fn upgrade(&self, name: &str) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|u| u.name == name)
    }

    pub fn gui_scene(&self, name: &str) -> Option<&GuiScene> {
        self.gui_scenes.get(name)
    }

    pub fn warnings(&self) -> &[CoreError] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::testing::{content_storage, object_type_doc};

    #[test]
    fn test_object_type_loads_projectile_transitively() {
        let storage = content_storage();
        let mut store = DefinitionStore::new();
        let drone = store.load_object_type(&storage, "shooter").unwrap();
        assert_eq!(drone.projectile.as_deref(), Some("enemy_bullet"));
        assert_eq!(drone.movement, MovementPattern::ConstantVelocity);
        assert_eq!(drone.shooting_period_ms, Some(1000.0));
        let bullet = store.object_type("enemy_bullet").unwrap();
        assert_eq!(bullet.filter.category, category::ENEMY_BULLET);
        assert_eq!(bullet.constant_velocity, Some(glam::Vec2::new(0.0, -8.0)));
    }

    #[test]
    fn test_missing_projectile_drops_referring_type() {
        let storage = MemoryStorage::new().with_file(
            &object_type_path("gunner"),
            &object_type_doc("enemy", "constant_velocity", Some("ghost_bullet"))
                .to_json()
                .unwrap(),
        );
        let mut store = DefinitionStore::new();
        let err = store.load_object_type(&storage, "gunner").unwrap_err();
        assert!(matches!(
            err,
            CoreError::MissingDefinition { ref name, .. } if name == "ghost_bullet"
        ));
        assert!(store.object_type("gunner").is_none());
    }

    #[test]
    fn test_projectile_cycle_is_rejected() {
        let storage = MemoryStorage::new()
            .with_file(
                &object_type_path("a"),
                &object_type_doc("enemy", "constant_velocity", Some("b"))
                    .to_json()
                    .unwrap(),
            )
            .with_file(
                &object_type_path("b"),
                &object_type_doc("enemy_bullet", "constant_velocity", Some("a"))
                    .to_json()
                    .unwrap(),
            );
        let mut store = DefinitionStore::new();
        assert!(matches!(
            store.load_object_type(&storage, "a"),
            Err(CoreError::MissingDefinition { .. })
        ));
        assert!(store.object_type("a").is_none());
        assert!(store.object_type("b").is_none());
    }

    #[test]
    fn test_animation_variants() {
        let doc = Node::new("ObjectType")
            .child(Node::new("Animation").attr("state", "idle").attr("texture", "rock{1:4}"))
            .child(
                Node::new("Animation")
                    .attr("state", "moving")
                    .attr("texture", "ship_sheet")
                    .attr("textureSheetRow", 2)
                    .attr("duration", 0.5)
                    .attr("scale", 1.5),
            )
            .child(
                Node::new("Animation")
                    .attr("state", "dying")
                    .attr("texture", "ship")
                    .attr("dissolveTexture", "noise")
                    .attr("dissolveSpeed", 2.0),
            )
            .child(Node::new("Animation").attr("state", "hit").attr("texture", "ship_hit"));
        let storage =
            MemoryStorage::new().with_file(&object_type_path("rock"), &doc.to_json().unwrap());
        let mut store = DefinitionStore::new();
        let rock = store.load_object_type(&storage, "rock").unwrap();

        assert!(matches!(
            rock.animations["idle"].as_ref(),
            AnimationSpec::VariableTextured { textures } if textures.len() == 4
        ));
        assert_eq!(
            rock.animations["moving"].as_ref(),
            &AnimationSpec::MultiFrame {
                sheet: "ship_sheet".into(),
                row: 2,
                duration: 0.5,
                scale: 1.5
            }
        );
        assert!(matches!(
            rock.animations["dying"].as_ref(),
            AnimationSpec::Dissolve { speed, .. } if *speed == 2.0
        ));
        assert!(matches!(
            rock.animations["hit"].as_ref(),
            AnimationSpec::SingleFrame { .. }
        ));
    }

    #[test]
    fn test_unknown_tags_and_bad_values_are_tolerated() {
        let doc = Node::new("ObjectType")
            .child(Node::new("Sparkles").attr("amount", "lots"))
            .child(Node::new("Physics").attr("bodySize", "huge").attr("category", "martian"))
            .child(Node::new("GameAttributes").attr("health", 7));
        let storage =
            MemoryStorage::new().with_file(&object_type_path("odd"), &doc.to_json().unwrap());
        let mut store = DefinitionStore::new();
        let odd = store.load_object_type(&storage, "odd").unwrap();
        assert_eq!(odd.health, 7.0);
        assert_eq!(odd.body_size, 1.0);
        assert_eq!(store.warnings().len(), 2);
    }

    #[test]
    fn test_wave_blocks_load_and_drop_unknown_enemies() {
        let storage = content_storage();
        let mut store = DefinitionStore::new();
        let count = store.load_all_wave_blocks(&storage).unwrap();
        assert_eq!(count, store.wave_blocks().len());
        assert!(store.wave_blocks().iter().all(|b| {
            b.enemies().all(|e| store.object_type(&e.type_name).is_some())
        }));
        let boss = store.wave_blocks().iter().find(|b| b.is_boss()).unwrap();
        assert_eq!(boss.boss_name.as_deref(), Some("Ka'thun"));
        assert_eq!(boss.boss_health, Some(250.0));
        // The fixture's block made of "phantom" enemies is dropped
        assert!(store
            .warnings()
            .iter()
            .any(|w| matches!(w, CoreError::MissingDefinition { name, .. } if name == "phantom")));
    }

    #[test]
    fn test_upgrades_and_gui_scene() {
        let storage = content_storage();
        let mut store = DefinitionStore::new();
        store.load_all_upgrades(&storage).unwrap();
        assert!(store.upgrade("shield").is_some());
        assert!(store.upgrade("health_potion").unwrap().intransient);

        let scene = store.load_gui_scene(&storage, "pause_menu").unwrap();
        let button = scene
            .elements
            .iter()
            .find(|e| e.name == "continue_button")
            .unwrap();
        assert_eq!(button.scale, glam::Vec2::new(4.0, 1.5));
        assert!(store.gui_scene("pause_menu").is_some());
    }

    #[test]
    fn test_missing_level_is_missing_definition() {
        let mut store = DefinitionStore::new();
        assert!(matches!(
            store.load_level(&MemoryStorage::new(), "level_9_9.json"),
            Err(CoreError::MissingDefinition {
                kind: DefinitionKind::Level,
                ..
            })
        ));
    }
}
