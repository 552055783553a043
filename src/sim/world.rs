//! Combat world: everything a running level mutates
//!
//! Flows, collision callbacks and states all receive `&mut CombatWorld`, so the
//! physics world, scene registry and run state are borrowed together in one
//! place.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use super::animation::Animation;
use super::context::GameContext;
use super::physics::{BodyDef, BodyKind, PhysicsWorld};
use super::scene::{SceneObject, SceneObjectKind, SceneRegistry, UniformValue};
use crate::content::{
    DEFAULT_ANIMATION_STATE, DefinitionStore, GuiElementDefinition, ObjectTypeDefinition,
    category,
};
use crate::error::{CoreError, DefinitionKind, Result};
use crate::platform::{InputContext, ResourceLoader};
use crate::settings::Settings;

/// Scene name of the player object
pub const PLAYER_OBJECT: &str = "player";
/// Flow name prefix for shooting cadences
pub const FIRE_FLOW_PREFIX: &str = "fire:";

pub fn fire_flow_name(shooter: &str) -> String {
    format!("{FIRE_FLOW_PREFIX}{shooter}")
}

pub struct CombatWorld {
    pub physics: PhysicsWorld,
    pub scene: SceneRegistry,
    pub defs: Arc<DefinitionStore>,
    pub game: GameContext,
    pub input: InputContext,
    pub resources: Box<dyn ResourceLoader>,
    pub settings: Arc<Settings>,
    next_id: u64,
}

impl CombatWorld {
    pub fn new(
        defs: Arc<DefinitionStore>,
        game: GameContext,
        resources: Box<dyn ResourceLoader>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            physics: PhysicsWorld::new(),
            scene: SceneRegistry::new(),
            defs,
            game,
            input: InputContext::new(),
            resources,
            settings,
            next_id: 0,
        }
    }

    /// Unique scene name with a readable prefix
    pub fn next_name(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    /// Spawn an object from its type definition under a generated name
    pub fn spawn_object(&mut self, type_name: &str, position: Vec2) -> Result<String> {
        let name = self.next_name(type_name);
        self.spawn_named(type_name, name.clone(), position, |_| {})?;
        Ok(name)
    }

    /// Create body and scene object for `type_name`; `configure` runs before the
    /// object is registered
    pub fn spawn_named(
        &mut self,
        type_name: &str,
        name: String,
        position: Vec2,
        configure: impl FnOnce(&mut SceneObject),
    ) -> Result<()> {
        let def = self
            .defs
            .object_type(type_name)
            .cloned()
            .ok_or_else(|| CoreError::missing(DefinitionKind::ObjectType, type_name))?;
        let object = self.build_object(&def, name, position, configure);
        self.scene.add(object);
        Ok(())
    }

    fn build_object(
        &mut self,
        def: &ObjectTypeDefinition,
        name: String,
        position: Vec2,
        configure: impl FnOnce(&mut SceneObject),
    ) -> SceneObject {
        let mut object = SceneObject::new(name, SceneObjectKind::World);
        object.family = Some(def.name.clone());
        object.health = def.health;
        object.damage = def.damage;
        object.constant_velocity = def.constant_velocity;

        let mut aspect = 1.0;
        if let Some(spec) = def.animation(DEFAULT_ANIMATION_STATE) {
            let animation = Animation::new(Arc::clone(spec), &mut self.game.rng);
            let texture = self.resources.load(animation.texture());
            aspect = self.resources.aspect_ratio(texture);
            object.texture = Some(texture);
            object.animation = Some(animation);
        }
        if !aspect.is_finite() || aspect <= 0.0 {
            aspect = 1.0;
        }
        object.scale = Vec2::new(def.body_size * aspect, def.body_size);
        object.position = position.extend(0.0);
        object.set_int("flipX", def.flip.flips_x() as i32);
        object.set_int("flipY", def.flip.flips_y() as i32);
        configure(&mut object);

        let body = self.physics.create_body(BodyDef {
            kind: BodyKind::Dynamic,
            position,
            half_extents: object.scale * 0.5,
            filter: def.filter,
            density: def.density,
            linear_damping: def.linear_damping,
            velocity: object.constant_velocity.unwrap_or(Vec2::ZERO),
            user_data: object.name.clone(),
        });
        object.body = Some(body);
        object
    }

    /// Fire `owner`'s projectile from its world center. Player shots are scaled
    /// by bullet speed and carry the player's attack. A projectile type that is
    /// no longer loaded skips the shot.
    pub fn spawn_projectile(&mut self, owner: &str) -> Option<String> {
        let shooter = self.scene.get(owner)?;
        if shooter.health <= 0.0 {
            return None;
        }
        let origin = shooter.world_position(&self.physics);
        let owner_def = self.defs.object_type(shooter.family.as_deref()?)?.clone();
        let projectile = owner_def.projectile.as_deref()?;
        let Some(def) = self.defs.object_type(projectile).cloned() else {
            log::debug!("Projectile `{}` of `{}` not loaded, skipping shot", projectile, owner);
            return None;
        };

        let (speed_scale, damage) = if owner_def.filter.category == category::PLAYER {
            (self.game.player.bullet_speed, self.game.player.attack)
        } else {
            (1.0, def.damage)
        };
        let velocity = def.constant_velocity.unwrap_or(Vec2::ZERO) * speed_scale;

        let name = self.next_name(projectile);
        let object = self.build_object(&def, name.clone(), origin, |o| {
            o.constant_velocity = Some(velocity);
            o.damage = damage;
            o.wave_owned = true;
        });
        self.scene.add(object);
        Some(name)
    }

    /// GUI object from a scene element definition
    pub fn spawn_gui(&mut self, element: &GuiElementDefinition) -> String {
        let mut object = SceneObject::new(element.name.clone(), SceneObjectKind::Gui);
        object.position = element.position;
        object.scale = element.scale;
        object.text = element.text.clone();
        object.invisible = element.invisible;
        object.texture = element.texture.as_deref().map(|t| self.resources.load(t));
        object.font = element.font_name.as_deref().map(|f| self.resources.load(f));
        if let Some(shader) = element.shader.as_deref() {
            let id = self.resources.load(shader);
            object.uniforms.insert("shader".into(), UniformValue::Texture(id));
        }
        self.scene.add(object);
        element.name.clone()
    }

    /// Text-only GUI object
    pub fn spawn_text(&mut self, name: &str, text: &str, position: Vec3) {
        let mut object = SceneObject::new(name, SceneObjectKind::Gui);
        object.text = Some(text.to_string());
        object.position = position;
        object.set_float("alpha", 0.0);
        self.scene.add(object);
    }

    /// Wave enemies that are still alive
    pub fn live_wave_enemies(&self) -> usize {
        self.scene
            .iter()
            .filter(|o| o.wave_enemy && o.health > 0.0)
            .count()
    }

    /// Copy the run's player health onto the player object
    pub fn sync_player_health(&mut self) {
        let health = self.game.player.current_health;
        if let Some(player) = self.scene.get_mut(PLAYER_OBJECT) {
            player.health = health;
        }
    }

    /// Remove spawned objects that died or left the world after entering it.
    /// The player is never removed here.
    pub fn cleanup(&mut self) -> usize {
        let bounds = self.settings.world_bounds;
        for object in self.scene.iter_mut() {
            let inside = object
                .body
                .and_then(|b| self.physics.position(b))
                .is_some_and(|p| bounds.contains(p));
            if inside {
                object.entered_bounds = true;
            }
        }

        let physics = &self.physics;
        let outside = |o: &SceneObject| {
            o.entered_bounds && !bounds.contains(o.world_position(physics))
        };
        let doomed: Vec<bool> = self
            .scene
            .iter()
            .map(|o| {
                o.family.is_some() && o.name != PLAYER_OBJECT && (o.health <= 0.0 || outside(o))
            })
            .collect();

        let mut doomed = doomed.into_iter();
        let removed = self
            .scene
            .remove_where(&mut self.physics, |_| doomed.next().unwrap_or(false));
        if removed > 0 {
            log::trace!("Removed {} scene objects", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_world;

    #[test]
    fn test_spawn_sizes_body_to_texture_aspect() {
        let mut world = test_world();
        let name = world.spawn_object("kathun", Vec2::new(0.0, 5.0)).unwrap();
        let object = world.scene.get(&name).unwrap();
        assert_eq!(object.scale, Vec2::new(6.0, 3.0));
        assert_eq!(object.health, 100.0);
        let body = world.physics.body(object.body.unwrap()).unwrap();
        assert_eq!(body.half_extents, Vec2::new(3.0, 1.5));
        assert_eq!(body.user_data, name);
        world.scene.verify(&world.physics).unwrap();
    }

    #[test]
    fn test_missing_type_is_reported() {
        let mut world = test_world();
        assert!(matches!(
            world.spawn_object("phantom", Vec2::ZERO),
            Err(CoreError::MissingDefinition { .. })
        ));
        assert_eq!(world.physics.body_count(), 0);
    }

    #[test]
    fn test_player_projectile_uses_stats() {
        let mut world = test_world();
        world.game.player.bullet_speed = 1.5;
        world.game.player.attack = 4.0;
        world
            .spawn_named("player", PLAYER_OBJECT.into(), Vec2::new(1.0, -6.0), |_| {})
            .unwrap();
        let bullet = world.spawn_projectile(PLAYER_OBJECT).unwrap();
        let bullet = world.scene.get(&bullet).unwrap();
        assert_eq!(bullet.constant_velocity, Some(Vec2::new(0.0, 18.0)));
        assert_eq!(bullet.damage, 4.0);
        assert!(bullet.wave_owned);
        assert_eq!(bullet.world_position(&world.physics), Vec2::new(1.0, -6.0));
    }

    #[test]
    fn test_enemy_projectile_from_center() {
        let mut world = test_world();
        let shooter = world.spawn_object("shooter", Vec2::new(2.0, 8.0)).unwrap();
        let bullet = world.spawn_projectile(&shooter).unwrap();
        let bullet = world.scene.get(&bullet).unwrap();
        assert_eq!(bullet.family.as_deref(), Some("enemy_bullet"));
        assert_eq!(bullet.constant_velocity, Some(Vec2::new(0.0, -8.0)));
        assert_eq!(bullet.world_position(&world.physics), Vec2::new(2.0, 8.0));
    }

    #[test]
    fn test_shooter_without_projectile_does_nothing() {
        let mut world = test_world();
        let drone = world.spawn_object("drone", Vec2::ZERO).unwrap();
        assert!(world.spawn_projectile(&drone).is_none());
        assert!(world.spawn_projectile("nobody").is_none());
    }

    #[test]
    fn test_cleanup_removes_dead_and_escaped() {
        let mut world = test_world();
        let dead = world.spawn_object("drone", Vec2::ZERO).unwrap();
        let escaped = world.spawn_object("drone", Vec2::new(0.0, 1.0)).unwrap();
        let waiting = world.spawn_object("drone", Vec2::new(0.0, 100.0)).unwrap();
        world.scene.get_mut(&dead).unwrap().health = 0.0;
        world.cleanup();
        assert!(world.scene.get(&dead).is_none());

        let body = world.scene.get(&escaped).unwrap().body.unwrap();
        world.physics.body_mut(body).unwrap().position = Vec2::new(0.0, -50.0);
        world.cleanup();
        assert!(world.scene.get(&escaped).is_none());
        assert!(world.scene.get(&waiting).is_some());
        world.scene.verify(&world.physics).unwrap();
    }

    #[test]
    fn test_live_wave_enemies_counts_alive_only() {
        let mut world = test_world();
        for x in 0..3 {
            world
                .spawn_named("drone", format!("e{x}"), Vec2::new(x as f32, 0.0), |o| {
                    o.wave_enemy = true
                })
                .unwrap();
        }
        world.scene.get_mut("e1").unwrap().health = -1.0;
        assert_eq!(world.live_wave_enemies(), 2);
    }
}
