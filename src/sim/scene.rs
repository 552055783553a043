//! Scene registry: named scene objects and their per-object render state
//!
//! The registry is the single owner of scene objects. Removing an object also
//! destroys its physics body.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::animation::Animation;
use super::physics::{BodyHandle, PhysicsWorld};
use crate::error::{CoreError, Result};
use crate::platform::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneObjectKind {
    #[default]
    World,
    Gui,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Texture(ResourceId),
}

/// Drawable + optional physical body, keyed by name tag
#[derive(Debug, Clone, Default)]
pub struct SceneObject {
    pub name: String,
    /// Object-type name this object was spawned from
    pub family: Option<String>,
    pub body: Option<BodyHandle>,
    pub animation: Option<Animation>,
    pub texture: Option<ResourceId>,
    /// Visual transform, used when there is no body
    pub position: Vec3,
    pub scale: Vec2,
    pub rotation: f32,
    pub uniforms: HashMap<String, UniformValue>,
    pub text: Option<String>,
    pub font: Option<ResourceId>,
    pub invisible: bool,
    pub health: f32,
    /// Contact damage for enemies, hit damage for projectiles
    pub damage: f32,
    /// Velocity the constant-velocity controller holds the body at
    pub constant_velocity: Option<Vec2>,
    pub kind: SceneObjectKind,
    /// Counts toward the live enemies of the current wave
    pub wave_enemy: bool,
    /// Destroyed when the wave that spawned it ends
    pub wave_owned: bool,
    /// Has been inside the world bounds at least once
    pub entered_bounds: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: SceneObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            scale: Vec2::ONE,
            health: 1.0,
            ..Default::default()
        }
    }

    pub fn set_float(&mut self, key: &str, value: f32) {
        self.uniforms
            .insert(key.to_string(), UniformValue::Float(value));
    }

    pub fn set_int(&mut self, key: &str, value: i32) {
        self.uniforms.insert(key.to_string(), UniformValue::Int(value));
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        match self.uniforms.get(key) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Screen-space hit test for GUI objects (position is the center)
    pub fn contains_point(&self, p: Vec2) -> bool {
        let half = self.scale.abs() * 0.5;
        let d = (p - self.position.truncate()).abs();
        d.x <= half.x && d.y <= half.y
    }

    /// Body position when present, visual position otherwise
    pub fn world_position(&self, physics: &PhysicsWorld) -> Vec2 {
        self.body
            .and_then(|b| physics.position(b))
            .unwrap_or_else(|| self.position.truncate())
    }
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    objects: Vec<SceneObject>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Any object with this name
    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Resolve a body back to its owner through the body's user data
    pub fn find_by_body(&self, physics: &PhysicsWorld, body: BodyHandle) -> Option<&SceneObject> {
        let tag = &physics.body(body)?.user_data;
        self.objects
            .iter()
            .find(|o| o.body == Some(body) && &o.name == tag)
    }

    pub fn find_by_body_mut(
        &mut self,
        physics: &PhysicsWorld,
        body: BodyHandle,
    ) -> Option<&mut SceneObject> {
        let tag = physics.body(body)?.user_data.clone();
        self.objects
            .iter_mut()
            .find(|o| o.body == Some(body) && o.name == tag)
    }

    /// Remove every object with this name, destroying their bodies
    pub fn remove_all_with_name(&mut self, name: &str, physics: &mut PhysicsWorld) -> usize {
        self.remove_where(physics, |o| o.name == name)
    }

    pub fn remove_where(
        &mut self,
        physics: &mut PhysicsWorld,
        mut predicate: impl FnMut(&SceneObject) -> bool,
    ) -> usize {
        let mut removed = 0;
        self.objects.retain(|o| {
            if predicate(o) {
                if let Some(body) = o.body {
                    physics.destroy_body(body);
                }
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Every body belongs to exactly one object whose name matches its user data
    pub fn verify(&self, physics: &PhysicsWorld) -> Result<()> {
        let mut owned = 0;
        for object in &self.objects {
            let Some(handle) = object.body else { continue };
            let body = physics.body(handle).ok_or_else(|| {
                CoreError::InvariantViolation(format!(
                    "scene object `{}` holds a destroyed body",
                    object.name
                ))
            })?;
            if body.user_data != object.name {
                return Err(CoreError::InvariantViolation(format!(
                    "body user data `{}` does not match scene object `{}`",
                    body.user_data, object.name
                )));
            }
            owned += 1;
        }
        let total = physics.body_count();
        if owned != total {
            return Err(CoreError::InvariantViolation(format!(
                "{} physics bodies without an owning scene object",
                total.saturating_sub(owned)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::BodyDef;

    fn with_body(name: &str, physics: &mut PhysicsWorld) -> SceneObject {
        let body = physics.create_body(BodyDef {
            user_data: name.to_string(),
            ..Default::default()
        });
        SceneObject {
            body: Some(body),
            ..SceneObject::new(name, SceneObjectKind::World)
        }
    }

    #[test]
    fn test_remove_all_with_name_destroys_bodies() {
        let mut physics = PhysicsWorld::new();
        let mut scene = SceneRegistry::new();
        scene.add(with_body("bullet", &mut physics));
        scene.add(with_body("bullet", &mut physics));
        scene.add(with_body("enemy_0", &mut physics));
        assert!(scene.get("bullet").is_some());

        assert_eq!(scene.remove_all_with_name("bullet", &mut physics), 2);
        assert!(scene.get("bullet").is_none());
        assert_eq!(physics.body_count(), 1);
        scene.verify(&physics).unwrap();
    }

    #[test]
    fn test_find_by_body_uses_user_data() {
        let mut physics = PhysicsWorld::new();
        let mut scene = SceneRegistry::new();
        let obj = with_body("enemy_7", &mut physics);
        let handle = obj.body.unwrap();
        scene.add(obj);
        assert_eq!(scene.find_by_body(&physics, handle).unwrap().name, "enemy_7");
    }

    #[test]
    fn test_verify_detects_orphan_body() {
        let mut physics = PhysicsWorld::new();
        let scene = SceneRegistry::new();
        physics.create_body(BodyDef::default());
        assert!(matches!(
            scene.verify(&physics),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_verify_detects_mismatched_user_data() {
        let mut physics = PhysicsWorld::new();
        let mut scene = SceneRegistry::new();
        let mut obj = with_body("a", &mut physics);
        obj.name = "b".into();
        scene.add(obj);
        assert!(scene.verify(&physics).is_err());
    }

    #[test]
    fn test_gui_hit_test() {
        let mut button = SceneObject::new("continue_button", SceneObjectKind::Gui);
        button.scale = Vec2::new(4.0, 1.5);
        assert!(button.contains_point(Vec2::new(1.9, 0.7)));
        assert!(!button.contains_point(Vec2::new(2.1, 0.0)));
    }
}
