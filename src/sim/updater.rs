//! Level updater: the per-frame entry point of a running level
//!
//! Frame order: pause request, top state update, touch input, movement
//! controllers, animations, fixed physics sub-steps with their contact
//! callbacks, cleanup, flows, state transitions.

use glam::{Vec2, Vec3};

use super::combat::{combat_callbacks, player_body};
use super::flow::{FlowScheduler, RepeatPolicy};
use super::physics::{BodyDef, BodyKind, CollisionTable};
use super::scene::{SceneObject, SceneObjectKind};
use super::states::{StateContext, StateMachine, StateName, UpdateDirective};
use super::world::{CombatWorld, PLAYER_OBJECT};
use crate::content::{ContactFilter, MovementPattern, category};
use crate::error::Result;
use crate::platform::{TouchEvent, TouchKind};

pub const JOYSTICK_BOUNDS: &str = "joystick_bounds";
pub const JOYSTICK_INDICATOR: &str = "joystick_indicator";
const PLAYER_FIRE_FLOW: &str = "player_fire";
const WALL_THICKNESS: f32 = 1.0;

/// What the host should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Running,
    LevelCleared,
    PlayerDefeated,
}

/// On-screen stick: anchored on touch-down, deflected on motion, released on up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VirtualJoystick {
    origin: Option<Vec2>,
    /// Deflection with length at most 1
    direction: Vec2,
    radius: f32,
}

impl VirtualJoystick {
    pub fn new(radius: f32) -> Self {
        Self {
            origin: None,
            direction: Vec2::ZERO,
            radius: radius.max(f32::EPSILON),
        }
    }

    pub fn handle(&mut self, event: TouchEvent) {
        match event.kind {
            TouchKind::Down => {
                self.origin = Some(event.position);
                self.direction = Vec2::ZERO;
            }
            TouchKind::Motion => {
                if let Some(origin) = self.origin {
                    let offset = (event.position - origin) / self.radius;
                    self.direction = offset.clamp_length_max(1.0);
                }
            }
            TouchKind::Up => self.release(),
        }
    }

    pub fn release(&mut self) {
        self.origin = None;
        self.direction = Vec2::ZERO;
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn origin(&self) -> Option<Vec2> {
        self.origin
    }

    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Indicator position, always within `radius` of the origin
    pub fn indicator(&self) -> Option<Vec2> {
        self.origin.map(|o| o + self.direction * self.radius)
    }
}

pub struct LevelUpdater {
    pub world: CombatWorld,
    pub flows: FlowScheduler<CombatWorld>,
    collisions: CollisionTable<CombatWorld>,
    states: StateMachine,
    joystick: VirtualJoystick,
    accumulator_ms: f32,
}

impl LevelUpdater {
    /// Spawn the player, the arena walls and the joystick widgets
    pub fn new(mut world: CombatWorld) -> Result<Self> {
        let settings = world.settings.clone();
        let player_type = settings.player_type.clone();
        let health = world.game.player.current_health;
        world.spawn_named(&player_type, PLAYER_OBJECT.into(), settings.player_spawn, |o| {
            o.health = health;
        })?;

        let bounds = settings.world_bounds;
        let size = bounds.max - bounds.min;
        let center = (bounds.min + bounds.max) * 0.5;
        let t = WALL_THICKNESS;
        let tall = Vec2::new(t, size.y + 2.0 * t);
        let wide = Vec2::new(size.x + 2.0 * t, t);
        let edges = [
            ("left", Vec2::new(bounds.min.x - t * 0.5, center.y), tall),
            ("right", Vec2::new(bounds.max.x + t * 0.5, center.y), tall),
            ("bottom", Vec2::new(center.x, bounds.min.y - t * 0.5), wide),
            ("top", Vec2::new(center.x, bounds.max.y + t * 0.5), wide),
        ];
        for (edge, position, extent) in edges {
            let name = format!("player_wall_{edge}");
            spawn_wall(&mut world, &name, position, extent, category::PLAYER_ONLY_WALL);
            if edge == "top" || edge == "bottom" {
                let name = format!("bullet_wall_{edge}");
                spawn_wall(&mut world, &name, position, extent, category::BULLET_ONLY_WALL);
            }
        }

        for (name, scale) in [(JOYSTICK_BOUNDS, 2.0), (JOYSTICK_INDICATOR, 0.6)] {
            let mut widget = SceneObject::new(name, SceneObjectKind::Gui);
            widget.texture = Some(world.resources.load(name));
            widget.scale = Vec2::splat(settings.joystick_radius * scale);
            widget.invisible = true;
            world.scene.add(widget);
        }

        let mut flows = FlowScheduler::new();
        let period = world
            .defs
            .object_type(&player_type)
            .and_then(|d| d.shooting_period_ms);
        if let Some(period) = period {
            flows.add(PLAYER_FIRE_FLOW, period, RepeatPolicy::Repeat, |world: &mut CombatWorld, _| {
                world.spawn_projectile(PLAYER_OBJECT);
            });
        }

        Ok(Self {
            world,
            flows,
            collisions: combat_callbacks(),
            states: StateMachine::new(),
            joystick: VirtualJoystick::new(settings.joystick_radius),
            accumulator_ms: 0.0,
        })
    }

    /// Begin the level at its first wave intro
    pub fn start(&mut self) -> Result<()> {
        let mut cx = StateContext {
            world: &mut self.world,
            flows: &mut self.flows,
        };
        self.states.start(StateName::WaveIntro, &mut cx)
    }

    pub fn states(&self) -> &StateMachine {
        &self.states
    }

    pub fn joystick(&self) -> &VirtualJoystick {
        &self.joystick
    }

    /// Advance one frame of `dt` seconds
    pub fn update(&mut self, dt: f32) -> Result<FrameOutcome> {
        let dt = dt.clamp(0.0, self.world.settings.max_frame_dt);
        let dt_ms = dt * 1000.0;

        if self.world.input.pause_requested {
            self.world.input.pause_requested = false;
            if self.states.top().is_some_and(|s| s != StateName::PauseMenu) {
                let mut cx = StateContext {
                    world: &mut self.world,
                    flows: &mut self.flows,
                };
                self.states.push(StateName::PauseMenu, &mut cx)?;
            }
        }

        let directive = {
            let mut cx = StateContext {
                world: &mut self.world,
                flows: &mut self.flows,
            };
            self.states.update(&mut cx, dt_ms)?
        };

        if directive == UpdateDirective::Continue {
            if let Some(event) = self.world.input.take() {
                self.joystick.handle(event);
            }
            self.show_joystick();
            self.apply_movement(dt);
            self.advance_animations(dt);
            self.step_physics(dt_ms);
            self.world.cleanup();
            self.flows.tick(dt_ms, &mut self.world);
        } else if self.joystick.is_active() {
            // Overlays own the touch stream; a release they swallow must not
            // leave the stick held
            self.joystick.release();
            self.show_joystick();
        }
        self.world.input.take();

        let mut cx = StateContext {
            world: &mut self.world,
            flows: &mut self.flows,
        };
        self.states.apply_transitions(&mut cx)?;

        if cx.world.game.player_defeated {
            self.states.unwind(&mut cx)?;
            log::info!("Player defeated on wave {}", cx.world.game.current_wave + 1);
            return Ok(FrameOutcome::PlayerDefeated);
        }
        if self.states.is_empty() {
            return Ok(FrameOutcome::LevelCleared);
        }
        Ok(FrameOutcome::Running)
    }

    /// Fixed sub-steps; contacts are resolved after each one
    fn step_physics(&mut self, dt_ms: f32) {
        let step_ms = self.world.settings.physics_dt_ms();
        let step = self.world.settings.physics_dt;
        let max_substeps = self.world.settings.max_substeps;
        self.accumulator_ms += dt_ms;

        let mut substeps = 0;
        while self.accumulator_ms >= step_ms && substeps < max_substeps {
            let contacts = self.world.physics.step(step);
            for contact in &contacts {
                self.collisions.dispatch(&mut self.world, contact);
            }
            self.accumulator_ms -= step_ms;
            substeps += 1;
        }
        if substeps == max_substeps {
            // Drop backlog rather than spiral
            self.accumulator_ms = self.accumulator_ms.min(step_ms);
        }
    }

    /// Advance animation cursors and publish their progress to the shader
    fn advance_animations(&mut self, dt: f32) {
        for object in self.world.scene.iter_mut() {
            let Some(animation) = object.animation.as_mut() else {
                continue;
            };
            animation.update(dt);
            if let Some(uniform) = animation.uniform() {
                let progress = animation.progress();
                object.set_float(uniform, progress);
            }
        }
    }

    fn apply_movement(&mut self, dt: f32) {
        let world = &mut self.world;
        let player_pos = player_body(world).and_then(|b| world.physics.position(b));
        let stick = self.joystick.direction() * world.game.player.movement_speed;
        let sleep_distance = world.settings.chase_sleep_distance;

        for object in world.scene.iter() {
            let (Some(body), Some(family)) = (object.body, object.family.as_deref()) else {
                continue;
            };
            let Some(def) = world.defs.object_type(family) else {
                continue;
            };
            match def.movement {
                MovementPattern::ConstantVelocity => {
                    if let Some(v) = object.constant_velocity {
                        world.physics.set_linear_velocity(body, v);
                    }
                }
                MovementPattern::ChasingPlayer => {
                    let pos = world.physics.position(body);
                    let (Some(target), Some(pos)) = (player_pos, pos) else {
                        continue;
                    };
                    let to_player = target - pos;
                    if to_player.length() <= sleep_distance {
                        world.physics.set_awake(body, false);
                    } else {
                        world
                            .physics
                            .apply_force(body, to_player.normalize() * dt * def.speed);
                    }
                }
                MovementPattern::InputControlled => world.physics.set_linear_velocity(body, stick),
            }
        }
    }

    fn show_joystick(&mut self) {
        let origin = self.joystick.origin();
        let indicator = self.joystick.indicator();
        for (name, position) in [(JOYSTICK_BOUNDS, origin), (JOYSTICK_INDICATOR, indicator)] {
            if let Some(widget) = self.world.scene.get_mut(name) {
                widget.invisible = position.is_none();
                if let Some(p) = position {
                    widget.position = Vec3::new(p.x, p.y, 0.95);
                }
            }
        }
    }
}

fn spawn_wall(world: &mut CombatWorld, name: &str, position: Vec2, extent: Vec2, cat: u16) {
    let body = world.physics.create_body(BodyDef {
        kind: BodyKind::Static,
        position,
        half_extents: extent * 0.5,
        filter: ContactFilter::for_category(cat),
        user_data: name.to_string(),
        ..Default::default()
    });
    let mut wall = SceneObject::new(name, SceneObjectKind::World);
    wall.body = Some(body);
    wall.position = position.extend(0.0);
    wall.scale = extent;
    wall.invisible = true;
    wall.health = f32::INFINITY;
    world.scene.add(wall);
}
