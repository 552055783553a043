//! Combat simulation
//!
//! Everything that runs inside a level lives here: the physics bridge, the
//! scene registry, flows, the pushdown state machine and the level updater
//! that drives them once per frame. Randomness only comes from the run seed.

pub mod animation;
pub mod combat;
pub mod context;
pub mod flow;
pub mod generator;
pub mod physics;
pub mod scene;
pub mod states;
pub mod tween;
pub mod updater;
pub mod upgrades;
pub mod world;

pub use context::{AvailableUpgrade, EquippedUpgrade, GameContext, MapCoord, NodeType, PlayerStats};
pub use flow::{FlowScheduler, RepeatPolicy};
pub use generator::{LevelGenerator, difficulty_for, extend_for_difficulty, level_path, write_level};
pub use physics::{BodyHandle, BodyKind, CategoryPair, CollisionTable, PhysicsWorld};
pub use scene::{SceneObject, SceneObjectKind, SceneRegistry};
pub use states::{StateMachine, StateName, Transition, UpdateDirective};
pub use updater::{FrameOutcome, LevelUpdater, VirtualJoystick};
pub use world::CombatWorld;
