//! Contact resolution between combat categories

use super::physics::{BodyHandle, CollisionTable};
use super::world::{CombatWorld, PLAYER_OBJECT};
use crate::content::category::{BULLET_ONLY_WALL, ENEMY, ENEMY_BULLET, PLAYER, PLAYER_BULLET};

/// Callback table for every combat pair
pub fn combat_callbacks() -> CollisionTable<CombatWorld> {
    let mut table = CollisionTable::new();
    table.register(PLAYER_BULLET, ENEMY, bullet_hits_enemy);
    table.register(ENEMY_BULLET, PLAYER, bullet_hits_player);
    table.register(ENEMY, PLAYER, enemy_rams_player);
    table.register(PLAYER_BULLET, BULLET_ONLY_WALL, bullet_hits_wall);
    table.register(ENEMY_BULLET, BULLET_ONLY_WALL, bullet_hits_wall);
    table
}

/// Kill a live object and return its damage; dead or unknown objects yield None
fn consume(world: &mut CombatWorld, body: BodyHandle) -> Option<f32> {
    let object = world.scene.find_by_body_mut(&world.physics, body)?;
    if object.health <= 0.0 {
        return None;
    }
    object.health = 0.0;
    Some(object.damage)
}

fn bullet_hits_enemy(world: &mut CombatWorld, bullet: BodyHandle, enemy: BodyHandle) {
    let alive = world
        .scene
        .find_by_body(&world.physics, enemy)
        .is_some_and(|e| e.health > 0.0);
    if !alive {
        return;
    }
    let Some(damage) = consume(world, bullet) else {
        return;
    };
    if let Some(enemy) = world.scene.find_by_body_mut(&world.physics, enemy) {
        enemy.health -= damage;
        if enemy.health <= 0.0 {
            log::debug!("`{}` destroyed", enemy.name);
        }
    }
}

fn hurt_player(world: &mut CombatWorld, damage: f32) {
    let remaining = world.game.damage_player(damage);
    world.sync_player_health();
    log::debug!("Player hit for {}, {} health left", damage, remaining);
}

fn bullet_hits_player(world: &mut CombatWorld, bullet: BodyHandle, _player: BodyHandle) {
    if let Some(damage) = consume(world, bullet) {
        hurt_player(world, damage);
    }
}

fn enemy_rams_player(world: &mut CombatWorld, enemy: BodyHandle, _player: BodyHandle) {
    if let Some(damage) = consume(world, enemy) {
        hurt_player(world, damage);
    }
}

fn bullet_hits_wall(world: &mut CombatWorld, bullet: BodyHandle, _wall: BodyHandle) {
    consume(world, bullet);
}

/// Body of the player object, if spawned
pub fn player_body(world: &CombatWorld) -> Option<BodyHandle> {
    world.scene.get(PLAYER_OBJECT).and_then(|p| p.body)
}
