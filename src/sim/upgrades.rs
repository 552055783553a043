//! Upgrade effects and the available-upgrade pool

use rand::Rng;

use super::context::{AvailableUpgrade, EquippedUpgrade, GameContext};
use crate::content::DefinitionStore;
use crate::error::{CoreError, DefinitionKind, Result};
use crate::settings::Settings;

/// Effect of an upgrade, keyed by catalog name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradeEffect {
    Shield,
    HealthPotion,
    MaxHealth,
    Attack,
    MovementSpeed,
    BulletSpeed,
    /// Catalog entry without gameplay effect
    Cosmetic,
}

pub const MAX_HEALTH_STEP: f32 = 2.0;
pub const ATTACK_MULTIPLIER: f32 = 1.25;
pub const SPEED_MULTIPLIER: f32 = 1.2;

impl UpgradeEffect {
    pub fn for_name(name: &str) -> Self {
        match name {
            "shield" => UpgradeEffect::Shield,
            "health_potion" => UpgradeEffect::HealthPotion,
            "max_health_up" => UpgradeEffect::MaxHealth,
            "attack_boost" => UpgradeEffect::Attack,
            "speed_boost" => UpgradeEffect::MovementSpeed,
            "bullet_speed_boost" => UpgradeEffect::BulletSpeed,
            _ => UpgradeEffect::Cosmetic,
        }
    }
}

/// Apply an upgrade's effect to the player and record it as equipped
pub fn equip(
    game: &mut GameContext,
    store: &DefinitionStore,
    settings: &Settings,
    name: &str,
) -> Result<()> {
    let def = store
        .upgrade(name)
        .ok_or_else(|| CoreError::missing(DefinitionKind::Upgrade, name))?;

    let player = &mut game.player;
    let mut shield_health = None;
    match UpgradeEffect::for_name(name) {
        UpgradeEffect::Shield => {
            player.shield_health += settings.shield_health_per_equip;
            shield_health = Some(settings.shield_health_per_equip);
        }
        UpgradeEffect::HealthPotion => player.current_health = player.max_health,
        UpgradeEffect::MaxHealth => {
            player.max_health += MAX_HEALTH_STEP;
            let healed = player.current_health + MAX_HEALTH_STEP;
            player.current_health = healed.min(player.max_health);
        }
        UpgradeEffect::Attack => player.attack *= ATTACK_MULTIPLIER,
        UpgradeEffect::MovementSpeed => player.movement_speed *= SPEED_MULTIPLIER,
        UpgradeEffect::BulletSpeed => player.bullet_speed *= SPEED_MULTIPLIER,
        UpgradeEffect::Cosmetic => log::warn!("Upgrade `{}` has no gameplay effect", name),
    }

    game.equipped.push(EquippedUpgrade {
        name: name.to_string(),
        shield_health,
    });
    if def.intransient {
        if !game.available.iter().any(|u| u.name == name) {
            game.available.push(AvailableUpgrade {
                name: name.to_string(),
                cost: def.cost,
            });
        }
    } else {
        game.available.retain(|u| u.name != name);
    }
    log::info!("Equipped upgrade `{}`", name);
    Ok(())
}

/// Take up to `count` distinct upgrades out of the pool, uniformly at random
pub fn draw_offer(game: &mut GameContext, count: usize) -> Vec<AvailableUpgrade> {
    let mut offer = Vec::with_capacity(count);
    for _ in 0..count {
        if game.available.is_empty() {
            break;
        }
        let i = game.rng.random_range(0..game.available.len());
        offer.push(game.available.remove(i));
    }
    offer
}

/// Put an offered upgrade back into the pool
pub fn return_to_pool(game: &mut GameContext, upgrade: AvailableUpgrade) {
    if !game.available.iter().any(|u| u.name == upgrade.name) {
        game.available.push(upgrade);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{loaded_store, test_settings};

    fn game_with_pool(store: &DefinitionStore) -> GameContext {
        let mut game = GameContext::new(42);
        game.player.max_health = 10.0;
        game.player.current_health = 4.0;
        game.player.attack = 2.0;
        game.player.movement_speed = 5.0;
        game.player.bullet_speed = 1.0;
        game.available = store
            .upgrades()
            .iter()
            .map(|u| AvailableUpgrade {
                name: u.name.clone(),
                cost: u.cost,
            })
            .collect();
        game
    }

    #[test]
    fn test_shield_records_aux_health() {
        let store = loaded_store();
        let settings = test_settings();
        let mut game = game_with_pool(&store);
        equip(&mut game, &store, &settings, "shield").unwrap();
        assert_eq!(game.player.shield_health, settings.shield_health_per_equip);
        assert_eq!(
            game.equipped[0].shield_health,
            Some(settings.shield_health_per_equip)
        );
        assert!(!game.available.iter().any(|u| u.name == "shield"));
    }

    #[test]
    fn test_intransient_stays_available() {
        let store = loaded_store();
        let mut game = game_with_pool(&store);
        let before = game.available.len();
        equip(&mut game, &store, &test_settings(), "health_potion").unwrap();
        assert_eq!(game.player.current_health, 10.0);
        assert_eq!(game.available.len(), before);
    }

    #[test]
    fn test_stat_upgrades() {
        let store = loaded_store();
        let settings = test_settings();
        let mut game = game_with_pool(&store);
        equip(&mut game, &store, &settings, "attack_boost").unwrap();
        equip(&mut game, &store, &settings, "speed_boost").unwrap();
        equip(&mut game, &store, &settings, "bullet_speed_boost").unwrap();
        equip(&mut game, &store, &settings, "max_health_up").unwrap();
        assert_eq!(game.player.attack, 2.5);
        assert!((game.player.movement_speed - 6.0).abs() < 1e-5);
        assert!((game.player.bullet_speed - 1.2).abs() < 1e-6);
        assert_eq!(game.player.max_health, 12.0);
        assert_eq!(game.player.current_health, 6.0);
        assert_eq!(game.equipped.len(), 4);
    }

    #[test]
    fn test_unknown_upgrade_is_missing_definition() {
        let store = loaded_store();
        let mut game = game_with_pool(&store);
        assert!(matches!(
            equip(&mut game, &store, &test_settings(), "laser_eyes"),
            Err(CoreError::MissingDefinition { .. })
        ));
        assert!(game.equipped.is_empty());
    }

    #[test]
    fn test_draw_offer_is_without_replacement() {
        let store = loaded_store();
        let mut game = game_with_pool(&store);
        let total = game.available.len();
        let offer = draw_offer(&mut game, 2);
        assert_eq!(offer.len(), 2);
        assert_ne!(offer[0].name, offer[1].name);
        assert_eq!(game.available.len(), total - 2);
        for u in offer {
            return_to_pool(&mut game, u);
        }
        assert_eq!(game.available.len(), total);
    }
}
