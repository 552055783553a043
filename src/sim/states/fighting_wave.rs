use super::{StateContext, StateName, Transition};
use crate::error::Result;
use crate::sim::flow::RepeatPolicy;
use crate::sim::world::{FIRE_FLOW_PREFIX, fire_flow_name};

/// Spawns the current wave and waits for it to be cleared
#[derive(Debug, Default)]
pub struct FightingWave {
    spawned: usize,
}

impl FightingWave {
    pub fn initialize(&mut self, cx: &mut StateContext) -> Result<()> {
        let Some(wave) = cx.world.game.current_wave().cloned() else {
            log::warn!("FightingWave entered without a wave");
            return Ok(());
        };
        let boss_health = wave.boss.as_ref().map(|b| b.health).filter(|h| *h > 0.0);

        for enemy in &wave.enemies {
            let Some(def) = cx.world.defs.object_type(&enemy.type_name).cloned() else {
                log::debug!("Enemy type `{}` not loaded, skipping spawn", enemy.type_name);
                continue;
            };
            let name = cx.world.next_name(&enemy.type_name);
            let health = match boss_health {
                Some(h) if def.boss => h,
                _ => def.health,
            };
            cx.world
                .spawn_named(&enemy.type_name, name.clone(), enemy.position, |o| {
                    o.wave_enemy = true;
                    o.wave_owned = true;
                    o.health = health;
                })?;
            self.spawned += 1;

            if let (Some(_), Some(period)) = (&def.projectile, def.shooting_period_ms) {
                let flow = fire_flow_name(&name);
                cx.flows
                    .add(flow.clone(), period, RepeatPolicy::Repeat, move |world, cmds| {
                        let fired = world.spawn_projectile(&name).is_some();
                        if !fired && world.scene.get(&name).is_none() {
                            cmds.remove(flow.clone());
                        }
                    });
            }
        }
        log::info!(
            "Wave {}/{}: {} enemies{}",
            cx.world.game.current_wave + 1,
            cx.world.game.level.waves.len(),
            self.spawned,
            if wave.boss.is_some() { " (boss)" } else { "" }
        );
        Ok(())
    }

    /// Tear down everything the wave created
    pub fn destroy(&mut self, cx: &mut StateContext) -> Result<()> {
        let world = &mut *cx.world;
        cx.flows.remove_prefixed(FIRE_FLOW_PREFIX);
        let removed = world.scene.remove_where(&mut world.physics, |o| o.wave_owned);
        log::debug!("Wave teardown removed {} objects", removed);

        let game = &mut world.game;
        game.current_wave += 1;
        if !game.player_defeated && game.current_wave >= game.level.waves.len() {
            game.level_cleared = true;
        }
        world.scene.verify(&world.physics)
    }

    pub fn is_complete(&self, cx: &StateContext) -> bool {
        cx.world.game.player_defeated || cx.world.live_wave_enemies() == 0
    }

    pub fn next_state(&self, cx: &StateContext) -> Transition {
        let game = &cx.world.game;
        if game.player_defeated || game.is_last_wave() {
            Transition::Pop
        } else if game.available.len() > 1 {
            Transition::To(StateName::UpgradeSelection)
        } else {
            Transition::To(StateName::WaveIntro)
        }
    }
}
