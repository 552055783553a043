use std::f32::consts::PI;

use glam::Vec3;

use super::{StateContext, StateName, Transition, UpdateDirective};
use crate::error::Result;
use crate::sim::flow::RepeatPolicy;

pub const WAVE_INTRO_TEXT: &str = "wave_intro_text";
pub const WAVE_INTRO_FLOW: &str = "wave_intro";
const TEXT_POSITION: Vec3 = Vec3::new(0.0, 4.0, 0.9);

/// "WAVE N" banner faded in and out before a fight
#[derive(Debug, Default)]
pub struct WaveIntro {
    /// Nothing left to fight
    no_wave: bool,
}

impl WaveIntro {
    pub fn initialize(&mut self, cx: &mut StateContext) -> Result<()> {
        let game = &mut cx.world.game;
        if game.current_wave().is_none() {
            log::info!("No wave {} in level, level cleared", game.current_wave + 1);
            game.level_cleared = true;
            self.no_wave = true;
            return Ok(());
        }

        let label = format!("WAVE {}", game.current_wave + 1);
        cx.world.spawn_text(WAVE_INTRO_TEXT, &label, TEXT_POSITION);
        cx.flows.add(
            WAVE_INTRO_FLOW,
            cx.world.settings.wave_intro_duration_ms,
            RepeatPolicy::Once,
            |world, _| {
                if let Some(text) = world.scene.get_mut(WAVE_INTRO_TEXT) {
                    text.invisible = true;
                }
            },
        );
        log::info!("{}", label);
        Ok(())
    }

    /// Alpha follows a half sine over the intro flow
    pub fn update(&mut self, cx: &mut StateContext, _dt_ms: f32) -> Result<UpdateDirective> {
        let duration = cx.world.settings.wave_intro_duration_ms;
        if let Some(left) = cx.flows.time_left(WAVE_INTRO_FLOW) {
            let t = if duration > 0.0 {
                (1.0 - left / duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            if let Some(text) = cx.world.scene.get_mut(WAVE_INTRO_TEXT) {
                text.set_float("alpha", (t * PI).sin());
            }
        }
        Ok(UpdateDirective::Continue)
    }

    pub fn destroy(&mut self, cx: &mut StateContext) -> Result<()> {
        cx.flows.remove(WAVE_INTRO_FLOW);
        cx.world
            .scene
            .remove_all_with_name(WAVE_INTRO_TEXT, &mut cx.world.physics);
        Ok(())
    }

    pub fn is_complete(&self, cx: &StateContext) -> bool {
        self.no_wave || !cx.flows.contains(WAVE_INTRO_FLOW)
    }

    pub fn next_state(&self, _cx: &StateContext) -> Transition {
        if self.no_wave {
            Transition::Pop
        } else {
            Transition::To(StateName::FightingWave)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Level, LevelWave};
    use crate::sim::flow::FlowScheduler;
    use crate::testing::test_world;

    #[test]
    fn test_intro_fades_then_hands_over() {
        let mut world = test_world();
        world.game.start_level(Level {
            waves: vec![LevelWave::default(), LevelWave::default()],
        });
        world.game.current_wave = 1;
        let mut flows = FlowScheduler::new();
        let mut intro = WaveIntro::default();
        let mut cx = StateContext {
            world: &mut world,
            flows: &mut flows,
        };
        intro.initialize(&mut cx).unwrap();
        assert_eq!(
            cx.world.scene.get(WAVE_INTRO_TEXT).unwrap().text.as_deref(),
            Some("WAVE 2")
        );

        cx.flows.tick(1000.0, cx.world);
        intro.update(&mut cx, 1000.0).unwrap();
        let alpha = cx.world.scene.get(WAVE_INTRO_TEXT).unwrap().float("alpha").unwrap();
        assert!((alpha - 1.0).abs() < 1e-4);
        assert!(!intro.is_complete(&cx));

        cx.flows.tick(1000.0, cx.world);
        assert!(intro.is_complete(&cx));
        assert_eq!(intro.next_state(&cx), Transition::To(StateName::FightingWave));
        intro.destroy(&mut cx).unwrap();
        assert!(cx.world.scene.get(WAVE_INTRO_TEXT).is_none());
    }

    #[test]
    fn test_empty_level_pops_immediately() {
        let mut world = test_world();
        world.game.start_level(Level::default());
        let mut flows = FlowScheduler::new();
        let mut intro = WaveIntro::default();
        let mut cx = StateContext {
            world: &mut world,
            flows: &mut flows,
        };
        intro.initialize(&mut cx).unwrap();
        assert!(intro.is_complete(&cx));
        assert_eq!(intro.next_state(&cx), Transition::Pop);
        assert!(cx.world.game.level_cleared);
    }
}
