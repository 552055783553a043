use glam::{Vec2, Vec3};

use super::{StateContext, UpdateDirective};
use crate::content::GuiElementDefinition;
use crate::error::Result;
use crate::sim::context::AvailableUpgrade;
use crate::sim::tween::{Easing, Tween};
use crate::sim::upgrades;

const OVERLAY: &str = "upgrade_overlay";
const OFFER_SIZE: usize = 2;
const CARD_SCALE: Vec2 = Vec2::new(4.0, 6.0);
const CARD_X: f32 = 2.5;
const CARD_OFFSCREEN_X: f32 = 20.0;
const CARD_Z: f32 = 0.8;

pub fn card_name(index: usize) -> String {
    format!("upgrade_card_{index}")
}

fn card_target(index: usize) -> Vec2 {
    Vec2::new(if index == 0 { -CARD_X } else { CARD_X }, 0.0)
}

fn card_offscreen(index: usize) -> Vec2 {
    Vec2::new(if index == 0 { -CARD_OFFSCREEN_X } else { CARD_OFFSCREEN_X }, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    #[default]
    OverlayIn,
    UpgradeSelection,
    ShineSelection,
    OverlayOut,
    Done,
}

/// Two cards drawn from the pool; the tapped one is equipped
#[derive(Debug, Default)]
pub struct UpgradeSelection {
    phase: SelectionPhase,
    phase_ms: f32,
    offer: Vec<AvailableUpgrade>,
    cards: Vec<Tween>,
    chosen: Option<usize>,
}

impl UpgradeSelection {
    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn offer(&self) -> &[AvailableUpgrade] {
        &self.offer
    }

    pub fn initialize(&mut self, cx: &mut StateContext) -> Result<()> {
        let world = &mut *cx.world;
        self.offer = upgrades::draw_offer(&mut world.game, OFFER_SIZE);
        if self.offer.is_empty() {
            self.phase = SelectionPhase::Done;
            return Ok(());
        }

        world.spawn_gui(&GuiElementDefinition {
            name: OVERLAY.into(),
            texture: Some("black".into()),
            position: Vec3::new(0.0, 0.0, 0.7),
            scale: Vec2::new(40.0, 80.0),
            ..Default::default()
        });
        if let Some(overlay) = world.scene.get_mut(OVERLAY) {
            overlay.set_float("alpha", 0.0);
        }

        let slide_ms = world.settings.card_slide_ms;
        for (i, upgrade) in self.offer.iter().enumerate() {
            let def = world.defs.upgrade(&upgrade.name).cloned().unwrap_or_default();
            world.spawn_gui(&GuiElementDefinition {
                name: card_name(i),
                texture: Some(def.texture),
                text: Some(def.description),
                position: card_offscreen(i).extend(CARD_Z),
                scale: CARD_SCALE,
                ..Default::default()
            });
            self.cards.push(Tween::new(
                card_offscreen(i),
                card_target(i),
                slide_ms,
                Easing::BounceIn,
            ));
        }
        log::info!(
            "Offering upgrades: {}",
            self.offer.iter().map(|u| u.name.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }

    pub fn update(&mut self, cx: &mut StateContext, dt_ms: f32) -> Result<UpdateDirective> {
        let settings = &*cx.world.settings;
        let (fade_ms, shine_ms, max_alpha) =
            (settings.overlay_fade_ms, settings.shine_ms, settings.overlay_max_alpha);
        self.phase_ms += dt_ms;

        match self.phase {
            SelectionPhase::OverlayIn => {
                self.set_overlay_alpha(cx, max_alpha * fraction(self.phase_ms, fade_ms));
                let slid = self.advance_cards(cx, dt_ms);
                if slid && self.phase_ms >= fade_ms {
                    self.enter(SelectionPhase::UpgradeSelection);
                }
            }
            SelectionPhase::UpgradeSelection => {
                if let Some(tap) = cx.world.input.tapped_at() {
                    cx.world.input.take();
                    let hit = (0..self.offer.len()).find(|&i| {
                        cx.world
                            .scene
                            .get(&card_name(i))
                            .is_some_and(|c| c.contains_point(tap))
                    });
                    if let Some(i) = hit {
                        self.choose(cx, i)?;
                        self.enter(SelectionPhase::ShineSelection);
                    }
                }
            }
            SelectionPhase::ShineSelection => {
                let t = fraction(self.phase_ms, shine_ms);
                let chosen = self.chosen.map(card_name).unwrap_or_default();
                if let Some(card) = cx.world.scene.get_mut(&chosen) {
                    card.set_float("shine", t);
                }
                if t >= 1.0 {
                    let slide_ms = cx.world.settings.card_slide_ms;
                    self.cards = self
                        .cards
                        .iter()
                        .enumerate()
                        .map(|(i, c)| {
                            Tween::new(c.value(), card_offscreen(i), slide_ms, Easing::BounceOut)
                        })
                        .collect();
                    self.enter(SelectionPhase::OverlayOut);
                }
            }
            SelectionPhase::OverlayOut => {
                self.set_overlay_alpha(cx, max_alpha * (1.0 - fraction(self.phase_ms, fade_ms)));
                let slid = self.advance_cards(cx, dt_ms);
                if slid && self.phase_ms >= fade_ms {
                    self.enter(SelectionPhase::Done);
                }
            }
            SelectionPhase::Done => {}
        }
        Ok(UpdateDirective::BlockUpdate)
    }

    fn enter(&mut self, phase: SelectionPhase) {
        log::debug!("Upgrade selection {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.phase_ms = 0.0;
    }

    /// Equip the tapped card and put the other back
    fn choose(&mut self, cx: &mut StateContext, index: usize) -> Result<()> {
        let world = &mut *cx.world;
        let mut chosen = None;
        for (i, upgrade) in self.offer.drain(..).enumerate() {
            if i == index {
                chosen = Some(upgrade);
            } else {
                upgrades::return_to_pool(&mut world.game, upgrade);
            }
        }
        self.chosen = Some(index);
        if let Some(upgrade) = chosen {
            upgrades::equip(&mut world.game, &world.defs, &world.settings, &upgrade.name)?;
            world.sync_player_health();
        }
        Ok(())
    }

    fn set_overlay_alpha(&self, cx: &mut StateContext, alpha: f32) {
        if let Some(overlay) = cx.world.scene.get_mut(OVERLAY) {
            overlay.set_float("alpha", alpha);
        }
    }

    /// Move cards along their tweens; true once all arrived
    fn advance_cards(&mut self, cx: &mut StateContext, dt_ms: f32) -> bool {
        for (i, tween) in self.cards.iter_mut().enumerate() {
            let p = tween.advance(dt_ms);
            if let Some(card) = cx.world.scene.get_mut(&card_name(i)) {
                card.position = p.extend(CARD_Z);
            }
        }
        self.cards.iter().all(Tween::is_finished)
    }

    pub fn destroy(&mut self, cx: &mut StateContext) -> Result<()> {
        let world = &mut *cx.world;
        for upgrade in self.offer.drain(..) {
            upgrades::return_to_pool(&mut world.game, upgrade);
        }
        world.scene.remove_all_with_name(OVERLAY, &mut world.physics);
        for i in 0..self.cards.len() {
            world.scene.remove_all_with_name(&card_name(i), &mut world.physics);
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SelectionPhase::Done
    }
}

fn fraction(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}
