//! Pushdown game-state machine
//!
//! Only the top state is updated. A completed state is destroyed and either
//! popped (resuming the state below as-is) or replaced by the named next state.
//! Overlays such as the pause menu are pushed on top of a running state.

mod fighting_wave;
mod pause_menu;
mod upgrade_selection;
mod wave_intro;

pub use fighting_wave::FightingWave;
pub use pause_menu::{CONTINUE_BUTTON, PAUSE_MENU_SCENE, PauseMenu};
pub use upgrade_selection::{SelectionPhase, UpgradeSelection, card_name};
pub use wave_intro::{WAVE_INTRO_FLOW, WAVE_INTRO_TEXT, WaveIntro};

use super::flow::FlowScheduler;
use super::world::CombatWorld;
use crate::error::Result;

/// Returned from a state's update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDirective {
    Continue,
    /// Skip the rest of this frame's gameplay update
    BlockUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateName {
    WaveIntro,
    FightingWave,
    UpgradeSelection,
    PauseMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pop,
    To(StateName),
}

/// What a state may touch while it runs
pub struct StateContext<'a> {
    pub world: &'a mut CombatWorld,
    pub flows: &'a mut FlowScheduler<CombatWorld>,
}

pub enum GameState {
    WaveIntro(WaveIntro),
    FightingWave(FightingWave),
    UpgradeSelection(UpgradeSelection),
    PauseMenu(PauseMenu),
}

impl GameState {
    pub fn new(name: StateName) -> Self {
        match name {
            StateName::WaveIntro => GameState::WaveIntro(WaveIntro::default()),
            StateName::FightingWave => GameState::FightingWave(FightingWave::default()),
            StateName::UpgradeSelection => GameState::UpgradeSelection(UpgradeSelection::default()),
            StateName::PauseMenu => GameState::PauseMenu(PauseMenu::default()),
        }
    }

    pub fn name(&self) -> StateName {
        match self {
            GameState::WaveIntro(_) => StateName::WaveIntro,
            GameState::FightingWave(_) => StateName::FightingWave,
            GameState::UpgradeSelection(_) => StateName::UpgradeSelection,
            GameState::PauseMenu(_) => StateName::PauseMenu,
        }
    }

    pub fn initialize(&mut self, cx: &mut StateContext) -> Result<()> {
        match self {
            GameState::WaveIntro(s) => s.initialize(cx),
            GameState::FightingWave(s) => s.initialize(cx),
            GameState::UpgradeSelection(s) => s.initialize(cx),
            GameState::PauseMenu(s) => s.initialize(cx),
        }
    }

    pub fn update(&mut self, cx: &mut StateContext, dt_ms: f32) -> Result<UpdateDirective> {
        match self {
            GameState::WaveIntro(s) => s.update(cx, dt_ms),
            GameState::FightingWave(_) => Ok(UpdateDirective::Continue),
            GameState::UpgradeSelection(s) => s.update(cx, dt_ms),
            GameState::PauseMenu(s) => s.update(cx),
        }
    }

    pub fn destroy(&mut self, cx: &mut StateContext) -> Result<()> {
        match self {
            GameState::WaveIntro(s) => s.destroy(cx),
            GameState::FightingWave(s) => s.destroy(cx),
            GameState::UpgradeSelection(s) => s.destroy(cx),
            GameState::PauseMenu(s) => s.destroy(cx),
        }
    }

    pub fn is_complete(&self, cx: &StateContext) -> bool {
        match self {
            GameState::WaveIntro(s) => s.is_complete(cx),
            GameState::FightingWave(s) => s.is_complete(cx),
            GameState::UpgradeSelection(s) => s.is_complete(),
            GameState::PauseMenu(s) => s.is_complete(),
        }
    }

    pub fn next_state(&self, cx: &StateContext) -> Transition {
        match self {
            GameState::WaveIntro(s) => s.next_state(cx),
            GameState::FightingWave(s) => s.next_state(cx),
            GameState::UpgradeSelection(_) => Transition::To(StateName::WaveIntro),
            GameState::PauseMenu(_) => Transition::Pop,
        }
    }
}

#[derive(Default)]
pub struct StateMachine {
    stack: Vec<GameState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop whatever runs and begin at `name`
    pub fn start(&mut self, name: StateName, cx: &mut StateContext) -> Result<()> {
        self.unwind(cx)?;
        self.push(name, cx)
    }

    /// Initialize `name` on top; the state below stays alive but inactive
    pub fn push(&mut self, name: StateName, cx: &mut StateContext) -> Result<()> {
        log::debug!("Entering {:?}", name);
        let mut state = GameState::new(name);
        state.initialize(cx)?;
        self.stack.push(state);
        Ok(())
    }

    pub fn update(&mut self, cx: &mut StateContext, dt_ms: f32) -> Result<UpdateDirective> {
        match self.stack.last_mut() {
            Some(state) => state.update(cx, dt_ms),
            None => Ok(UpdateDirective::Continue),
        }
    }

    /// Run the top state's transition if it completed
    pub fn apply_transitions(&mut self, cx: &mut StateContext) -> Result<Option<Transition>> {
        let Some(top) = self.stack.last() else {
            return Ok(None);
        };
        if !top.is_complete(cx) {
            return Ok(None);
        }
        let transition = top.next_state(cx);
        let from = top.name();
        if let Some(mut outgoing) = self.stack.pop() {
            outgoing.destroy(cx)?;
        }
        match transition {
            Transition::Pop => log::info!("{:?} popped", from),
            Transition::To(next) => {
                log::info!("{:?} -> {:?}", from, next);
                self.push(next, cx)?;
            }
        }
        Ok(Some(transition))
    }

    /// Destroy every state, top first
    pub fn unwind(&mut self, cx: &mut StateContext) -> Result<()> {
        while let Some(mut state) = self.stack.pop() {
            state.destroy(cx)?;
        }
        Ok(())
    }

    pub fn top(&self) -> Option<StateName> {
        self.stack.last().map(GameState::name)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
