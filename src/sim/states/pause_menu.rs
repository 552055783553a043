use glam::{Vec2, Vec3};

use super::{StateContext, UpdateDirective};
use crate::content::GuiElementDefinition;
use crate::error::Result;

pub const PAUSE_MENU_SCENE: &str = "pause_menu";
pub const CONTINUE_BUTTON: &str = "continue_button";
const PAUSE_OVERLAY: &str = "pause_overlay";

/// Widgets used when no `pause_menu` scene is loaded
fn fallback_widgets() -> Vec<GuiElementDefinition> {
    vec![
        GuiElementDefinition {
            name: PAUSE_OVERLAY.into(),
            texture: Some("black".into()),
            position: Vec3::new(0.0, 0.0, 0.5),
            scale: Vec2::new(40.0, 80.0),
            ..Default::default()
        },
        GuiElementDefinition {
            name: CONTINUE_BUTTON.into(),
            texture: Some("button".into()),
            text: Some("Continue".into()),
            position: Vec3::new(0.0, 0.0, 0.6),
            scale: Vec2::new(4.0, 1.5),
            ..Default::default()
        },
    ]
}

/// Darkened overlay with a continue button; blocks gameplay until tapped
#[derive(Debug, Default)]
pub struct PauseMenu {
    widgets: Vec<String>,
    resumed: bool,
}

impl PauseMenu {
    pub fn initialize(&mut self, cx: &mut StateContext) -> Result<()> {
        let world = &mut *cx.world;
        let elements = match world.defs.gui_scene(PAUSE_MENU_SCENE) {
            Some(scene) => scene.elements.clone(),
            None => fallback_widgets(),
        };
        let alpha = world.settings.overlay_max_alpha;
        for element in &elements {
            let name = world.spawn_gui(element);
            if name == PAUSE_OVERLAY {
                if let Some(overlay) = world.scene.get_mut(&name) {
                    overlay.set_float("alpha", alpha);
                }
            }
            self.widgets.push(name);
        }
        if !self.widgets.iter().any(|w| w == CONTINUE_BUTTON) {
            log::warn!("Pause menu has no `{}`, resuming on any tap", CONTINUE_BUTTON);
        }
        log::info!("Paused");
        Ok(())
    }

    pub fn update(&mut self, cx: &mut StateContext) -> Result<UpdateDirective> {
        if let Some(tap) = cx.world.input.tapped_at() {
            cx.world.input.take();
            let hit = match cx.world.scene.get(CONTINUE_BUTTON) {
                Some(button) => button.contains_point(tap),
                None => true,
            };
            if hit {
                self.resumed = true;
            }
        }
        Ok(UpdateDirective::BlockUpdate)
    }

    pub fn destroy(&mut self, cx: &mut StateContext) -> Result<()> {
        let world = &mut *cx.world;
        for name in self.widgets.drain(..) {
            world.scene.remove_all_with_name(&name, &mut world.physics);
        }
        log::info!("Resumed");
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.resumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DefinitionStore;
    use crate::platform::TouchKind;
    use crate::sim::flow::FlowScheduler;
    use crate::testing::test_world;
    use std::sync::Arc;

    #[test]
    fn test_widgets_come_from_gui_scene() {
        let mut world = test_world();
        let mut flows = FlowScheduler::new();
        let mut cx = StateContext {
            world: &mut world,
            flows: &mut flows,
        };
        let mut menu = PauseMenu::default();
        menu.initialize(&mut cx).unwrap();
        let button = cx.world.scene.get(CONTINUE_BUTTON).unwrap();
        assert_eq!(button.text.as_deref(), Some("Continue"));
        assert!(button.font.is_some());
        assert_eq!(
            cx.world.scene.get(PAUSE_OVERLAY).unwrap().float("alpha"),
            Some(cx.world.settings.overlay_max_alpha)
        );

        cx.world.input.push(TouchKind::Down, Vec2::new(5.0, 5.0));
        menu.update(&mut cx).unwrap();
        assert!(!menu.is_complete());
        cx.world.input.push(TouchKind::Down, Vec2::new(0.5, 0.2));
        menu.update(&mut cx).unwrap();
        assert!(menu.is_complete());

        menu.destroy(&mut cx).unwrap();
        assert!(cx.world.scene.is_empty());
    }

    #[test]
    fn test_fallback_widgets_without_scene() {
        let mut world = test_world();
        world.defs = Arc::new(DefinitionStore::new());
        let mut flows = FlowScheduler::new();
        let mut cx = StateContext {
            world: &mut world,
            flows: &mut flows,
        };
        let mut menu = PauseMenu::default();
        menu.initialize(&mut cx).unwrap();
        assert!(cx.world.scene.get(CONTINUE_BUTTON).is_some());
        assert!(cx.world.scene.get(PAUSE_OVERLAY).is_some());
        assert_eq!(
            menu.update(&mut cx).unwrap(),
            UpdateDirective::BlockUpdate
        );
    }
}
