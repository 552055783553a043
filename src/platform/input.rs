//! Input context: the most recent touch event

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Down,
    Motion,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub kind: TouchKind,
    /// Position in world units
    pub position: Vec2,
}

/// Input snapshot handed to the updater each frame
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    event: Option<TouchEvent>,
    /// Last known touch position
    pub position: Vec2,
    /// Host asked for the pause menu
    pub pause_requested: bool,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a touch event; later events in the same frame replace earlier ones
    pub fn push(&mut self, kind: TouchKind, position: Vec2) {
        self.event = Some(TouchEvent { kind, position });
        self.position = position;
    }

    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    /// Most recent event; clears it so it is only handled once
    pub fn take(&mut self) -> Option<TouchEvent> {
        self.event.take()
    }

    /// A tap is a touch-down this frame
    pub fn tapped_at(&self) -> Option<Vec2> {
        match self.event {
            Some(TouchEvent {
                kind: TouchKind::Down,
                position,
            }) => Some(position),
            _ => None,
        }
    }
}
