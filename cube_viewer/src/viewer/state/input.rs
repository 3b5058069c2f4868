//! Translation from winit events into pure scene-state updates.

use cube_scene::state::{SceneResponse, TransportKey};
use glam::Vec2;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{Key, NamedKey},
};

use super::ViewerState;

/// Pixels of scroll treated as one zoom notch when the platform reports
/// pixel deltas instead of lines.
const PIXELS_PER_SCROLL_LINE: f64 = 20.0;

pub(super) fn handle_key_event(state: &mut ViewerState, event: &KeyEvent) {
    if event.state != ElementState::Pressed {
        return;
    }
    let key = match event.logical_key {
        Key::Named(NamedKey::Space) => TransportKey::TogglePlay,
        Key::Named(NamedKey::ArrowLeft) => TransportKey::SkipBack,
        Key::Named(NamedKey::ArrowRight) => TransportKey::SkipForward,
        Key::Named(NamedKey::ArrowUp) => TransportKey::VolumeUp,
        Key::Named(NamedKey::ArrowDown) => TransportKey::VolumeDown,
        _ => return,
    };
    let now = state.now_ns();
    state.scene.key(key, now);
}

pub(super) fn handle_mouse_button(
    state: &mut ViewerState,
    button_state: ElementState,
    button: MouseButton,
) {
    if button != MouseButton::Left {
        return;
    }
    match button_state {
        ElementState::Pressed => {
            let now = state.now_ns();
            let cursor = state.cursor;
            state.scene.mouse_pressed(cursor, now);
        }
        ElementState::Released => {
            state.scene.mouse_released();
        }
    }
}

pub(super) fn handle_cursor_moved(state: &mut ViewerState, position: PhysicalPosition<f64>) {
    state.cursor = Vec2::new(position.x as f32, position.y as f32);
    if let SceneResponse::VertexMoved(_) = state.scene.mouse_moved(state.cursor) {
        state.vertices_dirty = true;
    }
}

pub(super) fn handle_scroll(state: &mut ViewerState, delta: MouseScrollDelta) {
    let notches = match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_SCROLL_LINE) as f32,
    };
    if notches != 0.0 {
        state.scene.scrolled(notches);
    }
}
