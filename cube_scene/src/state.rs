//! The application-state struct the window layer drives. Input handlers here
//! are pure state updates that report what changed; the presentation layer
//! only reads the resulting state each frame.

use glam::Vec2;

use crate::camera::OrbitCamera;
use crate::cube::{CubeMesh, Face};
use crate::panel::{ControlAction, PanelLayout};
use crate::pick::{VertexDragger, face_uv_at_cursor};
use crate::transport::Transport;

/// Which face carries the synthesized control panel.
pub const CONTROL_FACE: Face = Face::Right;
/// Which face carries the video stream.
pub const VIDEO_FACE: Face = Face::Top;

/// Outcome of an input event, so the caller knows whether a redraw or a
/// vertex-buffer refresh is warranted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneResponse {
    Ignored,
    CameraChanged,
    VertexPicked(usize),
    VertexMoved(usize),
    SelectionCleared,
    TransportChanged,
}

/// Keyboard bindings the viewer forwards: space and the four arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKey {
    TogglePlay,
    SkipBack,
    SkipForward,
    VolumeUp,
    VolumeDown,
}

pub struct SceneState {
    pub camera: OrbitCamera,
    pub cube: CubeMesh,
    pub dragger: VertexDragger,
    pub transport: Transport,
    panel_layout: PanelLayout,
}

impl SceneState {
    pub fn new(
        viewport: (u32, u32),
        duration_hint: Option<std::time::Duration>,
        panel_size: u32,
    ) -> Self {
        Self {
            camera: OrbitCamera::new(viewport.0, viewport.1),
            cube: CubeMesh::new(),
            dragger: VertexDragger::default(),
            transport: Transport::new(duration_hint),
            panel_layout: PanelLayout::new(panel_size),
        }
    }

    pub fn panel_layout(&self) -> &PanelLayout {
        &self.panel_layout
    }

    /// A press lands on the control panel first; a consumed control click
    /// never also starts a vertex drag. Otherwise the vertex picker runs.
    pub fn mouse_pressed(&mut self, cursor: Vec2, now_ns: u64) -> SceneResponse {
        let view_proj = self.camera.view_projection();
        let viewport = self.camera.viewport();

        if let Some((u, v)) =
            face_uv_at_cursor(&self.cube, CONTROL_FACE, view_proj, viewport, cursor)
        {
            if let Some(action) = self.panel_layout.hit_test(u, v) {
                log::debug!("control hit at uv ({u:.3}, {v:.3}): {action:?}");
                self.apply_control(action, now_ns);
                return SceneResponse::TransportChanged;
            }
        }

        match self.dragger.press(&self.cube, view_proj, viewport, cursor) {
            Some(vertex) => SceneResponse::VertexPicked(vertex),
            None => SceneResponse::Ignored,
        }
    }

    pub fn mouse_moved(&mut self, cursor: Vec2) -> SceneResponse {
        let view_proj = self.camera.view_projection();
        let viewport = self.camera.viewport();
        if self.dragger.motion(&mut self.cube, view_proj, viewport, cursor) {
            // motion() only reports true while a vertex is held.
            let vertex = self.dragger.selected().unwrap_or_default();
            SceneResponse::VertexMoved(vertex)
        } else {
            SceneResponse::Ignored
        }
    }

    pub fn mouse_released(&mut self) -> SceneResponse {
        if self.dragger.release() {
            SceneResponse::SelectionCleared
        } else {
            SceneResponse::Ignored
        }
    }

    pub fn scrolled(&mut self, delta: f32) -> SceneResponse {
        self.camera.adjust_zoom(delta);
        SceneResponse::CameraChanged
    }

    pub fn resized(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    pub fn key(&mut self, key: TransportKey, now_ns: u64) -> SceneResponse {
        match key {
            TransportKey::TogglePlay => self.transport.toggle(now_ns),
            TransportKey::SkipBack => self.transport.skip_back(now_ns),
            TransportKey::SkipForward => self.transport.skip_forward(now_ns),
            TransportKey::VolumeUp => self.transport.volume_up(),
            TransportKey::VolumeDown => self.transport.volume_down(),
        }
        SceneResponse::TransportChanged
    }

    fn apply_control(&mut self, action: ControlAction, now_ns: u64) {
        match action {
            ControlAction::SkipBack => self.transport.skip_back(now_ns),
            ControlAction::TogglePlay => self.transport.toggle(now_ns),
            ControlAction::SkipForward => self.transport.skip_forward(now_ns),
            ControlAction::SetVolume(fraction) => self.transport.set_volume(fraction),
        }
    }
}
