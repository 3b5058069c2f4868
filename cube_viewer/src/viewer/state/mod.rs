//! Runtime state for the viewer window. Owns the wgpu device/surface, the
//! per-face textures, and the pure `SceneState` it renders. Submodules cover
//! lifecycle slices: `init` for setup, `layout` for resize handling, `input`
//! for event routing, and `render` for the per-frame work.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use cube_scene::cube::Face;
use cube_scene::state::SceneState;
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, event::KeyEvent, window::Window};

use crate::media::FaceMedia;

mod init;
mod input;
mod layout;
mod render;

pub(super) struct FaceSlot {
    face: Face,
    media: FaceMedia,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Field order doubles as the teardown order: media decoders drop first,
/// then GPU resources, then the surface, then the window.
pub struct ViewerState {
    scene: SceneState,
    faces: Vec<FaceSlot>,
    started: Instant,
    cursor: glam::Vec2,
    vertices_dirty: bool,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_pipeline: wgpu::RenderPipeline,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    marker_pipeline: wgpu::RenderPipeline,
    marker_vertex_buffer: wgpu::Buffer,
    marker_instance_buffer: wgpu::Buffer,
    depth_view: wgpu::TextureView,
    _depth_texture: wgpu::Texture,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    window: Arc<Window>,
}

impl ViewerState {
    pub async fn new(
        window: Arc<Window>,
        scene: SceneState,
        front: FaceMedia,
        right: FaceMedia,
        top: FaceMedia,
        back: FaceMedia,
    ) -> Result<Self> {
        init::new(window, scene, front, right, top, back).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        input::handle_key_event(self, event);
    }

    pub fn handle_mouse_button(
        &mut self,
        state: winit::event::ElementState,
        button: winit::event::MouseButton,
    ) {
        input::handle_mouse_button(self, state, button);
    }

    pub fn handle_cursor_moved(&mut self, position: winit::dpi::PhysicalPosition<f64>) {
        input::handle_cursor_moved(self, position);
    }

    pub fn handle_scroll(&mut self, delta: winit::event::MouseScrollDelta) {
        input::handle_scroll(self, delta);
    }

    fn now_ns(&self) -> u64 {
        self.started.elapsed().as_nanos() as u64
    }
}
