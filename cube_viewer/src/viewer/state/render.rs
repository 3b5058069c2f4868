use bytemuck::cast_slice;
use cube_scene::cube::{FACE_UVS, Face};
use cube_scene::pick::project_to_screen;
use wgpu::SurfaceError;

use super::super::shaders::{FaceVertex, MarkerInstance, SceneUniform};
use super::{FaceSlot, ViewerState};
use crate::media::{FaceMedia, VideoUpdate};
use crate::texture::align_rgba_rows;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.08,
    a: 1.0,
};
const MARKER_SIZE_PX: f32 = 5.0;
const MARKER_COLOR: [f32; 3] = [0.85, 0.2, 0.2];

/// Index buffer contents: two triangles per face, offset by each face's
/// four-vertex block.
pub(super) fn face_indices() -> [u16; Face::ALL.len() * 6] {
    let mut indices = [0u16; Face::ALL.len() * 6];
    for (face_index, chunk) in indices.chunks_exact_mut(6).enumerate() {
        let base = (face_index * 4) as u16;
        chunk.copy_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

/// Rewrite the shared vertex buffer from the cube's current (possibly
/// dragged) geometry.
pub(super) fn upload_cube_vertices(state: &mut ViewerState) {
    let mut vertices = Vec::with_capacity(Face::ALL.len() * 4);
    for face in Face::ALL {
        let corners = state.scene.cube.face_corners(face);
        for (corner, uv) in corners.iter().zip(FACE_UVS) {
            vertices.push(FaceVertex {
                position: corner.to_array(),
                uv,
            });
        }
    }
    state
        .queue
        .write_buffer(&state.cube_vertex_buffer, 0, cast_slice(&vertices));
    state.vertices_dirty = false;
}

fn upload_slot_pixels(queue: &wgpu::Queue, slot: &FaceSlot) {
    let (width, height) = slot.media.dimensions();
    let upload = match align_rgba_rows(width, height, slot.media.current_pixels()) {
        Ok(upload) => upload,
        Err(err) => {
            log::warn!("skipping {} face upload: {err:?}", slot.face.label());
            return;
        }
    };
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &slot.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Pull due media frames into their textures. Soft failures log and leave
/// the previous texture contents visible; they never abort the frame.
fn advance_media(state: &mut ViewerState, now_ns: u64) {
    let playing = state.scene.transport.playing();
    let position = state.scene.transport.position(now_ns);
    let snapshot = state.scene.transport.snapshot(now_ns);

    let mut rebase = false;
    for slot in state.faces.iter_mut() {
        match &mut slot.media {
            FaceMedia::StaticImage(_) => {}
            FaceMedia::VideoStream(video) => {
                if !playing {
                    continue;
                }
                match video.update(position) {
                    Ok(VideoUpdate::Unchanged) => {}
                    Ok(VideoUpdate::NewFrame) => upload_slot_pixels(&state.queue, slot),
                    Ok(VideoUpdate::Looped) => {
                        upload_slot_pixels(&state.queue, slot);
                        rebase = true;
                    }
                    Err(err) => {
                        log::warn!("video update failed on {} face: {err}", slot.face.label());
                    }
                }
            }
            FaceMedia::SynthesizedPanel(panel) => match panel.repaint(&snapshot) {
                Ok(()) => upload_slot_pixels(&state.queue, slot),
                Err(err) => {
                    log::warn!("panel repaint failed: {err}");
                }
            },
        }
    }

    if rebase {
        log::debug!("video looped; transport position rebased to zero");
        state.scene.transport.rebase(now_ns);
    }
}

fn marker_instances(state: &ViewerState) -> Vec<MarkerInstance> {
    let view_proj = state.scene.camera.view_projection();
    let viewport = state.scene.camera.viewport();
    let (width, height) = (viewport.0 as f32, viewport.1 as f32);
    let selected = state.scene.dragger.selected();

    let mut instances = Vec::with_capacity(cube_scene::VERTEX_COUNT);
    for (index, vertex) in state.scene.cube.vertices().iter().enumerate() {
        let Some(projected) = project_to_screen(view_proj, viewport, *vertex) else {
            continue;
        };
        let translate = [
            projected.pixel.x / width * 2.0 - 1.0,
            1.0 - projected.pixel.y / height * 2.0,
        ];
        instances.push(MarkerInstance {
            translate,
            size: [
                MARKER_SIZE_PX * 2.0 / width,
                MARKER_SIZE_PX * 2.0 / height,
            ],
            highlight: if selected == Some(index) { 1.0 } else { 0.0 },
            color: MARKER_COLOR,
        });
    }
    instances
}

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    let now_ns = state.now_ns();
    advance_media(state, now_ns);

    let uniform = SceneUniform {
        view_proj: state.scene.camera.view_projection().to_cols_array_2d(),
    };
    state
        .queue
        .write_buffer(&state.uniform_buffer, 0, cast_slice(&[uniform]));

    if state.vertices_dirty {
        upload_cube_vertices(state);
    }

    let markers = marker_instances(state);
    if !markers.is_empty() {
        state
            .queue
            .write_buffer(&state.marker_instance_buffer, 0, cast_slice(&markers));
    }

    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("cube-viewer-encoder"),
        });

    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cube-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(BACKGROUND),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &state.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_pipeline(&state.cube_pipeline);
        rpass.set_bind_group(0, &state.uniform_bind_group, &[]);
        rpass.set_vertex_buffer(0, state.cube_vertex_buffer.slice(..));
        rpass.set_index_buffer(state.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        for (face_index, slot) in state.faces.iter().enumerate() {
            let start = (face_index * 6) as u32;
            rpass.set_bind_group(1, &slot.bind_group, &[]);
            rpass.draw_indexed(start..start + 6, 0, 0..1);
        }
    }

    if !markers.is_empty() {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("marker-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_pipeline(&state.marker_pipeline);
        rpass.set_vertex_buffer(0, state.marker_vertex_buffer.slice(..));
        rpass.set_vertex_buffer(1, state.marker_instance_buffer.slice(..));
        rpass.draw(0..6, 0..markers.len() as u32);
    }

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}
