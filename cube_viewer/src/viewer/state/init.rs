use std::{borrow::Cow, sync::Arc, time::Instant};

use anyhow::{Context, Result};
use bytemuck::cast_slice;
use cube_scene::cube::Face;
use cube_scene::state::SceneState;
use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::super::shaders::{
    CUBE_SHADER_SOURCE, FaceVertex, MARKER_SHADER_SOURCE, MARKER_VERTICES, MarkerInstance,
    MarkerVertex, SceneUniform,
};
use super::{FaceSlot, ViewerState, render};
use crate::media::FaceMedia;
use crate::texture::align_rgba_rows;

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

pub(super) async fn new(
    window: Arc<Window>,
    scene: SceneState,
    front: FaceMedia,
    right: FaceMedia,
    top: FaceMedia,
    back: FaceMedia,
) -> Result<ViewerState> {
    let size = window.inner_size();
    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu.surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu.present_mode,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu.alpha_mode,
        view_formats: vec![],
    };
    wgpu.surface.configure(&wgpu.device, &config);

    let (uniform_buffer, uniform_bind_group_layout, uniform_bind_group) =
        create_uniform_resources(&wgpu.device);
    let face_bind_group_layout = create_face_bind_group_layout(&wgpu.device);

    let faces = [
        (Face::Front, front),
        (Face::Right, right),
        (Face::Top, top),
        (Face::Back, back),
    ]
    .into_iter()
    .map(|(face, media)| {
        create_face_slot(&wgpu.device, &wgpu.queue, &face_bind_group_layout, face, media)
    })
    .collect::<Result<Vec<_>>>()?;

    let (cube_pipeline, marker_pipeline) = create_pipelines(
        &wgpu.device,
        wgpu.surface_format,
        &uniform_bind_group_layout,
        &face_bind_group_layout,
    );

    let cube_vertex_buffer = wgpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("cube-vertex-buffer"),
        size: (Face::ALL.len() * 4 * std::mem::size_of::<FaceVertex>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let cube_index_buffer = wgpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cube-index-buffer"),
        contents: cast_slice(&render::face_indices()),
        usage: wgpu::BufferUsages::INDEX,
    });

    let marker_vertex_buffer = wgpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("marker-vertex-buffer"),
            contents: cast_slice(&MARKER_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
    let marker_instance_buffer = wgpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("marker-instance-buffer"),
        size: (cube_scene::VERTEX_COUNT * std::mem::size_of::<MarkerInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let (depth_texture, depth_view) = create_depth_texture(&wgpu.device, config.width, config.height);

    let mut state = ViewerState {
        scene,
        faces,
        started: Instant::now(),
        cursor: Vec2::ZERO,
        vertices_dirty: true,
        uniform_buffer,
        uniform_bind_group,
        cube_pipeline,
        cube_vertex_buffer,
        cube_index_buffer,
        marker_pipeline,
        marker_vertex_buffer,
        marker_instance_buffer,
        depth_view,
        _depth_texture: depth_texture,
        config,
        size,
        device: wgpu.device,
        queue: wgpu.queue,
        surface: wgpu.surface,
        window,
    };
    state.scene.resized(size.width, size.height);
    render::upload_cube_vertices(&mut state);
    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cube-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or(surface_caps.formats[0]);
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

fn create_uniform_resources(
    device: &wgpu::Device,
) -> (wgpu::Buffer, wgpu::BindGroupLayout, wgpu::BindGroup) {
    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scene-uniform-buffer"),
        size: std::mem::size_of::<SceneUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene-uniform-layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene-uniform-bind-group"),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    (uniform_buffer, layout, bind_group)
}

fn create_face_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("face-bind-group-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_face_slot(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    face: Face,
    media: FaceMedia,
) -> Result<FaceSlot> {
    let (width, height) = media.dimensions();
    let extent = wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };

    let label = format!("{}-face-texture", face.label());
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label.as_str()),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let sampler_label = format!("{}-face-sampler", face.label());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(sampler_label.as_str()),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let bind_label = format!("{}-face-bind-group", face.label());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(bind_label.as_str()),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    let slot = FaceSlot {
        face,
        media,
        texture,
        bind_group,
    };

    // Seed every texture so the first frame never samples garbage; the video
    // and panel slots are rewritten per frame anyway.
    let (width, height) = slot.media.dimensions();
    let upload = align_rgba_rows(width, height, slot.media.current_pixels())
        .with_context(|| format!("preparing initial upload for {} face", slot.face.label()))?;
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
        extent,
    );

    Ok(slot)
}

fn create_pipelines(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    uniform_layout: &wgpu::BindGroupLayout,
    face_layout: &wgpu::BindGroupLayout,
) -> (wgpu::RenderPipeline, wgpu::RenderPipeline) {
    let cube_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("cube-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(CUBE_SHADER_SOURCE)),
    });

    let cube_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("cube-pipeline-layout"),
        bind_group_layouts: &[uniform_layout, face_layout],
        push_constant_ranges: &[],
    });

    let face_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<FaceVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };

    let cube_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("cube-pipeline"),
        layout: Some(&cube_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &cube_shader,
            entry_point: "vs_main",
            buffers: &[face_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &cube_shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let marker_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("marker-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(MARKER_SHADER_SOURCE)),
    });

    let marker_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("marker-pipeline-layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    let marker_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MarkerVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
    };
    let marker_instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MarkerInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            1 => Float32x2,
            2 => Float32x2,
            3 => Float32,
            4 => Float32x3,
        ],
    };

    let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("marker-pipeline"),
        layout: Some(&marker_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &marker_shader,
            entry_point: "vs_main",
            buffers: &[marker_vertex_layout, marker_instance_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &marker_shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    (cube_pipeline, marker_pipeline)
}

pub(super) fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("cube-depth-texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
