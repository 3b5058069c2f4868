use bytemuck::{Pod, Zeroable};

/// Textured cube faces transformed by the camera's view-projection matrix.
pub(super) const CUBE_SHADER_SOURCE: &str = r#"
struct SceneUniform {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = scene.view_proj * vec4<f32>(input.position, 1.0);
    out.uv = input.uv;
    return out;
}

@group(1) @binding(0)
var face_texture: texture_2d<f32>;
@group(1) @binding(1)
var face_sampler: sampler;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let uv = clamp(input.uv, vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 1.0));
    return textureSample(face_texture, face_sampler, uv);
}
"#;

/// Screen-space dots marking the cube's draggable vertices. Instances carry
/// an NDC translation computed on the CPU each frame; the selected vertex
/// renders enlarged and highlighted.
pub(super) const MARKER_SHADER_SOURCE: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) local_pos: vec2<f32>,
    @location(2) highlight: f32,
};

struct VertexIn {
    @location(0) base_pos: vec2<f32>,
    @location(1) translate: vec2<f32>,
    @location(2) size: vec2<f32>,
    @location(3) highlight: f32,
    @location(4) color: vec3<f32>,
};

@vertex
fn vs_main(input: VertexIn) -> VertexOutput {
    let scale = input.size * (1.0 + input.highlight * 0.5);
    var out: VertexOutput;
    out.position = vec4<f32>(input.base_pos * scale + input.translate, 0.0, 1.0);
    out.color = input.color;
    out.local_pos = input.base_pos;
    out.highlight = input.highlight;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let radius = length(input.local_pos);
    let body = 1.0 - smoothstep(0.75, 1.0, radius);
    let color = mix(input.color, vec3<f32>(1.0, 1.0, 1.0), input.highlight * 0.4);
    let alpha = body * (0.85 + input.highlight * 0.15);
    if alpha < 0.03 {
        discard;
    }
    return vec4<f32>(color, alpha);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct FaceVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct MarkerVertex {
    pub base_pos: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct MarkerInstance {
    pub translate: [f32; 2],
    pub size: [f32; 2],
    pub highlight: f32,
    pub color: [f32; 3],
}

/// Unit quad expanded per instance; two triangles, no index buffer.
pub(super) const MARKER_VERTICES: [MarkerVertex; 6] = [
    MarkerVertex {
        base_pos: [-1.0, -1.0],
    },
    MarkerVertex {
        base_pos: [1.0, -1.0],
    },
    MarkerVertex {
        base_pos: [1.0, 1.0],
    },
    MarkerVertex {
        base_pos: [-1.0, -1.0],
    },
    MarkerVertex {
        base_pos: [1.0, 1.0],
    },
    MarkerVertex {
        base_pos: [-1.0, 1.0],
    },
];
