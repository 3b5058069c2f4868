//! Screen-space vertex picking and drag math. Everything here is pure over
//! the current view-projection matrix and viewport, so the window layer only
//! forwards cursor positions.

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::cube::{CubeMesh, FACE_UVS, Face};

/// Cursor-to-vertex hit radius in physical pixels.
pub const PICK_THRESHOLD_PX: f32 = 15.0;

/// Window-pixel position (y-down, origin top-left, matching cursor events)
/// plus the NDC depth the rasterizer would assign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProjection {
    pub pixel: Vec2,
    pub ndc_depth: f32,
}

pub fn project_to_screen(
    view_proj: Mat4,
    viewport: (u32, u32),
    world: Vec3,
) -> Option<ScreenProjection> {
    let (width, height) = viewport;
    if width == 0 || height == 0 {
        return None;
    }
    let clip = view_proj * world.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    if !ndc.is_finite() {
        return None;
    }
    let pixel = Vec2::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc.y) * 0.5 * height as f32,
    );
    Some(ScreenProjection {
        pixel,
        ndc_depth: ndc.z,
    })
}

/// Inverse of `project_to_screen`. Returns `None` for a zero-area viewport or
/// a singular matrix rather than letting NaN reach the vertex buffer.
pub fn unproject_from_screen(
    view_proj: Mat4,
    viewport: (u32, u32),
    pixel: Vec2,
    ndc_depth: f32,
) -> Option<Vec3> {
    let (width, height) = viewport;
    if width == 0 || height == 0 {
        return None;
    }
    if view_proj.determinant().abs() <= f32::EPSILON {
        return None;
    }
    let inverse = view_proj.inverse();
    let ndc = Vec4::new(
        pixel.x / width as f32 * 2.0 - 1.0,
        1.0 - pixel.y / height as f32 * 2.0,
        ndc_depth,
        1.0,
    );
    let world = inverse * ndc;
    if world.w.abs() <= f32::EPSILON {
        return None;
    }
    let position = world.xyz() / world.w;
    position.is_finite().then_some(position)
}

/// Nearest vertex within `threshold` pixels of the cursor, or `None`. Ties
/// resolve to the lowest vertex index: iteration order, with a strict `<`
/// against the best distance seen so far.
pub fn pick_vertex(
    cube: &CubeMesh,
    view_proj: Mat4,
    viewport: (u32, u32),
    cursor: Vec2,
    threshold: f32,
) -> Option<usize> {
    let mut closest = None;
    let mut best_distance = threshold;
    for (index, vertex) in cube.vertices().iter().enumerate() {
        let Some(projected) = project_to_screen(view_proj, viewport, *vertex) else {
            continue;
        };
        let distance = projected.pixel.distance(cursor);
        if distance < best_distance {
            best_distance = distance;
            closest = Some(index);
        }
    }
    closest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        vertex: usize,
    },
}

/// Two-state press/drag/release machine over the cube's vertices. Owned and
/// driven by a single thread; motion events rewrite the dragged vertex in
/// place with no smoothing.
#[derive(Debug, Default)]
pub struct VertexDragger {
    state: DragState,
}

impl VertexDragger {
    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn selected(&self) -> Option<usize> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { vertex } => Some(vertex),
        }
    }

    /// Idle -> Dragging when a vertex sits within the pick threshold.
    /// Returns the picked index, if any.
    pub fn press(
        &mut self,
        cube: &CubeMesh,
        view_proj: Mat4,
        viewport: (u32, u32),
        cursor: Vec2,
    ) -> Option<usize> {
        let picked = pick_vertex(cube, view_proj, viewport, cursor, PICK_THRESHOLD_PX);
        if let Some(vertex) = picked {
            log::debug!("drag start on vertex {vertex}");
            self.state = DragState::Dragging { vertex };
        }
        picked
    }

    /// While dragging, reproject the vertex for its current NDC depth and
    /// unproject the cursor at that depth. A degenerate transform leaves the
    /// vertex untouched. Returns true when the vertex actually moved.
    pub fn motion(
        &self,
        cube: &mut CubeMesh,
        view_proj: Mat4,
        viewport: (u32, u32),
        cursor: Vec2,
    ) -> bool {
        let DragState::Dragging { vertex } = self.state else {
            return false;
        };
        let Some(current) = cube.vertex(vertex) else {
            return false;
        };
        let Some(projected) = project_to_screen(view_proj, viewport, current) else {
            return false;
        };
        let Some(moved) =
            unproject_from_screen(view_proj, viewport, cursor, projected.ndc_depth)
        else {
            return false;
        };
        cube.set_vertex(vertex, moved).is_ok()
    }

    /// Dragging -> Idle. Returns true when a selection was actually cleared.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.selected().is_some();
        if was_dragging {
            log::debug!("drag released");
        }
        self.state = DragState::Idle;
        was_dragging
    }
}

struct Ray {
    origin: Vec3,
    direction: Vec3,
}

/// Moller-Trumbore intersection returning the ray distance and the
/// barycentric weights of edges v0->v1 and v0->v2.
fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - v0;
    let u = s.dot(h) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some((t, u, v))
}

/// Texture coordinate under the cursor on the given face, or `None` when the
/// cursor ray misses the quad. The quad is intersected as two triangles so
/// the mapping stays correct after the face deforms.
pub fn face_uv_at_cursor(
    cube: &CubeMesh,
    face: Face,
    view_proj: Mat4,
    viewport: (u32, u32),
    cursor: Vec2,
) -> Option<(f32, f32)> {
    let near = unproject_from_screen(view_proj, viewport, cursor, 0.0)?;
    let far = unproject_from_screen(view_proj, viewport, cursor, 1.0)?;
    let span = far - near;
    if span.length_squared() <= f32::EPSILON {
        return None;
    }
    let ray = Ray {
        origin: near,
        direction: span.normalize(),
    };

    let corners = cube.face_corners(face);
    let uv = |index: usize| Vec2::from(FACE_UVS[index]);
    // Split along the first diagonal: (0,1,2) and (0,2,3).
    let triangles = [
        ([corners[0], corners[1], corners[2]], [uv(0), uv(1), uv(2)]),
        ([corners[0], corners[2], corners[3]], [uv(0), uv(2), uv(3)]),
    ];

    let mut best: Option<(f32, Vec2)> = None;
    for ([a, b, c], [uv_a, uv_b, uv_c]) in triangles {
        if let Some((t, u, v)) = ray_triangle_intersect(&ray, a, b, c) {
            let hit_uv = uv_a * (1.0 - u - v) + uv_b * u + uv_c * v;
            if best.map(|(best_t, _)| t < best_t).unwrap_or(true) {
                best = Some((t, hit_uv));
            }
        }
    }
    best.map(|(_, uv)| (uv.x, uv.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;

    const VIEWPORT: (u32, u32) = (800, 600);

    fn default_view_proj() -> Mat4 {
        OrbitCamera::new(VIEWPORT.0, VIEWPORT.1).view_projection()
    }

    #[test]
    fn project_then_unproject_round_trips_every_vertex() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        for vertex in cube.vertices() {
            let projected =
                project_to_screen(view_proj, VIEWPORT, *vertex).expect("vertex in front of eye");
            let restored =
                unproject_from_screen(view_proj, VIEWPORT, projected.pixel, projected.ndc_depth)
                    .expect("projection invertible");
            assert!(
                restored.distance(*vertex) < 1e-3,
                "round trip drifted: {vertex:?} -> {restored:?}"
            );
        }
    }

    #[test]
    fn press_at_projected_vertex_selects_it() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        for (index, vertex) in cube.vertices().iter().enumerate() {
            let Some(projected) = project_to_screen(view_proj, VIEWPORT, *vertex) else {
                continue;
            };
            assert_eq!(
                pick_vertex(&cube, view_proj, VIEWPORT, projected.pixel, PICK_THRESHOLD_PX),
                Some(index),
                "exact press must pick vertex {index} (or nothing nearer exists)"
            );
        }
    }

    #[test]
    fn press_inside_threshold_never_misses() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        let projected = project_to_screen(view_proj, VIEWPORT, cube.vertex(2).unwrap())
            .expect("vertex 2 visible");
        let nudged = projected.pixel + Vec2::new(6.0, -4.0);
        let picked = pick_vertex(&cube, view_proj, VIEWPORT, nudged, PICK_THRESHOLD_PX);
        assert!(picked.is_some(), "press within threshold returned Idle");
    }

    #[test]
    fn press_far_from_every_vertex_stays_idle() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        let corner = Vec2::new(2.0, 2.0);
        for vertex in cube.vertices() {
            if let Some(projected) = project_to_screen(view_proj, VIEWPORT, *vertex) {
                assert!(projected.pixel.distance(corner) > PICK_THRESHOLD_PX);
            }
        }
        assert_eq!(
            pick_vertex(&cube, view_proj, VIEWPORT, corner, PICK_THRESHOLD_PX),
            None
        );
    }

    #[test]
    fn tie_breaks_to_lowest_vertex_index() {
        let mut cube = CubeMesh::new();
        // Collapse vertex 5 onto vertex 1 so both project to the same pixel.
        let shared = cube.vertex(1).unwrap();
        cube.set_vertex(5, shared).unwrap();
        let view_proj = default_view_proj();
        let projected = project_to_screen(view_proj, VIEWPORT, shared).unwrap();
        assert_eq!(
            pick_vertex(&cube, view_proj, VIEWPORT, projected.pixel, PICK_THRESHOLD_PX),
            Some(1)
        );
    }

    #[test]
    fn drag_cycle_moves_exactly_one_vertex() {
        let mut cube = CubeMesh::new();
        let pristine = CubeMesh::new();
        let view_proj = default_view_proj();
        let mut dragger = VertexDragger::default();

        let start = project_to_screen(view_proj, VIEWPORT, cube.vertex(2).unwrap())
            .expect("vertex 2 visible")
            .pixel;
        assert_eq!(dragger.press(&cube, view_proj, VIEWPORT, start), Some(2));

        let target = start + Vec2::new(40.0, 25.0);
        assert!(dragger.motion(&mut cube, view_proj, VIEWPORT, target));
        assert!(dragger.release());
        assert_eq!(dragger.state(), DragState::Idle);

        for (index, vertex) in cube.vertices().iter().enumerate() {
            if index == 2 {
                assert_ne!(*vertex, *pristine.vertices().get(2).unwrap());
                let reprojected = project_to_screen(view_proj, VIEWPORT, *vertex)
                    .expect("moved vertex still visible");
                assert!(
                    reprojected.pixel.distance(target) < 0.5,
                    "vertex 2 did not land under the cursor: {:?} vs {:?}",
                    reprojected.pixel,
                    target
                );
            } else {
                assert_eq!(
                    vertex.to_array(),
                    pristine.vertices()[index].to_array(),
                    "vertex {index} moved during a drag of vertex 2"
                );
            }
        }
    }

    #[test]
    fn motion_without_selection_is_a_no_op() {
        let mut cube = CubeMesh::new();
        let dragger = VertexDragger::default();
        assert!(!dragger.motion(
            &mut cube,
            default_view_proj(),
            VIEWPORT,
            Vec2::new(400.0, 300.0)
        ));
        assert_eq!(cube, CubeMesh::new());
    }

    #[test]
    fn degenerate_viewport_rejects_unprojection() {
        let view_proj = default_view_proj();
        assert!(unproject_from_screen(view_proj, (0, 600), Vec2::ZERO, 0.5).is_none());
        assert!(unproject_from_screen(view_proj, (800, 0), Vec2::ZERO, 0.5).is_none());
        assert!(unproject_from_screen(Mat4::ZERO, VIEWPORT, Vec2::ZERO, 0.5).is_none());
    }

    #[test]
    fn degenerate_motion_leaves_vertex_unchanged() {
        let mut cube = CubeMesh::new();
        let view_proj = default_view_proj();
        let mut dragger = VertexDragger::default();
        let start = project_to_screen(view_proj, VIEWPORT, cube.vertex(0).unwrap())
            .unwrap()
            .pixel;
        dragger.press(&cube, view_proj, VIEWPORT, start);
        assert!(!dragger.motion(&mut cube, Mat4::ZERO, VIEWPORT, start + Vec2::X));
        assert_eq!(cube.vertex(0), CubeMesh::new().vertex(0));
    }

    #[test]
    fn face_center_maps_to_uv_midpoint() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        let corners = cube.face_corners(Face::Right);
        let center = corners.iter().copied().sum::<Vec3>() / 4.0;
        let pixel = project_to_screen(view_proj, VIEWPORT, center)
            .expect("face center visible")
            .pixel;
        let (u, v) = face_uv_at_cursor(&cube, Face::Right, view_proj, VIEWPORT, pixel)
            .expect("center ray hits the face");
        assert!((u - 0.5).abs() < 1e-3, "u was {u}");
        assert!((v - 0.5).abs() < 1e-3, "v was {v}");
    }

    #[test]
    fn ray_past_the_face_misses() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        assert_eq!(
            face_uv_at_cursor(&cube, Face::Right, view_proj, VIEWPORT, Vec2::new(2.0, 2.0)),
            None
        );
    }

    #[test]
    fn face_corner_maps_near_its_uv() {
        let cube = CubeMesh::new();
        let view_proj = default_view_proj();
        let corners = cube.face_corners(Face::Right);
        // Sample just inside the first corner (uv 0,1) to stay on the quad.
        let inset = corners[0] * 0.96 + corners[2] * 0.04;
        let pixel = project_to_screen(view_proj, VIEWPORT, inset).unwrap().pixel;
        let (u, v) = face_uv_at_cursor(&cube, Face::Right, view_proj, VIEWPORT, pixel)
            .expect("inset corner hits the face");
        assert!(u < 0.1, "u was {u}");
        assert!(v > 0.9, "v was {v}");
    }
}
