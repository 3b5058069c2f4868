use glam::Vec3;

use crate::SceneError;

pub const VERTEX_COUNT: usize = 8;

/// Texture coordinates shared by every face, matched to the corner order in
/// the face tables: v grows toward the bottom of the texture, so the first
/// two corners of a face (its lower edge) sample the last texture row.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

const DEFAULT_VERTICES: [Vec3; VERTEX_COUNT] = [
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
];

/// The four textured faces of the cube. The bottom and left faces are never
/// drawn, matching the camera's fixed tilt which keeps them out of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Right,
    Top,
    Back,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::Front, Face::Right, Face::Top, Face::Back];

    /// Corner indices in lower-edge-first winding, counter-clockwise when
    /// viewed from outside the cube.
    pub fn vertex_indices(self) -> [usize; 4] {
        match self {
            Face::Front => [0, 1, 2, 3],
            Face::Right => [1, 5, 6, 2],
            Face::Top => [3, 2, 6, 7],
            Face::Back => [5, 4, 7, 6],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Right => "right",
            Face::Top => "top",
            Face::Back => "back",
        }
    }
}

/// Deformable cube geometry. Vertices move only through `set_vertex`; the
/// face tables are fixed for the lifetime of the program. No planarity is
/// enforced after a drag: a bent quad renders however the rasterizer
/// interpolates it.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMesh {
    vertices: [Vec3; VERTEX_COUNT],
}

impl Default for CubeMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeMesh {
    pub fn new() -> Self {
        Self {
            vertices: DEFAULT_VERTICES,
        }
    }

    pub fn vertices(&self) -> &[Vec3; VERTEX_COUNT] {
        &self.vertices
    }

    pub fn vertex(&self, index: usize) -> Option<Vec3> {
        self.vertices.get(index).copied()
    }

    pub fn set_vertex(&mut self, index: usize, position: Vec3) -> Result<(), SceneError> {
        let slot = self
            .vertices
            .get_mut(index)
            .ok_or(SceneError::VertexIndex {
                index,
                count: VERTEX_COUNT,
            })?;
        *slot = position;
        Ok(())
    }

    pub fn face_corners(&self, face: Face) -> [Vec3; 4] {
        face.vertex_indices().map(|index| self.vertices[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_tables_stay_in_bounds() {
        for face in Face::ALL {
            for index in face.vertex_indices() {
                assert!(index < VERTEX_COUNT, "{} face references {}", face.label(), index);
            }
        }
    }

    #[test]
    fn set_vertex_rejects_out_of_range_index() {
        let mut cube = CubeMesh::new();
        let err = cube.set_vertex(VERTEX_COUNT, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SceneError::VertexIndex { index: 8, .. }));
        assert_eq!(cube, CubeMesh::new());
    }

    #[test]
    fn set_vertex_moves_only_the_target() {
        let mut cube = CubeMesh::new();
        let moved = Vec3::new(2.5, -0.25, 1.75);
        cube.set_vertex(2, moved).expect("index in range");
        for (index, vertex) in cube.vertices().iter().enumerate() {
            if index == 2 {
                assert_eq!(*vertex, moved);
            } else {
                assert_eq!(*vertex, DEFAULT_VERTICES[index]);
            }
        }
    }

    #[test]
    fn each_face_starts_planar() {
        let cube = CubeMesh::new();
        for face in Face::ALL {
            let [a, b, c, d] = cube.face_corners(face);
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(d - a).abs() < 1e-6, "{} face", face.label());
        }
    }
}
