//! Pure state and math for the media cube viewer: camera, cube geometry,
//! vertex picking/dragging, playback transport, and the synthesized control
//! panel. Nothing in this crate touches a window or GPU, so every state
//! transition the viewer drives is unit-testable headlessly.

pub mod camera;
pub mod cube;
pub mod glyphs;
pub mod panel;
pub mod pick;
pub mod state;
pub mod transport;

pub use camera::OrbitCamera;
pub use cube::{CubeMesh, Face, VERTEX_COUNT};
pub use panel::{ControlAction, PanelLayout, PanelPainter, format_timestamp};
pub use pick::{DragState, VertexDragger, face_uv_at_cursor, pick_vertex};
pub use state::{SceneResponse, SceneState, TransportKey};
pub use transport::{Transport, TransportSnapshot};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("vertex index {index} out of range (cube has {count} vertices)")]
    VertexIndex { index: usize, count: usize },

    #[error("panel buffer holds {actual} bytes but {expected} are required")]
    PanelBuffer { expected: usize, actual: usize },

    #[error("reading panel font {path}: {source}")]
    FontRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing panel font {path}: {reason}")]
    FontParse { path: String, reason: &'static str },
}
