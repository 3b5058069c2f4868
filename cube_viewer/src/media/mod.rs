//! Media feeding for the cube faces. Each face binds one `FaceMedia` variant
//! exposing the same current-pixels accessor; the render loop dispatches once
//! per face per frame and uploads only what actually changed.

use std::sync::Mutex;
use std::time::Duration;

use cube_scene::panel::PanelPainter;
use cube_scene::transport::TransportSnapshot;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::texture::RgbaSurface;

pub mod ogv;
pub mod yuv;

pub use ogv::OgvStream;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("movie path '{path}' contains a NUL byte")]
    PathEncoding { path: String },

    #[error("failed to open Theora movie '{path}' (error code {code})")]
    Open { path: String, code: i32 },

    #[error("Theora movie '{path}' does not contain a video stream")]
    NoVideo { path: String },

    #[error("video dimensions are unusable for '{path}'")]
    Dimensions { path: String },

    #[error("unsupported pixel format {format} for '{path}'")]
    PixelFormat {
        path: String,
        format: theorafile_rs::th_pixel_fmt,
    },

    #[error("Theora movie '{path}' ended before yielding a frame")]
    EmptyStream { path: String },

    #[error("Theora decoder for '{path}' returned unexpected status {status}")]
    Decode { path: String, status: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamProgress {
    Advanced,
    EndOfStream,
}

/// A monotonically decoding video stream. `OgvStream` is the production
/// implementation; tests substitute synthetic sources.
pub trait VideoSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn frame_duration(&self) -> Duration;
    fn current_frame(&self) -> Option<u64>;
    fn advance_to(&mut self, target: u64) -> Result<StreamProgress, MediaError>;
    fn rewind(&mut self) -> Result<(), MediaError>;
    fn pixels(&self) -> &[u8];
}

/// What one paced update did, so the caller knows whether to re-upload the
/// texture and whether the transport position must rebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoUpdate {
    NewFrame,
    Unchanged,
    Looped,
}

static STREAM_DIMENSIONS_LOG: Lazy<Mutex<Option<(u32, u32)>>> = Lazy::new(|| Mutex::new(None));

fn log_stream_dimensions(width: u32, height: u32) {
    let mut last = STREAM_DIMENSIONS_LOG
        .lock()
        .expect("stream dimension log mutex poisoned");
    if *last != Some((width, height)) {
        log::info!("video stream decoding at {width}x{height}");
        *last = Some((width, height));
    }
}

/// Frame pacing over a video source: derives the due frame index from the
/// transport position and decodes up to it. When no new frame is due the
/// texture keeps showing the previous frame. End-of-stream loops: the stream
/// rewinds to frame 0 and the caller rebases the transport.
pub struct PacedVideo<S: VideoSource = OgvStream> {
    source: S,
    uploaded_frame: Option<u64>,
}

impl<S: VideoSource> PacedVideo<S> {
    pub fn new(source: S) -> Self {
        log_stream_dimensions(source.width(), source.height());
        Self {
            source,
            uploaded_frame: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.source.width()
    }

    pub fn height(&self) -> u32 {
        self.source.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.source.pixels()
    }

    fn target_frame(&self, position: Duration) -> u64 {
        let frame_ns = self.source.frame_duration().as_nanos();
        if frame_ns == 0 {
            return 0;
        }
        (position.as_nanos() / frame_ns) as u64
    }

    pub fn update(&mut self, position: Duration) -> Result<VideoUpdate, MediaError> {
        let target = self.target_frame(position);
        if self.uploaded_frame == Some(target) && self.source.current_frame() == Some(target) {
            return Ok(VideoUpdate::Unchanged);
        }

        // Decoding is forward-only, so a backward seek restarts the stream
        // and fast-forwards to the due frame.
        if let Some(current) = self.source.current_frame() {
            if target < current {
                self.source.rewind()?;
                self.source.advance_to(target)?;
                self.uploaded_frame = self.source.current_frame();
                return Ok(VideoUpdate::NewFrame);
            }
        }

        match self.source.advance_to(target)? {
            StreamProgress::Advanced => {
                let current = self.source.current_frame();
                if current == self.uploaded_frame {
                    Ok(VideoUpdate::Unchanged)
                } else {
                    self.uploaded_frame = current;
                    Ok(VideoUpdate::NewFrame)
                }
            }
            StreamProgress::EndOfStream => {
                log::debug!("video reached end of stream; looping to frame 0");
                self.source.rewind()?;
                self.source.advance_to(0)?;
                self.uploaded_frame = self.source.current_frame();
                Ok(VideoUpdate::Looped)
            }
        }
    }
}

/// The control-panel surface: repainted wholesale every frame from the
/// current transport snapshot.
pub struct PanelMedia {
    painter: PanelPainter,
    pixels: Vec<u8>,
}

impl PanelMedia {
    pub fn new(painter: PanelPainter) -> Self {
        let pixels = vec![0u8; painter.layout().rgba_len()];
        Self { painter, pixels }
    }

    pub fn size(&self) -> u32 {
        self.painter.layout().size()
    }

    pub fn repaint(&mut self, snapshot: &TransportSnapshot) -> Result<(), cube_scene::SceneError> {
        self.painter.paint(snapshot, &mut self.pixels)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Tagged media binding for one cube face.
pub enum FaceMedia {
    StaticImage(RgbaSurface),
    VideoStream(PacedVideo),
    SynthesizedPanel(PanelMedia),
}

impl FaceMedia {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            FaceMedia::StaticImage(surface) => (surface.width, surface.height),
            FaceMedia::VideoStream(video) => (video.width(), video.height()),
            FaceMedia::SynthesizedPanel(panel) => (panel.size(), panel.size()),
        }
    }

    pub fn current_pixels(&self) -> &[u8] {
        match self {
            FaceMedia::StaticImage(surface) => &surface.pixels,
            FaceMedia::VideoStream(video) => video.pixels(),
            FaceMedia::SynthesizedPanel(panel) => panel.pixels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic 2x2 source with a fixed frame count; mirrors the decode
    /// surface of `OgvStream` without touching the FFI.
    struct ScriptedSource {
        frames: u64,
        cursor: Option<u64>,
        end_of_stream: bool,
        rewinds: u32,
    }

    impl ScriptedSource {
        fn new(frames: u64) -> Self {
            Self {
                frames,
                cursor: None,
                end_of_stream: false,
                rewinds: 0,
            }
        }
    }

    impl VideoSource for ScriptedSource {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn frame_duration(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn current_frame(&self) -> Option<u64> {
            self.cursor
        }

        fn advance_to(&mut self, target: u64) -> Result<StreamProgress, MediaError> {
            loop {
                if self.end_of_stream {
                    return Ok(StreamProgress::EndOfStream);
                }
                if let Some(current) = self.cursor {
                    if current >= target {
                        return Ok(StreamProgress::Advanced);
                    }
                }
                let next = self.cursor.map(|value| value + 1).unwrap_or(0);
                if next >= self.frames {
                    self.end_of_stream = true;
                    return Ok(StreamProgress::EndOfStream);
                }
                self.cursor = Some(next);
            }
        }

        fn rewind(&mut self) -> Result<(), MediaError> {
            self.cursor = None;
            self.end_of_stream = false;
            self.rewinds += 1;
            Ok(())
        }

        fn pixels(&self) -> &[u8] {
            &[0; 16]
        }
    }

    #[test]
    fn first_update_decodes_frame_zero() {
        let mut video = PacedVideo::new(ScriptedSource::new(10));
        assert_eq!(video.update(Duration::ZERO).unwrap(), VideoUpdate::NewFrame);
        assert_eq!(video.source.current_frame(), Some(0));
    }

    #[test]
    fn no_new_frame_due_leaves_the_texture_alone() {
        let mut video = PacedVideo::new(ScriptedSource::new(10));
        video.update(Duration::ZERO).unwrap();
        // Still inside frame 0's display window.
        assert_eq!(
            video.update(Duration::from_millis(40)).unwrap(),
            VideoUpdate::Unchanged
        );
        assert_eq!(
            video.update(Duration::from_millis(99)).unwrap(),
            VideoUpdate::Unchanged
        );
    }

    #[test]
    fn position_jumps_decode_forward_to_the_due_frame() {
        let mut video = PacedVideo::new(ScriptedSource::new(10));
        assert_eq!(
            video.update(Duration::from_millis(550)).unwrap(),
            VideoUpdate::NewFrame
        );
        assert_eq!(video.source.current_frame(), Some(5));
    }

    #[test]
    fn backward_seek_rewinds_and_redecodes() {
        let mut video = PacedVideo::new(ScriptedSource::new(10));
        video.update(Duration::from_millis(550)).unwrap();
        assert_eq!(video.source.current_frame(), Some(5));

        assert_eq!(
            video.update(Duration::from_millis(150)).unwrap(),
            VideoUpdate::NewFrame
        );
        assert_eq!(video.source.rewinds, 1);
        assert_eq!(video.source.current_frame(), Some(1));
    }

    #[test]
    fn end_of_stream_loops_back_to_frame_zero() {
        let mut video = PacedVideo::new(ScriptedSource::new(3));
        video.update(Duration::from_millis(250)).unwrap();
        assert_eq!(video.source.current_frame(), Some(2));

        // Past the last frame: the source reports EOS and the video loops.
        assert_eq!(
            video.update(Duration::from_millis(800)).unwrap(),
            VideoUpdate::Looped
        );
        assert_eq!(video.source.rewinds, 1);
        assert_eq!(video.source.current_frame(), Some(0));

        // After the caller rebases the transport, pacing resumes from zero.
        assert_eq!(
            video.update(Duration::from_millis(50)).unwrap(),
            VideoUpdate::Unchanged
        );
        assert_eq!(
            video.update(Duration::from_millis(150)).unwrap(),
            VideoUpdate::NewFrame
        );
        assert_eq!(video.source.current_frame(), Some(1));
    }

    #[test]
    fn panel_media_repaints_from_snapshots() {
        let painter = PanelPainter::new(64, None);
        let mut panel = PanelMedia::new(painter);
        let paused = TransportSnapshot {
            playing: false,
            progress: 0.0,
            elapsed: Duration::ZERO,
            volume: 0.5,
        };
        let playing = TransportSnapshot {
            playing: true,
            ..paused
        };

        panel.repaint(&paused).expect("paint succeeds");
        let before = panel.pixels().to_vec();
        panel.repaint(&playing).expect("paint succeeds");
        let after = panel.pixels().to_vec();
        assert_eq!(before.len(), 64 * 64 * 4);
        assert_ne!(before, after, "play state change must repaint differently");
    }

    #[test]
    fn face_media_exposes_uniform_accessors() {
        let surface = RgbaSurface {
            width: 3,
            height: 2,
            pixels: vec![9u8; 24],
        };
        let media = FaceMedia::StaticImage(surface);
        assert_eq!(media.dimensions(), (3, 2));
        assert_eq!(media.current_pixels().len(), 24);

        let panel = FaceMedia::SynthesizedPanel(PanelMedia::new(PanelPainter::new(32, None)));
        assert_eq!(panel.dimensions(), (32, 32));
        assert_eq!(panel.current_pixels().len(), 32 * 32 * 4);
    }
}
