//! The synthesized media-control surface mapped onto the cube's right face:
//! progress bar, elapsed-time readout, transport buttons, and volume slider.
//! The whole surface repaints from a transport snapshot every frame; there is
//! no dirty-region tracking, correctness is pixel-for-pixel consistency with
//! the current playback state.

use std::time::Duration;

use crate::SceneError;
use crate::glyphs::PanelFont;
use crate::transport::TransportSnapshot;

pub const DEFAULT_PANEL_SIZE: u32 = 512;

/// All coordinates below are absolute pixels at the 512 reference size and
/// scale linearly with the configured texture size.
const REFERENCE_SIZE: f32 = 512.0;
const PROGRESS_WIDTH_FRACTION: f32 = 0.8;
const PROGRESS_HEIGHT: f32 = 10.0;
const PROGRESS_TOP: f32 = 50.0;
const TIME_TEXT_GAP: f32 = 20.0;
const BUTTON_SIZE: f32 = 60.0;
const VOLUME_WIDTH_FRACTION: f32 = 0.7;
const VOLUME_HEIGHT: f32 = 20.0;
const VOLUME_BOTTOM_MARGIN: f32 = 80.0;
const VOLUME_HIT_SLACK: f32 = 20.0;
const KNOB_RADIUS: f32 = 12.0;
const FONT_SIZE: f32 = 24.0;

const BACKGROUND: [u8; 4] = [40, 40, 40, 230];
const TRACK: [u8; 4] = [100, 100, 100, 255];
const ACCENT: [u8; 4] = [30, 215, 96, 255];
const BUTTON: [u8; 4] = [70, 70, 70, 255];
const ICON_DIM: [u8; 4] = [200, 200, 200, 255];
const ICON: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PanelRect {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    fn inflated_vertically(&self, slack: f32) -> PanelRect {
        PanelRect {
            x: self.x,
            y: self.y - slack,
            width: self.width,
            height: self.height + slack * 2.0,
        }
    }
}

/// What a press on the panel means for the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    SkipBack,
    TogglePlay,
    SkipForward,
    SetVolume(f32),
}

/// Pure geometry of the panel. The painter and the click router share one
/// layout so drawn controls and hit regions cannot drift apart.
#[derive(Debug, Clone, Copy)]
pub struct PanelLayout {
    size: u32,
    scale: f32,
    progress: PanelRect,
    rewind: PanelRect,
    play: PanelRect,
    forward: PanelRect,
    volume: PanelRect,
}

impl PanelLayout {
    pub fn new(size: u32) -> Self {
        let side = size.max(1) as f32;
        let scale = side / REFERENCE_SIZE;

        let progress_width = side * PROGRESS_WIDTH_FRACTION;
        let progress = PanelRect {
            x: (side - progress_width) * 0.5,
            y: PROGRESS_TOP * scale,
            width: progress_width,
            height: PROGRESS_HEIGHT * scale,
        };

        let button = BUTTON_SIZE * scale;
        let button_y = side * 0.5;
        let rewind = PanelRect {
            x: side * 0.5 - button * 2.0,
            y: button_y,
            width: button,
            height: button,
        };
        let play = PanelRect {
            x: side * 0.5 - button * 0.5,
            y: button_y,
            width: button,
            height: button,
        };
        let forward = PanelRect {
            x: side * 0.5 + button,
            y: button_y,
            width: button,
            height: button,
        };

        let volume_width = side * VOLUME_WIDTH_FRACTION;
        let volume = PanelRect {
            x: (side - volume_width) * 0.5,
            y: side - VOLUME_BOTTOM_MARGIN * scale,
            width: volume_width,
            height: VOLUME_HEIGHT * scale,
        };

        Self {
            size: size.max(1),
            scale,
            progress,
            rewind,
            play,
            forward,
            volume,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn rgba_len(&self) -> usize {
        (self.size as usize) * (self.size as usize) * 4
    }

    /// Route a texture-space coordinate (u right, v down, both in [0, 1]) to
    /// the control underneath it. The volume slider accepts a slightly taller
    /// band than it draws so the knob stays grabbable.
    pub fn hit_test(&self, u: f32, v: f32) -> Option<ControlAction> {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        let side = self.size as f32;
        let x = u * side;
        let y = v * side;

        if self.rewind.contains(x, y) {
            return Some(ControlAction::SkipBack);
        }
        if self.play.contains(x, y) {
            return Some(ControlAction::TogglePlay);
        }
        if self.forward.contains(x, y) {
            return Some(ControlAction::SkipForward);
        }
        let volume_band = self.volume.inflated_vertically(VOLUME_HIT_SLACK * self.scale);
        if volume_band.contains(x, y) {
            let fraction = ((x - self.volume.x) / self.volume.width).clamp(0.0, 1.0);
            return Some(ControlAction::SetVolume(fraction));
        }
        None
    }
}

/// Repaints the panel surface from a transport snapshot.
pub struct PanelPainter {
    layout: PanelLayout,
    font: Option<PanelFont>,
}

impl PanelPainter {
    pub fn new(size: u32, font: Option<PanelFont>) -> Self {
        Self {
            layout: PanelLayout::new(size),
            font,
        }
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rasterize the full panel into `pixels` (RGBA8, row-major, row 0 at the
    /// top). The buffer length must match the layout exactly.
    pub fn paint(
        &mut self,
        snapshot: &TransportSnapshot,
        pixels: &mut [u8],
    ) -> Result<(), SceneError> {
        let expected = self.layout.rgba_len();
        if pixels.len() != expected {
            return Err(SceneError::PanelBuffer {
                expected,
                actual: pixels.len(),
            });
        }

        let side = self.layout.size;
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&BACKGROUND);
        }

        // Progress bar: full-width track, accent fill up to the snapshot.
        let progress = self.layout.progress;
        fill_rect(pixels, side, progress, TRACK);
        let fill = PanelRect {
            width: progress.width * snapshot.progress.clamp(0.0, 1.0),
            ..progress
        };
        fill_rect(pixels, side, fill, ACCENT);

        if let Some(font) = self.font.as_mut() {
            let text = format_timestamp(snapshot.elapsed);
            let origin_y = progress.y + progress.height + TIME_TEXT_GAP * self.layout.scale;
            blit_text(pixels, side, font, progress.x as i32, origin_y as i32, &text);
        }

        let scale = self.layout.scale;
        self.paint_rewind(pixels, side, scale);
        self.paint_play_pause(pixels, side, scale, snapshot.playing);
        self.paint_forward(pixels, side, scale);
        self.paint_volume(pixels, side, scale, snapshot.volume);

        Ok(())
    }

    fn paint_rewind(&self, pixels: &mut [u8], side: u32, scale: f32) {
        let rect = self.layout.rewind;
        fill_rect(pixels, side, rect, BUTTON);
        let (cx, cy) = rect.center();
        fill_triangle(
            pixels,
            side,
            [
                (cx - 12.0 * scale, cy),
                (cx + 8.0 * scale, cy - 12.0 * scale),
                (cx + 8.0 * scale, cy + 12.0 * scale),
            ],
            ICON_DIM,
        );
    }

    fn paint_play_pause(&self, pixels: &mut [u8], side: u32, scale: f32, playing: bool) {
        let rect = self.layout.play;
        fill_rect(pixels, side, rect, ACCENT);
        let (cx, cy) = rect.center();
        if playing {
            for offset in [-15.0, 5.0] {
                fill_rect(
                    pixels,
                    side,
                    PanelRect {
                        x: cx + offset * scale,
                        y: cy - 15.0 * scale,
                        width: 10.0 * scale,
                        height: 30.0 * scale,
                    },
                    ICON,
                );
            }
        } else {
            fill_triangle(
                pixels,
                side,
                [
                    (cx - 10.0 * scale, cy - 15.0 * scale),
                    (cx - 10.0 * scale, cy + 15.0 * scale),
                    (cx + 15.0 * scale, cy),
                ],
                ICON,
            );
        }
    }

    fn paint_forward(&self, pixels: &mut [u8], side: u32, scale: f32) {
        let rect = self.layout.forward;
        fill_rect(pixels, side, rect, BUTTON);
        let (cx, cy) = rect.center();
        fill_triangle(
            pixels,
            side,
            [
                (cx + 12.0 * scale, cy),
                (cx - 8.0 * scale, cy - 12.0 * scale),
                (cx - 8.0 * scale, cy + 12.0 * scale),
            ],
            ICON_DIM,
        );
    }

    fn paint_volume(&self, pixels: &mut [u8], side: u32, scale: f32, volume: f32) {
        let rect = self.layout.volume;
        fill_rect(pixels, side, rect, TRACK);
        let volume = volume.clamp(0.0, 1.0);
        let fill = PanelRect {
            width: rect.width * volume,
            ..rect
        };
        fill_rect(pixels, side, fill, ACCENT);

        let knob_x = rect.x + rect.width * volume;
        let knob_y = rect.y + rect.height * 0.5;
        fill_circle(pixels, side, knob_x, knob_y, KNOB_RADIUS * scale, ICON_DIM);
    }
}

pub fn format_timestamp(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn put_pixel(pixels: &mut [u8], side: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= side as i32 || y >= side as i32 {
        return;
    }
    let index = ((y as u32 * side + x as u32) * 4) as usize;
    pixels[index..index + 4].copy_from_slice(&color);
}

fn fill_rect(pixels: &mut [u8], side: u32, rect: PanelRect, color: [u8; 4]) {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return;
    }
    let x0 = rect.x.floor().max(0.0) as i32;
    let y0 = rect.y.floor().max(0.0) as i32;
    let x1 = (rect.x + rect.width).ceil() as i32;
    let y1 = (rect.y + rect.height).ceil() as i32;
    for y in y0..y1 {
        for x in x0..x1 {
            put_pixel(pixels, side, x, y, color);
        }
    }
}

fn fill_triangle(pixels: &mut [u8], side: u32, corners: [(f32, f32); 3], color: [u8; 4]) {
    let xs = corners.map(|(x, _)| x);
    let ys = corners.map(|(_, y)| y);
    let x0 = xs.iter().copied().fold(f32::MAX, f32::min).floor() as i32;
    let x1 = xs.iter().copied().fold(f32::MIN, f32::max).ceil() as i32;
    let y0 = ys.iter().copied().fold(f32::MAX, f32::min).floor() as i32;
    let y1 = ys.iter().copied().fold(f32::MIN, f32::max).ceil() as i32;

    let edge = |a: (f32, f32), b: (f32, f32), px: f32, py: f32| {
        (b.0 - a.0) * (py - a.1) - (b.1 - a.1) * (px - a.0)
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let w0 = edge(corners[0], corners[1], px, py);
            let w1 = edge(corners[1], corners[2], px, py);
            let w2 = edge(corners[2], corners[0], px, py);
            let inside =
                (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if inside {
                put_pixel(pixels, side, x, y, color);
            }
        }
    }
}

fn fill_circle(pixels: &mut [u8], side: u32, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
    let x0 = (cx - radius).floor() as i32;
    let x1 = (cx + radius).ceil() as i32;
    let y0 = (cy - radius).floor() as i32;
    let y1 = (cy + radius).ceil() as i32;
    let radius_sq = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius_sq {
                put_pixel(pixels, side, x, y, color);
            }
        }
    }
}

fn blit_text(pixels: &mut [u8], side: u32, font: &mut PanelFont, x: i32, y: i32, text: &str) {
    let layout = font.layout();
    let mut pen_x = x;
    for ch in text.chars() {
        let glyph = font.glyph(ch);
        if glyph.width > 0 && glyph.height > 0 {
            let start_x = pen_x + layout.left_bearing + glyph.xmin;
            let baseline = y + layout.ascent;
            let glyph_ymax = glyph.ymin + glyph.height as i32;
            let start_y = baseline - glyph_ymax;
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    let coverage = glyph.alpha[(gy * glyph.width + gx) as usize];
                    if coverage == 0 {
                        continue;
                    }
                    put_pixel(
                        pixels,
                        side,
                        start_x + gx as i32,
                        start_y + gy as i32,
                        [ICON[0], ICON[1], ICON[2], coverage],
                    );
                }
            }
        }
        pen_x += layout.cell_advance as i32;
    }
}

/// Load the optional panel font at the size the painter expects.
pub fn load_panel_font(path: &std::path::Path) -> Result<PanelFont, SceneError> {
    PanelFont::load(path, FONT_SIZE)
}
