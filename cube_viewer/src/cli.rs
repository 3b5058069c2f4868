use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_WINDOW_WIDTH: u32 = 800;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 600;

#[derive(Parser, Debug)]
#[command(
    about = "Deformable media cube: video on top, covers in front, controls on the side",
    version
)]
pub struct Args {
    /// Ogg Theora video mapped onto the top face
    #[arg(long, default_value = "video.ogv")]
    pub video: PathBuf,

    /// Cover image mapped onto the front face
    #[arg(long, default_value = "cover.png")]
    pub cover: PathBuf,

    /// Image for the back face; defaults to the cover
    #[arg(long)]
    pub back: Option<PathBuf>,

    /// Viewer preset JSON (window size, panel size/font, duration hint)
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Paint the control panel off-screen, write it as PNG, and exit
    #[arg(long)]
    pub dump_panel: Option<PathBuf>,

    /// Validate media resources and exit before creating a window
    #[arg(long)]
    pub headless: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerPreset {
    #[serde(default)]
    pub window: Option<WindowPreset>,
    #[serde(default)]
    pub panel: Option<PanelPreset>,
    /// Total media length in seconds, used only to scale the progress bar.
    #[serde(default)]
    pub duration_hint_seconds: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WindowPreset {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PanelPreset {
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub font: Option<PathBuf>,
}

impl ViewerPreset {
    pub fn window_size(&self) -> (u32, u32) {
        let width = self
            .window
            .as_ref()
            .and_then(|window| window.width)
            .unwrap_or(DEFAULT_WINDOW_WIDTH);
        let height = self
            .window
            .as_ref()
            .and_then(|window| window.height)
            .unwrap_or(DEFAULT_WINDOW_HEIGHT);
        (width.max(1), height.max(1))
    }

    pub fn panel_size(&self) -> u32 {
        self.panel
            .as_ref()
            .and_then(|panel| panel.size)
            .unwrap_or(cube_scene::panel::DEFAULT_PANEL_SIZE)
            .max(1)
    }

    pub fn panel_font(&self) -> Option<&Path> {
        self.panel.as_ref().and_then(|panel| panel.font.as_deref())
    }

    pub fn duration_hint(&self) -> Option<Duration> {
        self.duration_hint_seconds
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map(Duration::from_secs_f64)
    }
}

pub fn load_preset(path: &Path) -> Result<ViewerPreset> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading viewer preset {}", path.display()))?;
    let preset: ViewerPreset = serde_json::from_str(&data)
        .with_context(|| format!("parsing viewer preset {}", path.display()))?;
    Ok(preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_preset_uses_defaults() {
        let preset: ViewerPreset = serde_json::from_str("{}").expect("empty preset parses");
        assert_eq!(
            preset.window_size(),
            (DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
        );
        assert_eq!(preset.panel_size(), cube_scene::panel::DEFAULT_PANEL_SIZE);
        assert!(preset.panel_font().is_none());
        assert_eq!(preset.duration_hint(), None);
    }

    #[test]
    fn preset_fields_override_defaults() {
        let raw = r#"{
            "window": { "width": 1280, "height": 720 },
            "panel": { "size": 256, "font": "fonts/mono.ttf" },
            "duration_hint_seconds": 212.5
        }"#;
        let preset: ViewerPreset = serde_json::from_str(raw).expect("preset parses");
        assert_eq!(preset.window_size(), (1280, 720));
        assert_eq!(preset.panel_size(), 256);
        assert_eq!(
            preset.panel_font().map(|path| path.display().to_string()),
            Some("fonts/mono.ttf".to_string())
        );
        assert_eq!(preset.duration_hint(), Some(Duration::from_secs_f64(212.5)));
    }

    #[test]
    fn nonsense_duration_hints_are_dropped() {
        for raw in [
            r#"{"duration_hint_seconds": 0}"#,
            r#"{"duration_hint_seconds": -3}"#,
        ] {
            let preset: ViewerPreset = serde_json::from_str(raw).expect("preset parses");
            assert_eq!(preset.duration_hint(), None, "{raw}");
        }
    }
}
