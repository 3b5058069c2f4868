use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cube_scene::panel::{self, PanelPainter};
use cube_scene::state::SceneState;
use cube_scene::transport::TransportSnapshot;
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

mod cli;
mod media;
mod texture;
mod viewer;

use cli::{Args, ViewerPreset, load_preset};
use media::{FaceMedia, OgvStream, PacedVideo, PanelMedia, VideoSource};
use texture::{RgbaSurface, export_rgba_to_png};
use viewer::ViewerState;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let preset = match args.preset.as_ref() {
        Some(path) => {
            let preset = load_preset(path)?;
            log::info!("applied viewer preset from {}", path.display());
            preset
        }
        None => ViewerPreset::default(),
    };

    if let Some(path) = args.dump_panel.as_ref() {
        return dump_panel(path, &preset);
    }

    let panel_font = preset
        .panel_font()
        .map(|path| panel::load_panel_font(path).map_err(|err| anyhow!(err)))
        .transpose()
        .context("loading panel font")?;

    let cover = RgbaSurface::from_image_file(&args.cover).context("loading front cover")?;
    let back = match args.back.as_ref() {
        Some(path) => RgbaSurface::from_image_file(path).context("loading back cover")?,
        None => cover.clone(),
    };
    let stream = OgvStream::open(&args.video)
        .with_context(|| format!("opening video {}", args.video.display()))?;
    println!(
        "Loaded {} ({}x{}, {:.1} fps) and cover {} ({}x{})",
        args.video.display(),
        stream.width(),
        stream.height(),
        1.0 / stream.frame_duration().as_secs_f64(),
        args.cover.display(),
        cover.width,
        cover.height
    );

    if args.headless {
        println!("Headless mode requested; viewer window bootstrap skipped.");
        return Ok(());
    }

    let (width, height) = preset.window_size();
    let scene = SceneState::new(
        (width, height),
        preset.duration_hint(),
        preset.panel_size(),
    );
    let panel_media = PanelMedia::new(PanelPainter::new(preset.panel_size(), panel_font));
    let video = PacedVideo::new(stream);

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Media Cube")
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut state = ViewerState::new(
        window,
        scene,
        FaceMedia::StaticImage(cover),
        FaceMedia::SynthesizedPanel(panel_media),
        FaceMedia::VideoStream(video),
        FaceMedia::StaticImage(back),
    )
    .block_on()?;

    println!("Space toggles playback, arrows seek and set volume, scroll zooms.");
    println!("Drag any corner marker to deform the cube; controls live on the side face.");

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => target.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            state.handle_key_event(&event)
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button,
                            ..
                        } => state.handle_mouse_button(button_state, button),
                        WindowEvent::CursorMoved { position, .. } => {
                            state.handle_cursor_moved(position)
                        }
                        WindowEvent::MouseWheel { delta, .. } => state.handle_scroll(delta),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::RedrawRequested => match state.render() {
                            Ok(_) => {}
                            Err(SurfaceError::Lost) => state.resize(state.size()),
                            Err(SurfaceError::OutOfMemory) => target.exit(),
                            Err(err) => eprintln!("[cube_viewer] render error: {err:?}"),
                        },
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

/// Paint the control panel in its startup state and write it to disk. Runs
/// without media files or a GPU, which makes it the headless smoke test for
/// the whole panel path.
fn dump_panel(path: &std::path::Path, preset: &ViewerPreset) -> Result<()> {
    let font = preset
        .panel_font()
        .map(|font_path| panel::load_panel_font(font_path).map_err(|err| anyhow!(err)))
        .transpose()
        .context("loading panel font")?;

    let size = preset.panel_size();
    let mut painter = PanelPainter::new(size, font);
    let mut pixels = vec![0u8; painter.layout().rgba_len()];
    let snapshot = TransportSnapshot {
        playing: false,
        progress: 0.0,
        elapsed: Duration::ZERO,
        volume: cube_scene::transport::DEFAULT_VOLUME,
    };
    painter
        .paint(&snapshot, &mut pixels)
        .map_err(|err| anyhow!(err))
        .context("painting control panel")?;
    export_rgba_to_png(path, size, size, &pixels)?;
    println!("Control panel exported to {} ({size}x{size})", path.display());
    Ok(())
}
