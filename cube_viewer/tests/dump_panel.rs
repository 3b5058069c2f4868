use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::tempdir;

#[test]
fn dump_panel_writes_the_default_panel() -> Result<()> {
    let temp = tempdir().context("creating temporary directory")?;
    let output_path = temp.path().join("panel.png");

    let status = Command::new(env!("CARGO_BIN_EXE_cube_viewer"))
        .arg("--dump-panel")
        .arg(&output_path)
        .status()
        .context("running cube_viewer --dump-panel")?;
    assert!(status.success(), "cube_viewer exited with {status:?}");
    assert!(output_path.is_file(), "panel PNG was not written");

    let decoded = image::open(&output_path)
        .context("decoding exported panel")?
        .to_rgba8();
    assert_eq!(decoded.dimensions(), (512, 512));

    // Corner pixels show the panel chrome; a point inside the play button
    // but left of its triangle icon carries the accent color.
    assert_eq!(decoded.get_pixel(2, 2).0, [40, 40, 40, 230]);
    assert_eq!(decoded.get_pixel(231, 261).0, [30, 215, 96, 255]);
    Ok(())
}

#[test]
fn dump_panel_honors_the_preset_size() -> Result<()> {
    let temp = tempdir().context("creating temporary directory")?;
    let preset_path = temp.path().join("preset.json");
    let output_path = temp.path().join("small_panel.png");
    fs::write(&preset_path, r#"{ "panel": { "size": 128 } }"#)
        .context("writing preset file")?;

    let status = Command::new(env!("CARGO_BIN_EXE_cube_viewer"))
        .arg("--preset")
        .arg(&preset_path)
        .arg("--dump-panel")
        .arg(&output_path)
        .status()
        .context("running cube_viewer with preset")?;
    assert!(status.success(), "cube_viewer exited with {status:?}");

    let decoded = image::open(&output_path)
        .context("decoding exported panel")?
        .to_rgba8();
    assert_eq!(decoded.dimensions(), (128, 128));
    Ok(())
}
