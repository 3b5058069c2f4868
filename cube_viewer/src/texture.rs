//! CPU-side pixel plumbing: image loading, wgpu row-alignment padding for
//! texture uploads, and PNG export for the panel dump path.

use std::{borrow::Cow, fs::File, path::Path};

use anyhow::{Context, Result, ensure};
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};

/// An RGBA8 pixel rectangle with row 0 at the top, the orientation every
/// texture in the viewer shares.
#[derive(Debug, Clone)]
pub struct RgbaSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaSurface {
    /// Decode a cover image. RGB sources gain an opaque alpha channel.
    /// A missing or unreadable file is a startup failure, not a fallback.
    pub fn from_image_file(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .with_context(|| format!("loading cover image {}", path.display()))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        ensure!(
            width > 0 && height > 0,
            "cover image {} has no pixels",
            path.display()
        );
        Ok(Self {
            width,
            height,
            pixels: decoded.into_raw(),
        })
    }
}

pub struct AlignedUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> AlignedUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad RGBA rows out to wgpu's copy alignment. Buffers whose rows already
/// land on the boundary are borrowed as-is.
pub fn align_rgba_rows<'a>(width: u32, height: u32, data: &'a [u8]) -> Result<AlignedUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4 * width as usize;
    let required = row_bytes * height as usize;
    ensure!(
        data.len() >= required,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        required
    );

    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    if row_bytes % alignment == 0 && data.len() == required {
        return Ok(AlignedUpload {
            data: Cow::Borrowed(data),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row * height as usize];
    for row in 0..height as usize {
        let src = row * row_bytes;
        let dst = row * padded_row;
        buffer[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
    }

    Ok(AlignedUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row as u32,
    })
}

pub fn export_rgba_to_png(path: &Path, width: u32, height: u32, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    PngEncoder::new(file)
        .write_image(data, width, height, ColorType::Rgba8.into())
        .with_context(|| format!("writing PNG to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_rows_borrow_the_source() {
        // 64 px * 4 bytes = 256, already a multiple of the 256-byte alignment.
        let data = vec![7u8; 64 * 2 * 4];
        let upload = align_rgba_rows(64, 2, &data).expect("aligned upload");
        assert_eq!(upload.bytes_per_row(), 256);
        assert_eq!(upload.pixels().len(), data.len());
        assert!(matches!(upload.data, Cow::Borrowed(_)));
    }

    #[test]
    fn unaligned_rows_are_padded() {
        let width = 30u32;
        let height = 3u32;
        let data: Vec<u8> = (0..width * height * 4).map(|i| i as u8).collect();
        let upload = align_rgba_rows(width, height, &data).expect("padded upload");
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        assert_eq!(upload.bytes_per_row() % alignment, 0);
        assert!(upload.bytes_per_row() >= width * 4);

        // Row content survives the padding.
        let row_bytes = (width * 4) as usize;
        let padded = upload.bytes_per_row() as usize;
        for row in 0..height as usize {
            assert_eq!(
                &upload.pixels()[row * padded..row * padded + row_bytes],
                &data[row * row_bytes..(row + 1) * row_bytes]
            );
        }
    }

    #[test]
    fn undersized_buffers_are_rejected() {
        let data = vec![0u8; 10];
        assert!(align_rgba_rows(64, 64, &data).is_err());
        assert!(align_rgba_rows(0, 64, &data).is_err());
    }

    #[test]
    fn png_round_trips_through_the_exporter() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("panel.png");
        let pixels: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 3) as u8).collect();
        export_rgba_to_png(&path, 4, 4, &pixels).expect("export succeeds");

        let decoded = image::open(&path).expect("png decodes").to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.into_raw(), pixels);
    }
}
