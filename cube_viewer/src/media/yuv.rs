//! Plane geometry and color conversion for decoded Theora frames.

use theorafile_rs::{
    th_pixel_fmt, th_pixel_fmt_TH_PF_420, th_pixel_fmt_TH_PF_422, th_pixel_fmt_TH_PF_444,
};

/// Luma and chroma plane sizes for one frame, derived from the stream's
/// pixel format. Construction fails for formats theora itself never emits.
#[derive(Debug, Clone, Copy)]
pub struct ChromaLayout {
    width: usize,
    height: usize,
    chroma_width: usize,
    chroma_height: usize,
    pixel_format: th_pixel_fmt,
}

impl ChromaLayout {
    pub fn new(width: usize, height: usize, pixel_format: th_pixel_fmt) -> Option<Self> {
        let (chroma_width, chroma_height) = match pixel_format {
            pf if pf == th_pixel_fmt_TH_PF_420 => ((width / 2).max(1), (height / 2).max(1)),
            pf if pf == th_pixel_fmt_TH_PF_422 => ((width / 2).max(1), height),
            pf if pf == th_pixel_fmt_TH_PF_444 => (width, height),
            _ => return None,
        };
        Some(Self {
            width,
            height,
            chroma_width,
            chroma_height,
            pixel_format,
        })
    }

    pub fn yuv_len(&self) -> Option<usize> {
        let luma = self.width.checked_mul(self.height)?;
        let chroma = self.chroma_width.checked_mul(self.chroma_height)?.checked_mul(2)?;
        luma.checked_add(chroma)
    }

    pub fn rgba_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(4)
    }

    fn split<'a>(&self, buffer: &'a [u8]) -> (&'a [u8], &'a [u8], &'a [u8]) {
        let luma_len = self.width * self.height;
        let chroma_len = self.chroma_width * self.chroma_height;
        let u_start = luma_len;
        let v_start = u_start + chroma_len;
        (
            &buffer[..luma_len],
            &buffer[u_start..v_start],
            &buffer[v_start..v_start + chroma_len],
        )
    }

    fn chroma_at(&self, plane: &[u8], x: usize, y: usize) -> f32 {
        let sample_x = match self.pixel_format {
            pf if pf == th_pixel_fmt_TH_PF_420 || pf == th_pixel_fmt_TH_PF_422 => x / 2,
            _ => x,
        }
        .min(self.chroma_width.saturating_sub(1));
        let sample_y = match self.pixel_format {
            pf if pf == th_pixel_fmt_TH_PF_420 => y / 2,
            _ => y,
        }
        .min(self.chroma_height.saturating_sub(1));
        plane[sample_y * self.chroma_width + sample_x] as f32
    }

    /// Convert one packed-plane YUV frame into the RGBA output buffer.
    pub fn convert_to_rgba(&self, yuv: &[u8], output: &mut [u8]) {
        let (y_plane, u_plane, v_plane) = self.split(yuv);
        for y in 0..self.height {
            for x in 0..self.width {
                let luma = y_plane[y * self.width + x] as f32;
                let cb = self.chroma_at(u_plane, x, y);
                let cr = self.chroma_at(v_plane, x, y);
                let (r, g, b) = ycbcr_to_rgb(luma, cb, cr);
                let index = (y * self.width + x) * 4;
                output[index] = r;
                output[index + 1] = g;
                output[index + 2] = b;
                output[index + 3] = 255;
            }
        }
    }
}

fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> (u8, u8, u8) {
    let cb = cb - 128.0;
    let cr = cr - 128.0;

    let r = (y + 1.402_f32 * cr).clamp(0.0, 255.0);
    let g = (y - 0.344136_f32 * cb - 0.714136_f32 * cr).clamp(0.0, 255.0);
    let b = (y + 1.772_f32 * cb).clamp(0.0, 255.0);

    (r as u8, g as u8, b as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsampled_layout_sizes_match_420() {
        let layout = ChromaLayout::new(8, 6, th_pixel_fmt_TH_PF_420).expect("4:2:0 supported");
        assert_eq!(layout.yuv_len(), Some(8 * 6 + 2 * 4 * 3));
        assert_eq!(layout.rgba_len(), Some(8 * 6 * 4));
    }

    #[test]
    fn unknown_pixel_formats_are_rejected() {
        assert!(ChromaLayout::new(8, 6, 99).is_none());
    }

    #[test]
    fn neutral_chroma_produces_grayscale() {
        let layout = ChromaLayout::new(2, 2, th_pixel_fmt_TH_PF_444).expect("4:4:4 supported");
        let mut yuv = Vec::new();
        yuv.extend_from_slice(&[0, 64, 128, 255]); // luma
        yuv.extend_from_slice(&[128; 4]); // cb
        yuv.extend_from_slice(&[128; 4]); // cr
        let mut rgba = vec![0u8; layout.rgba_len().unwrap()];
        layout.convert_to_rgba(&yuv, &mut rgba);

        for (pixel, luma) in rgba.chunks_exact(4).zip([0u8, 64, 128, 255]) {
            assert_eq!(pixel, [luma, luma, luma, 255]);
        }
    }

    #[test]
    fn pure_red_chroma_converts_to_red() {
        let layout = ChromaLayout::new(1, 1, th_pixel_fmt_TH_PF_444).expect("4:4:4 supported");
        // BT.601: Y=81, Cb=90, Cr=240 is saturated red.
        let yuv = [81u8, 90, 240];
        let mut rgba = vec![0u8; 4];
        layout.convert_to_rgba(&yuv, &mut rgba);
        assert!(rgba[0] > 220, "red channel was {}", rgba[0]);
        assert!(rgba[1] < 40, "green channel was {}", rgba[1]);
        assert!(rgba[2] < 60, "blue channel was {}", rgba[2]);
        assert_eq!(rgba[3], 255);
    }
}
