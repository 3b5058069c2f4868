//! Ogg Theora playback through the theorafile FFI. Decoding is strictly
//! forward; rewinds and backward seeks reopen the file, which is cheap for
//! the short background loops this viewer plays.

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::time::Duration;

use theorafile_rs::{
    OggTheora_File, tf_close, tf_eos, tf_fopen, tf_hasvideo, tf_readvideo, tf_videoinfo,
    th_pixel_fmt,
};

use super::yuv::ChromaLayout;
use super::{MediaError, StreamProgress, VideoSource};

const FALLBACK_FPS: f64 = 30.0;

pub struct OgvStream {
    path: PathBuf,
    file: OggTheora_File,
    width: u32,
    height: u32,
    frame_duration: Duration,
    layout: ChromaLayout,
    yuv_buffer: Vec<u8>,
    rgba_buffer: Vec<u8>,
    cursor: Option<u64>,
    end_of_stream: bool,
}

struct OpenedFile {
    file: OggTheora_File,
    width: u32,
    height: u32,
    fps: f64,
    pixel_format: th_pixel_fmt,
}

fn open_file(path: &Path) -> Result<OpenedFile, MediaError> {
    let c_path = CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| MediaError::PathEncoding {
            path: path.display().to_string(),
        })?;

    let mut file = MaybeUninit::<OggTheora_File>::zeroed();
    let open_rc = unsafe { tf_fopen(c_path.as_ptr(), file.as_mut_ptr()) };
    if open_rc != 0 {
        return Err(MediaError::Open {
            path: path.display().to_string(),
            code: open_rc,
        });
    }
    let mut file = unsafe { file.assume_init() };

    if unsafe { tf_hasvideo(&mut file) } == 0 {
        unsafe { tf_close(&mut file) };
        return Err(MediaError::NoVideo {
            path: path.display().to_string(),
        });
    }

    let mut width: i32 = 0;
    let mut height: i32 = 0;
    let mut fps: f64 = 0.0;
    let mut pixel_format: th_pixel_fmt = 0;
    unsafe {
        tf_videoinfo(
            &mut file,
            (&mut width) as *mut i32,
            (&mut height) as *mut i32,
            (&mut fps) as *mut f64,
            (&mut pixel_format) as *mut th_pixel_fmt,
        );
    }

    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        unsafe { tf_close(&mut file) };
        return Err(MediaError::Dimensions {
            path: path.display().to_string(),
        });
    };
    if width == 0 || height == 0 {
        unsafe { tf_close(&mut file) };
        return Err(MediaError::Dimensions {
            path: path.display().to_string(),
        });
    }

    Ok(OpenedFile {
        file,
        width,
        height,
        fps,
        pixel_format,
    })
}

impl OgvStream {
    pub fn open(path: &Path) -> Result<Self, MediaError> {
        let opened = open_file(path)?;
        let OpenedFile {
            mut file,
            width,
            height,
            fps,
            pixel_format,
        } = opened;

        let Some(layout) = ChromaLayout::new(width as usize, height as usize, pixel_format) else {
            unsafe { tf_close(&mut file) };
            return Err(MediaError::PixelFormat {
                path: path.display().to_string(),
                format: pixel_format,
            });
        };
        let (Some(yuv_len), Some(rgba_len)) = (layout.yuv_len(), layout.rgba_len()) else {
            unsafe { tf_close(&mut file) };
            return Err(MediaError::Dimensions {
                path: path.display().to_string(),
            });
        };

        let fps = if fps > 0.0 { fps } else { FALLBACK_FPS };
        Ok(Self {
            path: path.to_path_buf(),
            file,
            width,
            height,
            frame_duration: Duration::from_secs_f64(1.0 / fps),
            layout,
            yuv_buffer: vec![0u8; yuv_len],
            rgba_buffer: vec![0u8; rgba_len],
            cursor: None,
            end_of_stream: false,
        })
    }

    fn decode_next(&mut self) -> Result<StreamProgress, MediaError> {
        let rc = unsafe {
            tf_readvideo(
                &mut self.file,
                self.yuv_buffer.as_mut_ptr() as *mut c_char,
                1,
            )
        };
        match rc {
            1 => {
                self.layout
                    .convert_to_rgba(&self.yuv_buffer, &mut self.rgba_buffer);
                self.bump_cursor();
                Ok(StreamProgress::Advanced)
            }
            0 => {
                if unsafe { tf_eos(&mut self.file) } != 0 {
                    self.end_of_stream = true;
                    if self.cursor.is_none() {
                        return Err(MediaError::EmptyStream {
                            path: self.path.display().to_string(),
                        });
                    }
                    Ok(StreamProgress::EndOfStream)
                } else {
                    // The decoder held the previous frame; count it so paced
                    // playback keeps moving.
                    if self.cursor.is_none() {
                        return Err(MediaError::Decode {
                            path: self.path.display().to_string(),
                            status: rc,
                        });
                    }
                    self.bump_cursor();
                    Ok(StreamProgress::Advanced)
                }
            }
            other => Err(MediaError::Decode {
                path: self.path.display().to_string(),
                status: other,
            }),
        }
    }

    fn bump_cursor(&mut self) {
        self.cursor = Some(match self.cursor {
            Some(value) => value.saturating_add(1),
            None => 0,
        });
    }
}

impl VideoSource for OgvStream {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame_duration(&self) -> Duration {
        self.frame_duration
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
            match self.decode_next()? {
                StreamProgress::Advanced => continue,
                StreamProgress::EndOfStream => return Ok(StreamProgress::EndOfStream),
            }
        }
    }

    /// Restart from frame 0 by reopening the container; theorafile has no
    /// seek entry point.
    fn rewind(&mut self) -> Result<(), MediaError> {
        let reopened = open_file(&self.path)?;
        unsafe { tf_close(&mut self.file) };
        self.file = reopened.file;
        self.cursor = None;
        self.end_of_stream = false;
        Ok(())
    }

    fn pixels(&self) -> &[u8] {
        &self.rgba_buffer
    }
}

impl Drop for OgvStream {
    fn drop(&mut self) {
        unsafe {
            tf_close(&mut self.file);
        }
    }
}
