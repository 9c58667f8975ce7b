//! MP4 encoding by streaming raw frames into the system `ffmpeg`.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::{PicGeniusError, Result};
use crate::render::video::VideoClip;

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn mp4(out_path: impl Into<PathBuf>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            out_path: out_path.into(),
            overwrite: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PicGeniusError::encode("video width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(PicGeniusError::encode("video fps must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // yuv420p subsamples chroma by two on both axes.
            return Err(PicGeniusError::encode(format!(
                "video size {}x{} must be even for yuv420p mp4 output",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    background: Rgba<u8>,
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    /// Spawn ffmpeg; transparent pixels are flattened over `background`.
    pub fn new(cfg: EncodeConfig, background: Rgba<u8>) -> Result<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(PicGeniusError::encode(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(PicGeniusError::resource(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            PicGeniusError::resource(format!("failed to spawn ffmpeg: {}", e))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PicGeniusError::encode("failed to open ffmpeg stdin"))?;

        debug!(path = %cfg.out_path.display(), width = cfg.width, height = cfg.height, fps = cfg.fps, "ffmpeg started");
        Ok(Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg,
            background,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        if frame.dimensions() != (self.cfg.width, self.cfg.height) {
            return Err(PicGeniusError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        flatten_to_opaque(&mut self.scratch, frame.as_raw(), self.background);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PicGeniusError::encode("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            PicGeniusError::encode(format!("failed to write frame to ffmpeg stdin: {}", e))
        })
    }

    pub fn finish(mut self) -> Result<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            PicGeniusError::encode(format!("failed to wait for ffmpeg to finish: {}", e))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PicGeniusError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Encode every frame of `clip` into `out_path`.
pub fn write_video(clip: &VideoClip, out_path: &Path) -> Result<PathBuf> {
    let (width, height) = clip
        .frame_size()
        .ok_or_else(|| PicGeniusError::encode("cannot encode a video without frames"))?;
    let mut encoder = FfmpegEncoder::new(
        EncodeConfig::mp4(out_path, width, height, clip.fps),
        Rgba([0, 0, 0, 255]),
    )?;
    for frame in &clip.frames {
        encoder.encode_frame(frame)?;
    }
    encoder.finish()?;
    info!(path = %out_path.display(), frames = clip.frames.len(), "video written");
    Ok(out_path.to_path_buf())
}

/// Straight-alpha RGBA composited over an opaque background.
fn flatten_to_opaque(dst: &mut [u8], src: &[u8], background: Rgba<u8>) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let alpha = s[3] as u16;
        if alpha == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let value = mul_div255(s[channel] as u16, alpha)
                + mul_div255(background[channel] as u16, inverse);
            d[channel] = value.min(255) as u8;
        }
        d[3] = 255;
    }
}

fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(EncodeConfig::mp4("out.mp4", 0, 10, 24).validate().is_err());
        assert!(EncodeConfig::mp4("out.mp4", 11, 10, 24).validate().is_err());
        assert!(EncodeConfig::mp4("out.mp4", 10, 10, 0).validate().is_err());
        assert!(EncodeConfig::mp4("out.mp4", 1080, 1080, 24).validate().is_ok());
    }

    #[test]
    fn half_transparent_red_over_black() {
        let src = [255u8, 0, 0, 128];
        let mut dst = [0u8; 4];
        flatten_to_opaque(&mut dst, &src, Rgba([0, 0, 0, 255]));
        assert_eq!(dst, [128, 0, 0, 255]);
    }

    #[test]
    fn empty_clip_is_rejected_before_spawning() {
        let clip = VideoClip {
            frames: Vec::new(),
            fps: 24,
            movement: crate::types::Movement::ZoomIn,
        };
        let err = write_video(&clip, Path::new("/tmp/never.mp4")).unwrap_err();
        assert!(matches!(err, PicGeniusError::Encode(_)));
    }
}
