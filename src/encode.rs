use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    error::{SwingsyncError, SwingsyncResult},
    frame::RasterFrame,
    source,
};

/// Keyframe policy for the two encode paths in the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodePolicy {
    /// All-intra H.264 for trimmed clips: every frame is a keyframe so
    /// later random access is exact. Larger files.
    FramePerfect,
    /// Normal keyframe interval for the final matchup, which is only
    /// ever watched sequentially.
    Matchup,
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub policy: EncodePolicy,
}

impl EncodeConfig {
    pub fn validate(&self) -> SwingsyncResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SwingsyncError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !(self.fps > 0.0) {
            return Err(SwingsyncError::validation("encode fps must be positive"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output needs even dimensions.
            return Err(SwingsyncError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

/// Full ffmpeg argument list for a config, output path last.
pub fn build_ffmpeg_args(cfg: &EncodeConfig, out_path: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "bgr24".into(),
        "-s".into(),
        format!("{}x{}", cfg.width, cfg.height),
        "-r".into(),
        format!("{}", cfg.fps),
        "-i".into(),
        "pipe:0".into(),
        "-an".into(),
        "-c:v".into(),
        "libx264".into(),
    ];
    match cfg.policy {
        EncodePolicy::FramePerfect => args.extend(
            [
                "-preset",
                "fast",
                "-crf",
                "17",
                "-g",
                "1",
                "-keyint_min",
                "1",
                "-sc_threshold",
                "0",
                "-x264opts",
                "no-scenecut",
            ]
            .map(String::from),
        ),
        EncodePolicy::Matchup => args.extend(
            ["-preset", "veryfast", "-x264opts", "no-dct-decimate=1"].map(String::from),
        ),
    }
    args.extend(["-pix_fmt", "yuv420p", "-movflags", "+faststart"].map(String::from));
    args.push(out_path.display().to_string());
    args
}

/// Streams raw BGR frames into an external ffmpeg process.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    out_path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, out_path: impl Into<PathBuf>) -> SwingsyncResult<Self> {
        cfg.validate()?;
        let out_path = out_path.into();

        let mut child = Command::new("ffmpeg")
            .args(build_ffmpeg_args(&cfg, &out_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SwingsyncError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SwingsyncError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            out_path,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn write_frame(&mut self, frame: &RasterFrame) -> SwingsyncResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(SwingsyncError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SwingsyncError::encode("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&frame.data).map_err(|e| {
            SwingsyncError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    /// Close stdin, wait for ffmpeg, and verify an output file exists.
    pub fn finish(mut self) -> SwingsyncResult<()> {
        drop(self.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .map_err(|e| SwingsyncError::encode(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SwingsyncError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if !self.out_path.exists() {
            return Err(SwingsyncError::encode(format!(
                "ffmpeg produced no output file at '{}'",
                self.out_path.display()
            )));
        }
        Ok(())
    }
}

/// Encode a frame sequence into an in-memory MP4.
///
/// Goes through a per-invocation unique temp file that is removed on
/// every exit path.
pub fn encode_to_bytes(frames: &[RasterFrame], cfg: &EncodeConfig) -> SwingsyncResult<Vec<u8>> {
    if frames.is_empty() {
        return Err(SwingsyncError::encode("no frames to encode"));
    }

    let tmp = tempfile::Builder::new()
        .prefix("swingsync-out-")
        .suffix(".mp4")
        .tempfile()
        .map_err(|e| SwingsyncError::encode(format!("failed to create temp output file: {e}")))?
        .into_temp_path();

    let mut enc = FfmpegEncoder::new(cfg.clone(), &*tmp)?;
    for frame in frames {
        enc.write_frame(frame)?;
    }
    enc.finish()?;

    std::fs::read(&tmp)
        .map_err(|e| SwingsyncError::encode(format!("failed to read encoded output: {e}")))
}

/// Extract the frame at the title-card boundary (`round(fps * 5)`) as a
/// JPEG thumbnail. Any failure here is non-fatal: the matchup is stored
/// without a thumbnail.
pub fn thumbnail(video_bytes: &[u8], fps: f64) -> Option<Vec<u8>> {
    let index = (fps * crate::title::TITLE_HOLD_SECS).round() as u64;
    match source::extract_frame_from_blob(video_bytes, index) {
        Ok(frame) => match jpeg_from_bgr(&frame) {
            Ok(jpeg) => Some(jpeg),
            Err(e) => {
                tracing::warn!("thumbnail jpeg encode failed: {e}");
                None
            }
        },
        Err(e) => {
            tracing::warn!("thumbnail frame extraction failed: {e}");
            None
        }
    }
}

fn jpeg_from_bgr(frame: &RasterFrame) -> SwingsyncResult<Vec<u8>> {
    let mut rgb = frame.data.clone();
    for px in rgb.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90)
        .encode(&rgb, frame.width, frame.height, image::ExtendedColorType::Rgb8)
        .map_err(|e| SwingsyncError::encode(format!("jpeg encode failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(policy: EncodePolicy) -> EncodeConfig {
        EncodeConfig {
            width: 1280,
            height: 720,
            fps: 30.0,
            policy,
        }
    }

    #[test]
    fn config_validation_catches_bad_values() {
        let mut c = cfg(EncodePolicy::Matchup);
        c.width = 0;
        assert!(c.validate().is_err());

        let mut c = cfg(EncodePolicy::Matchup);
        c.height = 11;
        assert!(c.validate().is_err());

        let mut c = cfg(EncodePolicy::Matchup);
        c.fps = 0.0;
        assert!(c.validate().is_err());

        assert!(cfg(EncodePolicy::FramePerfect).validate().is_ok());
    }

    #[test]
    fn frame_perfect_args_force_all_intra() {
        let args = build_ffmpeg_args(&cfg(EncodePolicy::FramePerfect), Path::new("out.mp4"));
        let has = |flag: &str| args.iter().any(|a| a == flag);
        assert!(has("-g"));
        assert!(has("no-scenecut"));
        assert!(has("-crf"));
        let g_pos = args.iter().position(|a| a == "-g").unwrap();
        assert_eq!(args[g_pos + 1], "1");
    }

    #[test]
    fn matchup_args_use_normal_keyframes() {
        let args = build_ffmpeg_args(&cfg(EncodePolicy::Matchup), Path::new("out.mp4"));
        assert!(!args.iter().any(|a| a == "-g"));
        assert!(args.iter().any(|a| a == "no-dct-decimate=1"));
    }

    #[test]
    fn both_policies_share_container_settings() {
        for policy in [EncodePolicy::FramePerfect, EncodePolicy::Matchup] {
            let args = build_ffmpeg_args(&cfg(policy), Path::new("out.mp4"));
            assert!(args.iter().any(|a| a == "yuv420p"));
            assert!(args.iter().any(|a| a == "+faststart"));
            assert!(args.iter().any(|a| a == "bgr24"));
            assert_eq!(args.last().unwrap(), "out.mp4");
        }
    }

    #[test]
    fn jpeg_from_bgr_produces_jpeg_magic() {
        let frame = RasterFrame::black(8, 8);
        let jpeg = jpeg_from_bgr(&frame).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
