use std::{io::Write as _, path::Path, process::Command};

use crate::{
    error::{SwingsyncError, SwingsyncResult},
    frame::{BYTES_PER_PIXEL, RasterFrame},
};

/// Stream metadata reported by ffprobe before any frame is decoded.
#[derive(Clone, Debug)]
pub struct ClipInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: u64,
}

/// One fully decoded clip. Exclusively owned by a single build
/// invocation and discarded after encoding.
#[derive(Clone, Debug)]
pub struct ClipSource {
    pub frames: Vec<RasterFrame>,
    pub fps: f64,
}

impl ClipSource {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

pub fn ffmpeg_tools_available() -> bool {
    let probe = |bin: &str| {
        Command::new(bin)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    };
    probe("ffmpeg") && probe("ffprobe")
}

/// Probe a container for video stream metadata.
///
/// A zero frame rate or zero frame count marks a corrupt or incomplete
/// upload (typically a missing moov atom) and is rejected here, before
/// any decode work.
pub fn probe(path: &Path) -> SwingsyncResult<ClipInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| SwingsyncError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SwingsyncError::decode(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_output(&out.stdout)
}

fn parse_probe_output(json: &[u8]) -> SwingsyncResult<ClipInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| SwingsyncError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| SwingsyncError::decode("no video stream found"))?;

    let width = video
        .width
        .ok_or_else(|| SwingsyncError::decode("missing video width"))?;
    let height = video
        .height
        .ok_or_else(|| SwingsyncError::decode("missing video height"))?;

    let (num, den) = parse_ff_ratio(video.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| SwingsyncError::decode("invalid video frame rate"))?;
    let fps = f64::from(num) / f64::from(den);
    if fps == 0.0 {
        return Err(SwingsyncError::decode("video reports zero frame rate"));
    }

    // nb_frames is absent from some containers; fall back to duration.
    let frame_count = match video.nb_frames.as_ref().and_then(|s| s.parse::<u64>().ok()) {
        Some(n) => n,
        None => {
            let duration = parsed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_ref())
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(0.0);
            (duration * fps).round() as u64
        }
    };
    if frame_count == 0 {
        return Err(SwingsyncError::decode("video reports zero frames"));
    }

    Ok(ClipInfo {
        width,
        height,
        fps,
        frame_count,
    })
}

/// Decode every frame of a clip in one sequential pass.
pub fn decode_all(path: &Path) -> SwingsyncResult<ClipSource> {
    let info = probe(path)?;

    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args(["-f", "rawvideo", "-pix_fmt", "bgr24", "pipe:1"])
        .output()
        .map_err(|e| SwingsyncError::decode(format!("failed to run ffmpeg for decode: {e}")))?;
    if !out.status.success() {
        return Err(SwingsyncError::decode(format!(
            "ffmpeg decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = info.width as usize * info.height as usize * BYTES_PER_PIXEL;
    if out.stdout.is_empty() || !out.stdout.len().is_multiple_of(frame_len) {
        return Err(SwingsyncError::decode(format!(
            "decoded stream has invalid size: {} bytes for {}x{} frames",
            out.stdout.len(),
            info.width,
            info.height
        )));
    }

    let mut frames = Vec::with_capacity(out.stdout.len() / frame_len);
    for chunk in out.stdout.chunks_exact(frame_len) {
        frames.push(RasterFrame::from_bgr(info.width, info.height, chunk.to_vec())?);
    }
    Ok(ClipSource {
        frames,
        fps: info.fps,
    })
}

/// Frame-accurate single-frame extraction, for thumbnails and trim
/// previews. The alignment engine never seeks; it decodes sequentially.
pub fn extract_frame(path: &Path, index: u64) -> SwingsyncResult<RasterFrame> {
    let info = probe(path)?;

    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vf",
            &format!("select=eq(n\\,{index})"),
            "-vframes",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "bgr24",
            "pipe:1",
        ])
        .output()
        .map_err(|e| SwingsyncError::decode(format!("failed to run ffmpeg for extract: {e}")))?;
    if !out.status.success() {
        return Err(SwingsyncError::decode(format!(
            "ffmpeg frame extract failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = info.width as usize * info.height as usize * BYTES_PER_PIXEL;
    if out.stdout.len() < frame_len {
        return Err(SwingsyncError::decode(format!(
            "frame {index} not found in '{}'",
            path.display()
        )));
    }
    RasterFrame::from_bgr(info.width, info.height, out.stdout[..frame_len].to_vec())
}

/// Decode an in-memory blob through a per-invocation temp file.
///
/// The temp file is removed on every exit path by its drop guard.
pub fn decode_blob(bytes: &[u8]) -> SwingsyncResult<ClipSource> {
    let tmp = write_blob_temp(bytes)?;
    decode_all(tmp.path())
}

pub fn extract_frame_from_blob(bytes: &[u8], index: u64) -> SwingsyncResult<RasterFrame> {
    let tmp = write_blob_temp(bytes)?;
    extract_frame(tmp.path(), index)
}

pub(crate) fn write_blob_temp(bytes: &[u8]) -> SwingsyncResult<tempfile::NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix("swingsync-clip-")
        .suffix(".mp4")
        .tempfile()
        .map_err(|e| SwingsyncError::decode(format!("failed to create temp clip file: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SwingsyncError::decode(format!("failed to write temp clip file: {e}")))?;
    tmp.flush()
        .map_err(|e| SwingsyncError::decode(format!("failed to flush temp clip file: {e}")))?;
    Ok(tmp)
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}
