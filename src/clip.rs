//! Trim/finalize support for the upload flow: cut a raw upload down to
//! an exact frame range and re-encode it frame-perfect so later seeks
//! land on exact frames.

use crate::{
    encode::{self, EncodeConfig, EncodePolicy},
    error::{SwingsyncError, SwingsyncResult},
    source,
};

/// A trimmed clip ready for storage.
#[derive(Clone, Debug)]
pub struct TrimmedClip {
    pub bytes: Vec<u8>,
    pub fps: f64,
    pub frame_count: usize,
}

/// Cut `[start_frame, end_frame]` (inclusive) out of a raw upload and
/// re-encode it all-intra at the source rate.
pub fn trim_clip(raw: &[u8], start_frame: usize, end_frame: usize) -> SwingsyncResult<TrimmedClip> {
    if end_frame < start_frame {
        return Err(SwingsyncError::validation(format!(
            "trim range end {end_frame} precedes start {start_frame}"
        )));
    }

    let src = source::decode_blob(raw)?;
    if start_frame >= src.frames.len() {
        return Err(SwingsyncError::decode(format!(
            "no frames extracted: trim start {start_frame} is past the clip ({} frames)",
            src.frames.len()
        )));
    }
    let end = end_frame.min(src.frames.len() - 1);
    let frames = &src.frames[start_frame..=end];

    let first = &frames[0];
    let bytes = encode::encode_to_bytes(
        frames,
        &EncodeConfig {
            width: first.width,
            height: first.height,
            fps: src.fps,
            policy: EncodePolicy::FramePerfect,
        },
    )?;

    Ok(TrimmedClip {
        bytes,
        fps: src.fps,
        frame_count: frames.len(),
    })
}

/// Re-base a decision frame tagged against the raw upload onto the
/// trimmed clip's own start. A tag before the trim start clamps to 0.
pub fn rebase_decision_frame(decision_frame: usize, start_frame: usize) -> usize {
    decision_frame.saturating_sub(start_frame)
}
