//! Decision-point alignment of a pitch clip and a swing clip.
//!
//! Both clips arrive letterboxed to the same half-canvas. The swing is
//! front-padded with copies of its first frame until both clips reach
//! the tagged decision moment in lock-step, then the pair is flattened
//! into one combined sequence with freeze-frame holds at three
//! landmarks: swing start (yellow), decision (green), contact.

use crate::{
    error::{SwingsyncError, SwingsyncResult},
    frame::{self, RasterFrame, TINT_GREEN, TINT_YELLOW},
};

/// Seconds each landmark frame is held.
pub const FREEZE_HOLD_SECS: f64 = 2.0;

/// Frame indices derived once per build; all indices are into the
/// padded swing sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignmentPlan {
    /// Copies of `swing[0]` prepended so the swing waits for the pitch.
    pub pad_count: usize,
    /// First real swing frame after padding (equals `pad_count`).
    pub real_swing_start: usize,
    /// User-tagged decision frame, shifted by the padding.
    pub decision_frame: usize,
    /// Last real swing frame after padding.
    pub contact_frame: usize,
}

impl AlignmentPlan {
    /// Derive the plan from clip lengths and the decision offset tagged
    /// against the unpadded swing clip.
    pub fn compute(
        pitch_len: usize,
        swing_len: usize,
        decision_offset: usize,
    ) -> SwingsyncResult<Self> {
        if pitch_len == 0 || swing_len == 0 {
            return Err(SwingsyncError::alignment(format!(
                "cannot align empty clips (pitch {pitch_len} frames, swing {swing_len} frames)"
            )));
        }
        if decision_offset >= swing_len {
            return Err(SwingsyncError::alignment(format!(
                "decision frame {decision_offset} is outside the swing clip ({swing_len} frames)"
            )));
        }

        let pad_count = pitch_len.saturating_sub(swing_len);
        Ok(Self {
            pad_count,
            real_swing_start: pad_count,
            decision_frame: pad_count + decision_offset,
            contact_frame: swing_len + pad_count - 1,
        })
    }

    /// Length of the padded swing sequence.
    pub fn padded_swing_len(&self, swing_len: usize) -> usize {
        swing_len + self.pad_count
    }

    /// Frames in one freeze hold at the given playback rate.
    pub fn freeze_len(fps: f64) -> usize {
        (fps * FREEZE_HOLD_SECS).round() as usize
    }

    /// Closed-form length of the composed sequence, title card excluded.
    pub fn composed_len(&self, pitch_len: usize, fps: f64) -> usize {
        let freeze = Self::freeze_len(fps);
        let play_start_to_decision = open_range_len(self.real_swing_start, self.decision_frame);
        let play_decision_to_contact = open_range_len(self.decision_frame, self.contact_frame);
        let tail = open_range_len(self.contact_frame, pitch_len);
        self.real_swing_start
            + 3 * freeze
            + play_start_to_decision
            + play_decision_to_contact
            + tail
    }
}

/// Compose the combined side-by-side sequence.
///
/// Frames must already be letterboxed to a common size. The output owns
/// every buffer outright; freeze holds and padding are real copies so a
/// later in-place tint can never reach back into an earlier frame.
pub fn compose(
    pitch: &[RasterFrame],
    swing: &[RasterFrame],
    decision_offset: usize,
    fps: f64,
) -> SwingsyncResult<Vec<RasterFrame>> {
    let plan = AlignmentPlan::compute(pitch.len(), swing.len(), decision_offset)?;
    compose_with_plan(&plan, pitch, swing, fps)
}

pub fn compose_with_plan(
    plan: &AlignmentPlan,
    pitch: &[RasterFrame],
    swing: &[RasterFrame],
    fps: f64,
) -> SwingsyncResult<Vec<RasterFrame>> {
    let padded: Vec<&RasterFrame> = std::iter::repeat_n(&swing[0], plan.pad_count)
        .chain(swing.iter())
        .collect();
    let freeze = AlignmentPlan::freeze_len(fps);

    // The pitch may be shorter than the padded swing; past its end the
    // pitch half holds on its last frame.
    let pitch_at = |i: usize| &pitch[i.min(pitch.len() - 1)];
    let combined = |i: usize| frame::hstack(pitch_at(i), padded[i]);

    let mut out = Vec::with_capacity(plan.composed_len(pitch.len(), fps));

    // Pre-swing: pitch plays, swing half frozen on its first frame
    // (those indices are the padding copies).
    for i in 0..plan.real_swing_start {
        out.push(combined(i)?);
    }

    // Swing start, held with a yellow highlight.
    let mut start_hold = combined(plan.real_swing_start)?;
    start_hold.tint(TINT_YELLOW);
    for _ in 0..freeze {
        out.push(start_hold.clone());
    }

    // Start to decision. Degenerate ranges (decision tagged at or
    // before the swing start) yield no frames.
    for i in open_range(plan.real_swing_start, plan.decision_frame) {
        out.push(combined(i)?);
    }

    // Decision, held with a green highlight.
    let mut decision_hold = combined(plan.decision_frame)?;
    decision_hold.tint(TINT_GREEN);
    for _ in 0..freeze {
        out.push(decision_hold.clone());
    }

    // Decision to contact.
    for i in open_range(plan.decision_frame, plan.contact_frame) {
        out.push(combined(i)?);
    }

    // Contact, held untinted.
    let contact_hold = combined(plan.contact_frame)?;
    for _ in 0..freeze {
        out.push(contact_hold.clone());
    }

    // Post-contact: the pitch may run on; swing half stays on contact.
    for i in open_range(plan.contact_frame, pitch.len()) {
        out.push(frame::hstack(pitch_at(i), padded[plan.contact_frame])?);
    }

    Ok(out)
}

// Open interval (lo, hi): lo+1 .. hi, empty when hi <= lo + 1.
fn open_range(lo: usize, hi: usize) -> std::ops::Range<usize> {
    (lo + 1)..hi.max(lo + 1)
}

fn open_range_len(lo: usize, hi: usize) -> usize {
    hi.saturating_sub(lo + 1)
}
