//! Matchup build orchestration: decode, letterbox, align, title card,
//! encode, persist. One sequential run per build; a build either runs
//! to completion or fails before anything is written to the store.

use crate::{
    align,
    encode::{self, EncodeConfig, EncodePolicy},
    error::SwingsyncResult,
    frame::RasterFrame,
    letterbox::{self, HALF_HEIGHT, HALF_WIDTH},
    source::{self, ClipSource},
    store::{ClipStore, NewMatchup},
    title::{TextPainter, TitleCard},
};

/// Who is on the card; clip ids resolve the rest.
#[derive(Clone, Debug)]
pub struct MatchupRequest {
    pub pitch_id: i64,
    pub swing_id: i64,
    pub description: String,
    pub pitcher_name: String,
    pub pitcher_team: String,
    pub hitter_name: String,
    pub hitter_team: String,
}

#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub half_width: u32,
    pub half_height: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            half_width: HALF_WIDTH,
            half_height: HALF_HEIGHT,
        }
    }
}

/// A finished matchup before persistence.
#[derive(Clone, Debug)]
pub struct MatchupVideo {
    pub video: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
    pub fps: f64,
}

/// Fetch both clips, compose, encode, and make the single store insert.
/// Returns the new artifact id.
pub fn build_matchup(
    store: &dyn ClipStore,
    request: &MatchupRequest,
    opts: &BuildOptions,
) -> SwingsyncResult<i64> {
    let pitch_clip = store.get_pitch_clip(request.pitch_id)?;
    let swing_clip = store.get_swing_clip(request.swing_id)?;

    tracing::info!(
        pitch_id = request.pitch_id,
        swing_id = request.swing_id,
        "building matchup"
    );

    let pitch = source::decode_blob(&pitch_clip.bytes)?;
    let swing = source::decode_blob(&swing_clip.bytes)?;

    let card = card_for(request, &swing);
    let rendered = render_matchup(&pitch, &swing, swing_clip.decision_frame, &card, opts)?;

    let id = store.put_matchup(NewMatchup {
        pitch_id: request.pitch_id,
        swing_id: request.swing_id,
        description: request.description.clone(),
        video: rendered.video,
        thumbnail: rendered.thumbnail,
    })?;
    tracing::info!(matchup_id = id, "matchup stored");
    Ok(id)
}

/// The composition pipeline proper, over already-decoded clips.
pub fn render_matchup(
    pitch: &ClipSource,
    swing: &ClipSource,
    decision_offset: usize,
    card: &TitleCard,
    opts: &BuildOptions,
) -> SwingsyncResult<MatchupVideo> {
    // The slower clip governs playback speed so no frame is dropped.
    let fps = pitch.fps.min(swing.fps);

    let pitch_boxed = letterbox_all(&pitch.frames, opts)?;
    let swing_boxed = letterbox_all(&swing.frames, opts)?;

    let composed = align::compose(&pitch_boxed, &swing_boxed, decision_offset, fps)?;

    let canvas_width = opts.half_width * 2;
    let painter = TextPainter::from_system_font()?;
    let mut frames = card.frames(&painter, canvas_width, opts.half_height, fps)?;
    frames.extend(composed);

    tracing::info!(
        frames = frames.len(),
        fps,
        "composed sequence ready, encoding"
    );

    let video = encode::encode_to_bytes(
        &frames,
        &EncodeConfig {
            width: canvas_width,
            height: opts.half_height,
            fps,
            policy: EncodePolicy::Matchup,
        },
    )?;
    let thumbnail = encode::thumbnail(&video, fps);

    Ok(MatchupVideo {
        video,
        thumbnail,
        fps,
    })
}

/// Build the title card for a request. The swing duration is computed
/// against the unpadded clip at its native rate.
pub fn card_for(request: &MatchupRequest, swing: &ClipSource) -> TitleCard {
    TitleCard {
        pitcher_name: request.pitcher_name.clone(),
        pitcher_team: request.pitcher_team.clone(),
        hitter_name: request.hitter_name.clone(),
        hitter_team: request.hitter_team.clone(),
        description: request.description.clone(),
        swing_duration_sec: swing_duration_sec(swing.frame_count(), swing.fps),
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
    }
}

pub fn swing_duration_sec(frame_count: usize, fps: f64) -> f64 {
    frame_count as f64 / fps
}

fn letterbox_all(frames: &[RasterFrame], opts: &BuildOptions) -> SwingsyncResult<Vec<RasterFrame>> {
    frames
        .iter()
        .map(|f| letterbox::letterbox(Some(f), opts.half_width, opts.half_height))
        .collect()
}
