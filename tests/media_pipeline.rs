//! End-to-end pipeline tests against real ffmpeg/ffprobe binaries.
//! Every test degrades to a skip when the tools (or a usable font) are
//! missing, so the suite stays green on minimal machines.

use std::{path::Path, process::Command};

use swingsync::{
    AlignmentPlan, BuildOptions, ClipStore as _, MatchupRequest, MemoryStore, PitchClip,
    SwingClip, SwingsyncError, build_matchup, clip, source,
    title::{TITLE_HOLD_SECS, TextPainter},
};

fn ffmpeg_tools_available() -> bool {
    source::ffmpeg_tools_available()
}

fn synth_clip(path: &Path, secs: f64, fps: u32) -> anyhow::Result<()> {
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=size=64x64:rate={fps}"),
            "-t",
            &format!("{secs}"),
            "-pix_fmt",
            "yuv420p",
            "-c:v",
            "libx264",
        ])
        .arg(path)
        .status()?;
    anyhow::ensure!(status.success(), "ffmpeg failed creating synth clip");
    Ok(())
}

#[test]
fn probe_and_decode_agree_on_frame_count() -> anyhow::Result<()> {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.mp4");
    synth_clip(&path, 1.0, 30)?;

    let info = source::probe(&path)?;
    assert_eq!((info.width, info.height), (64, 64));
    assert_eq!(info.fps, 30.0);

    let decoded = source::decode_all(&path)?;
    assert_eq!(decoded.frames.len() as u64, info.frame_count);
    assert_eq!(decoded.fps, 30.0);
    Ok(())
}

#[test]
fn extract_frame_is_frame_accurate() -> anyhow::Result<()> {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.mp4");
    synth_clip(&path, 1.0, 30)?;

    let frame = source::extract_frame(&path, 10)?;
    assert_eq!((frame.width, frame.height), (64, 64));

    // Past the end of the clip there is nothing to extract.
    assert!(matches!(
        source::extract_frame(&path, 10_000),
        Err(SwingsyncError::Decode(_))
    ));
    Ok(())
}

#[test]
fn corrupt_uploads_are_rejected_not_silently_emptied() -> anyhow::Result<()> {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return Ok(());
    }
    // Zero-byte upload.
    assert!(matches!(
        source::decode_blob(&[]),
        Err(SwingsyncError::Decode(_))
    ));
    // Header-only garbage (a moov-less stub).
    assert!(matches!(
        source::decode_blob(b"\x00\x00\x00\x18ftypmp42 and then nothing"),
        Err(SwingsyncError::Decode(_))
    ));
    Ok(())
}

#[test]
fn trim_produces_exact_frame_range_all_intra() -> anyhow::Result<()> {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("raw.mp4");
    synth_clip(&path, 1.0, 30)?;
    let raw = std::fs::read(&path)?;

    let trimmed = clip::trim_clip(&raw, 2, 11)?;
    assert_eq!(trimmed.frame_count, 10);
    assert_eq!(trimmed.fps, 30.0);

    let reopened = source::decode_blob(&trimmed.bytes)?;
    assert_eq!(reopened.frames.len(), 10);

    // Trim start past the clip is an extraction failure.
    assert!(matches!(
        clip::trim_clip(&raw, 500, 600),
        Err(SwingsyncError::Decode(_))
    ));
    Ok(())
}

#[test]
fn full_build_stores_one_artifact_with_expected_length() -> anyhow::Result<()> {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return Ok(());
    }
    if TextPainter::from_system_font().is_err() {
        eprintln!("skipping: no usable system font");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let pitch_path = dir.path().join("pitch.mp4");
    let swing_path = dir.path().join("swing.mp4");
    synth_clip(&pitch_path, 1.0, 30)?;
    synth_clip(&swing_path, 0.5, 30)?;

    let store = MemoryStore::new();
    let pitch_id = store.insert_pitch(PitchClip {
        bytes: std::fs::read(&pitch_path)?,
        fps: 30.0,
    });
    let decision = 5usize;
    let swing_id = store.insert_swing(SwingClip {
        bytes: std::fs::read(&swing_path)?,
        fps: 30.0,
        decision_frame: decision,
    });

    let pitch_len = source::decode_blob(&store.get_pitch_clip(pitch_id)?.bytes)?
        .frames
        .len();
    let swing_len = source::decode_blob(&store.get_swing_clip(swing_id)?.bytes)?
        .frames
        .len();

    let request = MatchupRequest {
        pitch_id,
        swing_id,
        description: "backdoor slider".into(),
        pitcher_name: "Pitcher".into(),
        pitcher_team: "Home".into(),
        hitter_name: "Hitter".into(),
        hitter_team: "Away".into(),
    };
    let id = build_matchup(&store, &request, &BuildOptions::default())?;

    let artifact = store.get_matchup(id).expect("artifact stored");
    assert_eq!(store.matchup_count(), 1);
    assert_eq!(artifact.pitch_id, pitch_id);
    assert_eq!(artifact.swing_id, swing_id);
    assert!(!artifact.video.is_empty());

    // Thumbnail is a JPEG when extraction succeeds.
    if let Some(thumb) = &artifact.thumbnail {
        assert_eq!(&thumb[..2], &[0xFF, 0xD8]);
    }

    // The encoded artifact carries the title card plus the closed-form
    // composed length.
    let plan = AlignmentPlan::compute(pitch_len, swing_len, decision)?;
    let expected =
        (30.0 * TITLE_HOLD_SECS).round() as usize + plan.composed_len(pitch_len, 30.0);
    let out = source::decode_blob(&artifact.video)?;
    assert_eq!(out.frames.len(), expected);
    assert_eq!((out.frames[0].width, out.frames[0].height), (1280, 720));
    Ok(())
}

#[test]
fn build_fails_cleanly_on_missing_clip() {
    let store = MemoryStore::new();
    let request = MatchupRequest {
        pitch_id: 1,
        swing_id: 2,
        description: String::new(),
        pitcher_name: String::new(),
        pitcher_team: String::new(),
        hitter_name: String::new(),
        hitter_team: String::new(),
    };
    let err = build_matchup(&store, &request, &BuildOptions::default()).unwrap_err();
    assert!(matches!(err, SwingsyncError::Validation(_)));
    // Nothing was persisted on the failure path.
    assert_eq!(store.matchup_count(), 0);
}
