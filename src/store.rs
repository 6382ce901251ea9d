//! Persistence gateway boundary.
//!
//! The pipeline only needs blob reads keyed by clip id and a single
//! artifact insert per successful build; everything else about storage
//! lives outside this crate.

use std::{collections::HashMap, sync::Mutex};

use crate::error::{SwingsyncError, SwingsyncResult};

#[derive(Clone, Debug)]
pub struct PitchClip {
    pub bytes: Vec<u8>,
    pub fps: f64,
}

#[derive(Clone, Debug)]
pub struct SwingClip {
    pub bytes: Vec<u8>,
    pub fps: f64,
    /// Decision frame index relative to the trimmed clip's own start.
    pub decision_frame: usize,
}

#[derive(Clone, Debug)]
pub struct NewMatchup {
    pub pitch_id: i64,
    pub swing_id: i64,
    pub description: String,
    pub video: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
}

pub trait ClipStore {
    fn get_pitch_clip(&self, id: i64) -> SwingsyncResult<PitchClip>;
    fn get_swing_clip(&self, id: i64) -> SwingsyncResult<SwingClip>;
    /// Insert a finished artifact and return its id. Artifacts are
    /// immutable; there is deliberately no update operation.
    fn put_matchup(&self, matchup: NewMatchup) -> SwingsyncResult<i64>;
}

/// In-memory store for tests and file-backed CLI runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    next_id: i64,
    pitches: HashMap<i64, PitchClip>,
    swings: HashMap<i64, SwingClip>,
    matchups: HashMap<i64, NewMatchup>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pitch(&self, clip: PitchClip) -> i64 {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.pitches.insert(id, clip);
        id
    }

    pub fn insert_swing(&self, clip: SwingClip) -> i64 {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.swings.insert(id, clip);
        id
    }

    pub fn get_matchup(&self, id: i64) -> Option<NewMatchup> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .matchups
            .get(&id)
            .cloned()
    }

    pub fn matchup_count(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").matchups.len()
    }
}

impl ClipStore for MemoryStore {
    fn get_pitch_clip(&self, id: i64) -> SwingsyncResult<PitchClip> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .pitches
            .get(&id)
            .cloned()
            .ok_or_else(|| SwingsyncError::validation(format!("no pitch clip with id {id}")))
    }

    fn get_swing_clip(&self, id: i64) -> SwingsyncResult<SwingClip> {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .swings
            .get(&id)
            .cloned()
            .ok_or_else(|| SwingsyncError::validation(format!("no swing clip with id {id}")))
    }

    fn put_matchup(&self, matchup: NewMatchup) -> SwingsyncResult<i64> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.matchups.insert(id, matchup);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_clips_and_matchups() {
        let store = MemoryStore::new();
        let pid = store.insert_pitch(PitchClip {
            bytes: vec![1, 2, 3],
            fps: 30.0,
        });
        let sid = store.insert_swing(SwingClip {
            bytes: vec![4, 5],
            fps: 24.0,
            decision_frame: 7,
        });

        assert_eq!(store.get_pitch_clip(pid).unwrap().bytes, vec![1, 2, 3]);
        assert_eq!(store.get_swing_clip(sid).unwrap().decision_frame, 7);

        let mid = store
            .put_matchup(NewMatchup {
                pitch_id: pid,
                swing_id: sid,
                description: "heater".into(),
                video: vec![9],
                thumbnail: None,
            })
            .unwrap();
        let stored = store.get_matchup(mid).unwrap();
        assert_eq!(stored.description, "heater");
        assert_eq!(store.matchup_count(), 1);
    }

    #[test]
    fn missing_ids_are_validation_errors() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_pitch_clip(99),
            Err(SwingsyncError::Validation(_))
        ));
        assert!(matches!(
            store.get_swing_clip(99),
            Err(SwingsyncError::Validation(_))
        ));
    }
}
