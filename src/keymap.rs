use crate::song::{LANE_COUNT, Lane};
use std::collections::HashMap;

/// Keys bound to hard-mode lanes.
#[derive(Debug, Clone)]
pub struct LaneKeys {
    lanes: HashMap<char, Lane>,
    keys: Vec<char>,
}

impl LaneKeys {
    /// The n-th key drives lane n. Keys past the lane count are ignored.
    pub fn new(keys: &[char]) -> Self {
        let keys: Vec<char> = keys
            .iter()
            .take(LANE_COUNT as usize)
            .map(|k| k.to_ascii_lowercase())
            .collect();
        let lanes = keys
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| Lane::new(i as u8).map(|lane| (k, lane)))
            .collect();
        Self { lanes, keys }
    }

    pub fn lane(&self, key: char) -> Option<Lane> {
        self.lanes.get(&key.to_ascii_lowercase()).copied()
    }

    pub fn key_for(&self, lane: Lane) -> Option<char> {
        self.keys.get(lane.index()).copied()
    }
}

/// Fixed key to pitch table for free play, built once from a layout string.
///
/// A key's position in the layout is its semitone offset from the base note;
/// `.` marks a skipped semitone.
#[derive(Debug, Clone, Default)]
pub struct NoteMap {
    notes: HashMap<char, u8>,
}

impl NoteMap {
    pub fn from_layout(layout: &str, base_note: u8) -> Self {
        let mut notes = HashMap::new();
        for (offset, key) in layout.chars().enumerate() {
            if key == '.' {
                continue;
            }
            let pitch = base_note as usize + offset;
            if pitch > 127 {
                break;
            }
            notes.entry(key.to_ascii_lowercase()).or_insert(pitch as u8);
        }
        Self { notes }
    }

    pub fn note(&self, key: char) -> Option<u8> {
        self.notes.get(&key.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
