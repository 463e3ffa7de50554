use super::{Note, Song};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LANE_COUNT: u8 = 4;

/// One of the four hard-mode input tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lane(u8);

impl Lane {
    /// The first chord of every song lands here.
    pub const START: Lane = Lane(LANE_COUNT - 1);

    pub fn new(index: u8) -> Option<Self> {
        (index < LANE_COUNT).then_some(Lane(index))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn shifted(self, shift: i32) -> Lane {
        Lane((self.0 as i32 + shift).rem_euclid(LANE_COUNT as i32) as u8)
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneAssignment {
    pub lanes: Vec<Lane>,
    /// Highest note of each chord, parallel to `lanes`.
    pub top_notes: Vec<Note>,
}

impl LaneAssignment {
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lane(&self, index: usize) -> Option<Lane> {
        self.lanes.get(index).copied()
    }

    /// Up to `count` lanes starting at `start`.
    pub fn window(&self, start: usize, count: usize) -> Vec<Lane> {
        self.lanes.iter().skip(start).take(count).copied().collect()
    }
}

/// Lane movement for a melodic step of `diff` semitones between
/// consecutive top notes.
///
/// | diff     | shift |
/// |----------|-------|
/// | 0        | 0     |
/// | 1, 2     | +1    |
/// | 3, 4     | +2    |
/// | >= 5     | +3    |
/// | -1, -2   | -1    |
/// | -3, -4   | -2    |
/// | <= -5    | -3    |
pub fn lane_shift(diff: i32) -> i32 {
    match diff {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        5.. => 3,
        -2..=-1 => -1,
        -4..=-3 => -2,
        _ => -3,
    }
}

pub fn assign_lanes(song: &Song) -> LaneAssignment {
    let mut assignment = LaneAssignment {
        lanes: Vec::with_capacity(song.len()),
        top_notes: Vec::with_capacity(song.len()),
    };

    let mut previous: Option<(Lane, Note)> = None;
    for chord in &song.chords {
        let (lane, top) = match (previous, chord.top_note()) {
            (None, top) => (
                Lane::START,
                top.unwrap_or(Note {
                    pitch: 0,
                    duration: 0.0,
                }),
            ),
            (Some((lane, prev_top)), Some(top)) => {
                let diff = top.pitch as i32 - prev_top.pitch as i32;
                (lane.shifted(lane_shift(diff)), top)
            }
            (Some(prev), None) => prev,
        };
        assignment.lanes.push(lane);
        assignment.top_notes.push(top);
        previous = Some((lane, top));
    }

    assignment
}
