//! Stepping through a song one chord per key press.
//!
//! In hard mode each chord is bound to a lane and only the key for the
//! highlighted lane advances the song, and only while the bellows gesture is
//! live. A held key sustains its chord until released. In easy mode any key
//! plays the next chord.

use super::{Lane, LaneAssignment, Song, SongError, assign_lanes};
use crate::audio::Synth;
use crate::keymap::LaneKeys;
use crate::settings::PlayThroughSettings;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    /// Song loaded, nothing played yet.
    Armed,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotSounding,
    AlreadySustaining,
    Debounced,
    WrongLane {
        expected: Option<Lane>,
        pressed: Option<Lane>,
    },
    SongComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key-repeat of a key that is already down.
    Duplicate,
    /// The chord at `position` started sounding.
    Accepted { position: usize },
    Rejected(Rejection),
    /// No song is armed or running.
    Inactive,
}

pub struct PlayThrough {
    lane_keys: LaneKeys,
    debounce_ms: u64,
    preview_len: usize,
    hard_mode: bool,
    channel: u8,
    velocity: u8,

    state: PlayState,
    song: Song,
    lanes: LaneAssignment,
    position: usize,
    key_to_position: HashMap<char, usize>,
    /// Live keys holding each sounding pitch. A pitch is released only when
    /// its count drops to zero.
    voices: HashMap<u8, usize>,
    pressed: HashSet<char>,
    highlight: Option<Lane>,
    preview: Vec<Lane>,
    last_accepted_ms: Option<u64>,
}

impl PlayThrough {
    pub fn new(settings: &PlayThroughSettings, channel: u8, velocity: u8) -> Self {
        Self {
            lane_keys: LaneKeys::new(&settings.lane_keys),
            debounce_ms: settings.debounce_ms,
            preview_len: settings.preview_len,
            hard_mode: settings.hard_mode,
            channel,
            velocity,
            state: PlayState::Idle,
            song: Song::default(),
            lanes: LaneAssignment::default(),
            position: 0,
            key_to_position: HashMap::new(),
            voices: HashMap::new(),
            pressed: HashSet::new(),
            highlight: None,
            preview: Vec::new(),
            last_accepted_ms: None,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PlayState::Armed | PlayState::Running)
    }

    pub fn hard_mode(&self) -> bool {
        self.hard_mode
    }

    pub fn set_hard_mode(&mut self, hard_mode: bool) {
        self.hard_mode = hard_mode;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn song_len(&self) -> usize {
        self.song.len()
    }

    pub fn highlight(&self) -> Option<Lane> {
        self.highlight
    }

    pub fn preview(&self) -> &[Lane] {
        &self.preview
    }

    pub fn lane_keys(&self) -> &LaneKeys {
        &self.lane_keys
    }

    /// Keys currently sustaining a chord.
    pub fn live_keys(&self) -> impl Iterator<Item = char> + '_ {
        self.key_to_position.keys().copied()
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = char> + '_ {
        self.pressed.iter().copied()
    }

    /// Loads `song` and waits for the first key. An empty song is refused
    /// and leaves the current state untouched.
    pub fn arm(&mut self, song: Song, synth: &mut dyn Synth) -> Result<(), SongError> {
        if song.is_empty() {
            return Err(SongError::NoSong);
        }
        if self.is_active() {
            self.stop(synth);
        }

        self.lanes = assign_lanes(&song);
        self.song = song;
        self.position = 0;
        self.key_to_position.clear();
        self.voices.clear();
        self.pressed.clear();
        self.last_accepted_ms = None;
        self.highlight = self.lanes.lane(0);
        self.preview = self.lanes.window(1, self.preview_len);
        self.state = PlayState::Armed;

        tracing::info!(chords = self.song.len(), "play-through armed");
        Ok(())
    }

    /// Silences every sustained chord and returns to idle.
    pub fn stop(&mut self, synth: &mut dyn Synth) {
        let positions: Vec<usize> = self.key_to_position.drain().map(|(_, p)| p).collect();
        for position in positions {
            self.release_chord(position, synth);
        }
        self.voices.clear();
        self.pressed.clear();
        self.clear_presentation();
        self.position = 0;
        self.last_accepted_ms = None;
        if self.state != PlayState::Idle {
            tracing::info!("play-through stopped");
        }
        self.state = PlayState::Idle;
    }

    pub fn key_down(
        &mut self,
        key: char,
        now_ms: u64,
        sounding: bool,
        synth: &mut dyn Synth,
    ) -> KeyOutcome {
        if !self.is_active() {
            return KeyOutcome::Inactive;
        }
        if !self.pressed.insert(key) {
            return KeyOutcome::Duplicate;
        }
        if let Err(rejection) = self.check(key, now_ms, sounding) {
            tracing::debug!(%key, ?rejection, "key rejected");
            return KeyOutcome::Rejected(rejection);
        }

        let position = self.position;
        self.key_to_position.insert(key, position);
        self.start_chord(position, synth);

        self.position += 1;
        self.highlight = self.lanes.lane(self.position);
        self.preview = self.lanes.window(self.position + 1, self.preview_len);
        self.last_accepted_ms = Some(now_ms);
        self.state = PlayState::Running;

        tracing::debug!(%key, position, "chord started");
        KeyOutcome::Accepted { position }
    }

    /// Returns true when this release finished the song.
    pub fn key_up(&mut self, key: char, synth: &mut dyn Synth) -> bool {
        self.pressed.remove(&key);
        let Some(position) = self.key_to_position.remove(&key) else {
            return false;
        };
        self.release_chord(position, synth);

        if self.key_to_position.is_empty() && self.position >= self.song.len() {
            self.state = PlayState::Finished;
            self.clear_presentation();
            tracing::info!("play-through finished");
            return true;
        }
        false
    }

    fn check(&self, key: char, now_ms: u64, sounding: bool) -> Result<(), Rejection> {
        if self.position >= self.song.len() {
            return Err(Rejection::SongComplete);
        }
        if !self.hard_mode {
            return Ok(());
        }
        if !sounding {
            return Err(Rejection::NotSounding);
        }
        if self.key_to_position.contains_key(&key) {
            return Err(Rejection::AlreadySustaining);
        }
        if let Some(last) = self.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                return Err(Rejection::Debounced);
            }
        }
        let pressed = self.lane_keys.lane(key);
        if pressed.is_none() || pressed != self.highlight {
            return Err(Rejection::WrongLane {
                expected: self.highlight,
                pressed,
            });
        }
        Ok(())
    }

    fn start_chord(&mut self, position: usize, synth: &mut dyn Synth) {
        let Some(chord) = self.song.chord(position) else {
            return;
        };
        for note in &chord.notes {
            let held = self.voices.entry(note.pitch).or_insert(0);
            *held += 1;
            if *held == 1 {
                synth.note_on(self.channel, note.pitch, self.velocity);
            }
        }
    }

    fn release_chord(&mut self, position: usize, synth: &mut dyn Synth) {
        let Some(chord) = self.song.chord(position) else {
            return;
        };
        for note in &chord.notes {
            let Some(held) = self.voices.get_mut(&note.pitch) else {
                continue;
            };
            *held -= 1;
            if *held == 0 {
                self.voices.remove(&note.pitch);
                synth.note_off(self.channel, note.pitch);
            }
        }
    }

    fn clear_presentation(&mut self) {
        self.highlight = None;
        self.preview.clear();
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{Call, RecordingSynth};
    use crate::song::{Chord, Note};

    fn chord(pitches: &[u8]) -> Chord {
        Chord {
            notes: pitches
                .iter()
                .map(|&pitch| Note {
                    pitch,
                    duration: 0.5,
                })
                .collect(),
        }
    }

    // Lanes: 3, 0, 2
    fn song() -> Song {
        Song {
            chords: vec![chord(&[48, 60]), chord(&[62]), chord(&[65])],
        }
    }

    fn armed(hard_mode: bool) -> (PlayThrough, RecordingSynth) {
        let settings = PlayThroughSettings {
            hard_mode,
            ..PlayThroughSettings::default()
        };
        let mut synth = RecordingSynth::default();
        let mut pt = PlayThrough::new(&settings, 0, 127);
        pt.arm(song(), &mut synth).unwrap();
        (pt, synth)
    }

    #[test]
    fn arming_sets_highlight_and_preview() {
        let (pt, _) = armed(true);
        assert_eq!(pt.state(), PlayState::Armed);
        assert_eq!(pt.highlight(), Lane::new(3));
        assert_eq!(pt.preview(), &[Lane::new(0).unwrap(), Lane::new(2).unwrap()]);
    }

    #[test]
    fn empty_song_is_refused() {
        let (mut pt, mut synth) = armed(true);
        assert!(matches!(
            pt.arm(Song::default(), &mut synth),
            Err(SongError::NoSong)
        ));
        assert_eq!(pt.state(), PlayState::Armed);
        assert_eq!(pt.song_len(), 3);
    }

    #[test]
    fn correct_keys_walk_the_song() {
        let (mut pt, mut synth) = armed(true);

        assert_eq!(
            pt.key_down('k', 1000, true, &mut synth),
            KeyOutcome::Accepted { position: 0 }
        );
        assert_eq!(pt.state(), PlayState::Running);
        assert_eq!(synth.sounding_pitches(), vec![48, 60]);
        assert_eq!(pt.highlight(), Lane::new(0));
        assert_eq!(pt.preview(), &[Lane::new(2).unwrap()]);
        assert!(!pt.key_up('k', &mut synth));
        assert!(synth.sounding_pitches().is_empty());

        assert_eq!(
            pt.key_down('d', 1200, true, &mut synth),
            KeyOutcome::Accepted { position: 1 }
        );
        assert!(!pt.key_up('d', &mut synth));

        assert_eq!(
            pt.key_down('j', 1400, true, &mut synth),
            KeyOutcome::Accepted { position: 2 }
        );
        assert_eq!(pt.position(), 3);
        assert_eq!(pt.highlight(), None);
        assert!(pt.key_up('j', &mut synth));

        assert_eq!(pt.state(), PlayState::Finished);
        assert_eq!(pt.live_keys().count(), 0);
        assert!(synth.sounding_pitches().is_empty());
    }

    #[test]
    fn nothing_advances_without_gesture() {
        let (mut pt, mut synth) = armed(true);
        assert_eq!(
            pt.key_down('k', 1000, false, &mut synth),
            KeyOutcome::Rejected(Rejection::NotSounding)
        );
        pt.key_up('k', &mut synth);
        assert_eq!(pt.position(), 0);
        assert_eq!(synth.note_ons(), 0);
    }

    #[test]
    fn wrong_lane_is_ignored() {
        let (mut pt, mut synth) = armed(true);
        assert_eq!(
            pt.key_down('d', 1000, true, &mut synth),
            KeyOutcome::Rejected(Rejection::WrongLane {
                expected: Lane::new(3),
                pressed: Lane::new(0),
            })
        );
        assert!(matches!(
            pt.key_down('x', 1000, true, &mut synth),
            KeyOutcome::Rejected(Rejection::WrongLane { pressed: None, .. })
        ));
        assert_eq!(pt.position(), 0);
    }

    #[test]
    fn chatter_inside_debounce_window_is_dropped() {
        let settings = PlayThroughSettings::default();
        let mut synth = RecordingSynth::default();
        let mut pt = PlayThrough::new(&settings, 0, 127);
        pt.arm(
            Song {
                chords: vec![chord(&[60]), chord(&[60]), chord(&[60])],
            },
            &mut synth,
        )
        .unwrap();

        assert!(matches!(
            pt.key_down('k', 1000, true, &mut synth),
            KeyOutcome::Accepted { .. }
        ));
        pt.key_up('k', &mut synth);
        assert_eq!(
            pt.key_down('k', 1000 + settings.debounce_ms - 1, true, &mut synth),
            KeyOutcome::Rejected(Rejection::Debounced)
        );
        pt.key_up('k', &mut synth);
        assert_eq!(pt.position(), 1);

        assert!(matches!(
            pt.key_down('k', 1000 + settings.debounce_ms, true, &mut synth),
            KeyOutcome::Accepted { position: 1 }
        ));
    }

    #[test]
    fn key_repeat_is_suppressed() {
        let (mut pt, mut synth) = armed(true);
        pt.key_down('k', 1000, true, &mut synth);
        assert_eq!(
            pt.key_down('k', 1500, true, &mut synth),
            KeyOutcome::Duplicate
        );
        assert_eq!(synth.note_ons(), 2);
    }

    #[test]
    fn held_keys_keep_chords_sounding() {
        let (mut pt, mut synth) = armed(true);
        pt.key_down('k', 1000, true, &mut synth);
        pt.key_down('d', 1100, true, &mut synth);
        assert_eq!(synth.sounding_pitches(), vec![48, 60, 62]);
        assert_eq!(pt.live_keys().count(), 2);

        pt.key_up('k', &mut synth);
        assert_eq!(synth.sounding_pitches(), vec![62]);
    }

    #[test]
    fn shared_pitch_outlives_the_first_release() {
        let mut synth = RecordingSynth::default();
        let mut pt = PlayThrough::new(&PlayThroughSettings::default(), 0, 127);
        pt.set_hard_mode(false);
        pt.arm(
            Song {
                chords: vec![chord(&[48, 60]), chord(&[48, 64])],
            },
            &mut synth,
        )
        .unwrap();

        pt.key_down('a', 0, false, &mut synth);
        pt.key_down('b', 10, false, &mut synth);
        assert_eq!(synth.sounding_pitches(), vec![48, 60, 64]);

        assert!(!pt.key_up('a', &mut synth));
        assert_eq!(pt.live_keys().collect::<Vec<_>>(), vec!['b']);
        assert_eq!(synth.sounding_pitches(), vec![48, 64]);

        assert!(pt.key_up('b', &mut synth));
        assert!(synth.sounding_pitches().is_empty());
    }

    #[test]
    fn stop_releases_shared_pitches_once() {
        let mut synth = RecordingSynth::default();
        let mut pt = PlayThrough::new(&PlayThroughSettings::default(), 0, 127);
        pt.set_hard_mode(false);
        pt.arm(
            Song {
                chords: vec![chord(&[48, 60]), chord(&[48, 64]), chord(&[50])],
            },
            &mut synth,
        )
        .unwrap();

        pt.key_down('a', 0, false, &mut synth);
        pt.key_down('b', 10, false, &mut synth);
        pt.stop(&mut synth);

        assert!(synth.sounding_pitches().is_empty());
        let offs = synth
            .calls
            .iter()
            .filter(|c| **c == Call::NoteOff(48))
            .count();
        assert_eq!(offs, 1);

        pt.arm(
            Song {
                chords: vec![chord(&[48])],
            },
            &mut synth,
        )
        .unwrap();
        pt.key_down('a', 100, false, &mut synth);
        assert_eq!(synth.sounding_pitches(), vec![48]);
    }

    #[test]
    fn song_finishes_only_after_last_key_is_released() {
        let (mut pt, mut synth) = armed(false);
        pt.key_down('a', 0, false, &mut synth);
        pt.key_down('b', 0, false, &mut synth);
        pt.key_down('c', 0, false, &mut synth);
        assert_eq!(
            pt.key_down('e', 0, false, &mut synth),
            KeyOutcome::Rejected(Rejection::SongComplete)
        );

        assert!(!pt.key_up('a', &mut synth));
        assert!(!pt.key_up('e', &mut synth));
        assert!(!pt.key_up('c', &mut synth));
        assert!(pt.key_up('b', &mut synth));
        assert_eq!(pt.state(), PlayState::Finished);
        assert!(!pt.is_active());
    }

    #[test]
    fn easy_mode_skips_gating() {
        let (mut pt, mut synth) = armed(false);
        assert_eq!(
            pt.key_down('q', 0, false, &mut synth),
            KeyOutcome::Accepted { position: 0 }
        );
        assert_eq!(
            pt.key_down('w', 1, false, &mut synth),
            KeyOutcome::Accepted { position: 1 }
        );
    }

    #[test]
    fn stop_flushes_sustained_notes() {
        let (mut pt, mut synth) = armed(true);
        pt.key_down('k', 1000, true, &mut synth);
        pt.key_down('d', 1100, true, &mut synth);
        pt.stop(&mut synth);

        assert_eq!(pt.state(), PlayState::Idle);
        assert!(synth.sounding_pitches().is_empty());
        assert_eq!(pt.live_keys().count(), 0);
        assert_eq!(pt.highlight(), None);
        assert_eq!(
            pt.key_down('j', 1200, true, &mut synth),
            KeyOutcome::Inactive
        );
        assert!(synth.calls.contains(&Call::NoteOff(62)));
    }

    #[test]
    fn releasing_unknown_key_is_harmless() {
        let (mut pt, mut synth) = armed(true);
        assert!(!pt.key_up('z', &mut synth));
        assert_eq!(pt.state(), PlayState::Armed);
        assert!(synth.calls.is_empty());
    }
}
